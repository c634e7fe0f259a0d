//! The static catalog of maintenance SQL scripts.
//!
//! A [`QueryCatalog`] is loaded once at process start and shared read-only
//! by every run. One entry is the *discovery script*, used only to list the
//! databases on an instance and never executed as maintenance work.

use std::collections::BTreeMap;
use std::path::Path;

use crate::error::CoreError;

/// Default name of the discovery entry.
pub const DEFAULT_DISCOVERY_SCRIPT: &str = "database";

/// File extension of catalog entries on disk.
const SCRIPT_EXTENSION: &str = "sql";

/// One named SQL script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDefinition {
    pub name: String,
    pub sql: String,
}

/// Immutable mapping of script name to SQL text.
#[derive(Debug, Clone)]
pub struct QueryCatalog {
    scripts: BTreeMap<String, String>,
    discovery: String,
}

impl QueryCatalog {
    /// Build a catalog from in-memory `(name, sql)` pairs.
    ///
    /// Fails if `discovery` is not among the entries, or if it is the only
    /// entry.
    pub fn from_entries<I, N, S>(discovery: impl Into<String>, entries: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (N, S)>,
        N: Into<String>,
        S: Into<String>,
    {
        let scripts: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(name, sql)| (name.into(), sql.into()))
            .collect();
        let discovery = discovery.into();

        if !scripts.contains_key(&discovery) {
            return Err(CoreError::Validation(format!(
                "catalog has no discovery script named '{discovery}'"
            )));
        }

        if scripts.len() < 2 {
            return Err(CoreError::Validation(
                "catalog has no maintenance scripts besides discovery".to_string(),
            ));
        }

        Ok(Self { scripts, discovery })
    }

    /// Load every `*.sql` file in `dir`; the file stem becomes the script name.
    pub fn load_dir(dir: &Path, discovery: &str) -> Result<Self, CoreError> {
        let io_err = |source| CoreError::Io {
            path: dir.display().to_string(),
            source,
        };

        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(io_err)? {
            let path = entry.map_err(io_err)?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let sql = std::fs::read_to_string(&path).map_err(|source| CoreError::Io {
                path: path.display().to_string(),
                source,
            })?;
            entries.push((name.to_string(), sql));
        }

        Self::from_entries(discovery, entries)
    }

    /// Name of the discovery entry.
    pub fn discovery_name(&self) -> &str {
        &self.discovery
    }

    /// SQL text of the discovery entry.
    pub fn discovery_sql(&self) -> &str {
        // Presence is checked in `from_entries`.
        self.scripts
            .get(&self.discovery)
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Every entry except the discovery script, in name order.
    pub fn maintenance_scripts(&self) -> impl Iterator<Item = ScriptDefinition> + '_ {
        self.scripts
            .iter()
            .filter(|(name, _)| **name != self.discovery)
            .map(|(name, sql)| ScriptDefinition {
                name: name.clone(),
                sql: sql.clone(),
            })
    }

    /// Number of maintenance scripts (discovery excluded).
    pub fn maintenance_count(&self) -> usize {
        self.scripts.len() - 1
    }
}
