//! Instance addresses and the SQL login used against them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Address of one database server instance.
///
/// Opaque to the engine: it is handed to the connection factory as-is
/// and used to label outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Instance(String);

impl Instance {
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Instance {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Parse a comma-separated endpoint list.
///
/// Entries are trimmed and empty entries dropped. Order is preserved but
/// carries no meaning for the run.
pub fn parse_instance_list(raw: &str) -> Result<Vec<Instance>, CoreError> {
    let instances: Vec<Instance> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Instance::new)
        .collect();

    if instances.is_empty() {
        return Err(CoreError::Validation(
            "at least one instance endpoint is required".to_string(),
        ));
    }

    Ok(instances)
}

/// SQL login shared by every connection in a run.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

// Keep the password out of logs.
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
