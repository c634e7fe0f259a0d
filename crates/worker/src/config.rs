use std::path::PathBuf;
use std::time::Duration;

use sqlsweep_core::catalog::DEFAULT_DISCOVERY_SCRIPT;
use sqlsweep_core::instance::parse_instance_list;
use sqlsweep_core::{CoreError, Credentials, Instance};
use sqlsweep_db::DEFAULT_PORT;
use sqlsweep_events::DEFAULT_SUBJECT;

/// Default catalog directory, relative to the working directory.
const DEFAULT_QUERY_DIR: &str = "queries";

/// Where run reports are delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierConfig {
    Sns { topic_arn: String },
    Slack { webhook_url: String },
    Log,
}

/// Worker configuration loaded from environment variables.
///
/// | Variable                 | Required  | Default                  |
/// |--------------------------|-----------|--------------------------|
/// | `DB_ENDPOINTS`           | yes       | --                       |
/// | `DB_USERNAME`            | yes       | --                       |
/// | `DB_PASSWORD`            | yes       | --                       |
/// | `DB_PORT`                | no        | `1433`                   |
/// | `QUERY_DIR`              | no        | `queries`                |
/// | `DISCOVERY_SCRIPT`       | no        | `database`               |
/// | `NOTIFIER`               | no        | `sns`                    |
/// | `NOTIFICATION_TOPIC_ARN` | for `sns` | --                       |
/// | `SLACK_WEBHOOK_URL`      | for `slack` | --                     |
/// | `NOTIFICATION_SUBJECT`   | no        | `Message from sqlsweep`  |
/// | `SWEEP_INTERVAL_SECS`    | no        | unset: run once and exit |
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub instances: Vec<Instance>,
    pub credentials: Credentials,
    pub port: u16,
    pub query_dir: PathBuf,
    pub discovery_script: String,
    pub notifier: NotifierConfig,
    pub subject: String,
    /// `None` runs once; `Some` repeats on this interval.
    pub interval: Option<Duration>,
}

impl WorkerConfig {
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |var: &'static str| {
            lookup(var)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| CoreError::Config {
                    var,
                    reason: "must be set".to_string(),
                })
        };

        let instances = parse_instance_list(&required("DB_ENDPOINTS")?).map_err(|e| {
            CoreError::Config {
                var: "DB_ENDPOINTS",
                reason: e.to_string(),
            }
        })?;

        let credentials = Credentials::new(required("DB_USERNAME")?, required("DB_PASSWORD")?);

        let port = match lookup("DB_PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|e| CoreError::Config {
                var: "DB_PORT",
                reason: e.to_string(),
            })?,
            None => DEFAULT_PORT,
        };

        let query_dir = PathBuf::from(lookup("QUERY_DIR").unwrap_or_else(|| DEFAULT_QUERY_DIR.into()));

        let discovery_script =
            lookup("DISCOVERY_SCRIPT").unwrap_or_else(|| DEFAULT_DISCOVERY_SCRIPT.into());

        let notifier = match lookup("NOTIFIER").as_deref().map(str::trim).unwrap_or("sns") {
            "sns" => NotifierConfig::Sns {
                topic_arn: required("NOTIFICATION_TOPIC_ARN")?,
            },
            "slack" => NotifierConfig::Slack {
                webhook_url: required("SLACK_WEBHOOK_URL")?,
            },
            "log" => NotifierConfig::Log,
            other => {
                return Err(CoreError::Config {
                    var: "NOTIFIER",
                    reason: format!("unknown notifier '{other}' (expected sns, slack or log)"),
                })
            }
        };

        let subject = lookup("NOTIFICATION_SUBJECT").unwrap_or_else(|| DEFAULT_SUBJECT.into());

        let interval = match lookup("SWEEP_INTERVAL_SECS") {
            Some(raw) => {
                let secs = raw.trim().parse::<u64>().map_err(|e| CoreError::Config {
                    var: "SWEEP_INTERVAL_SECS",
                    reason: e.to_string(),
                })?;
                if secs == 0 {
                    return Err(CoreError::Config {
                        var: "SWEEP_INTERVAL_SECS",
                        reason: "must be greater than zero".to_string(),
                    });
                }
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            instances,
            credentials,
            port,
            query_dir,
            discovery_script,
            notifier,
            subject,
            interval,
        })
    }
}
