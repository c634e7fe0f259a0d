//! Per-unit execution outcomes.
//!
//! Every unit of work (an instance discovery, or one script against one
//! database) ends as exactly one [`ExecutionOutcome`]. Failures are data:
//! they travel up through every join point as values and are never
//! re-raised.

use std::fmt;

use serde::Serialize;

use crate::instance::Instance;

// ---------------------------------------------------------------------------
// ErrorKind
// ---------------------------------------------------------------------------

/// Where a unit failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Opening or closing a connection failed.
    Connection,
    /// Listing the databases on an instance failed.
    Discovery,
    /// `BEGIN TRANSACTION` failed; the script was never sent.
    TransactionBegin,
    /// The script itself failed inside its transaction.
    ScriptExecution,
    /// The script ran but its transaction failed to commit.
    Commit,
    /// Publishing the report failed.
    NotificationDispatch,
    /// A spawned unit panicked or was aborted before producing a result.
    TaskAborted,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connection => "ConnectionError",
            Self::Discovery => "DiscoveryError",
            Self::TransactionBegin => "TransactionBeginError",
            Self::ScriptExecution => "ScriptExecutionError",
            Self::Commit => "CommitError",
            Self::NotificationDispatch => "NotificationDispatchError",
            Self::TaskAborted => "TaskAborted",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// ExecutionOutcome
// ---------------------------------------------------------------------------

/// Terminal state of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded { rows_affected: u64 },
    Failed { kind: ErrorKind, message: String },
}

/// Identity and result of one unit of work.
///
/// `database` is `None` for instance-level outcomes (connection or
/// discovery failures); `script` is `None` for anything above the script
/// level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExecutionOutcome {
    pub instance: Instance,
    pub database: Option<String>,
    pub script: Option<String>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl ExecutionOutcome {
    /// A script that committed.
    pub fn succeeded(
        instance: Instance,
        database: impl Into<String>,
        script: impl Into<String>,
        rows_affected: u64,
    ) -> Self {
        Self {
            instance,
            database: Some(database.into()),
            script: Some(script.into()),
            status: OutcomeStatus::Succeeded { rows_affected },
        }
    }

    /// A failure scoped to a whole instance.
    pub fn instance_failed(instance: Instance, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            instance,
            database: None,
            script: None,
            status: OutcomeStatus::Failed {
                kind,
                message: message.into(),
            },
        }
    }

    /// A failure scoped to one database (its connection could not be used).
    pub fn database_failed(
        instance: Instance,
        database: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            database: Some(database.into()),
            ..Self::instance_failed(instance, kind, message)
        }
    }

    /// A failure scoped to one script against one database.
    pub fn script_failed(
        instance: Instance,
        database: impl Into<String>,
        script: impl Into<String>,
        kind: ErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self {
            script: Some(script.into()),
            ..Self::database_failed(instance, database, kind, message)
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.status {
            OutcomeStatus::Failed { kind, .. } => Some(*kind),
            OutcomeStatus::Succeeded { .. } => None,
        }
    }

    /// One-line description used in failure reports.
    pub fn summary_line(&self) -> String {
        let database = self.database.as_deref().unwrap_or("-");
        let script = self.script.as_deref().unwrap_or("-");
        match &self.status {
            OutcomeStatus::Failed { kind, message } => format!(
                "[{kind}] instance={} database={database} script={script} : {message}",
                self.instance
            ),
            OutcomeStatus::Succeeded { rows_affected } => format!(
                "[ok] instance={} database={database} script={script} : {rows_affected} rows affected",
                self.instance
            ),
        }
    }
}
