use sqlsweep_core::ErrorKind;

/// Error raised by a connection, transaction, or driver call.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// The TCP connection or login to an instance failed.
    #[error("Failed to connect to {target}: {reason}")]
    Connect { target: String, reason: String },

    /// The server or the TDS protocol layer reported an error.
    #[error("TDS error: {0}")]
    Tds(#[from] tiberius::error::Error),

    /// Socket-level failure outside the protocol layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection was already closed.
    #[error("Connection is closed")]
    Closed,

    /// Any other driver failure, carried as text.
    #[error("{0}")]
    Driver(String),
}

/// Failure of one script, tagged with the step that failed.
///
/// A commit failure is kept distinct from an execution failure: both fail
/// the script, but they point at different places when diagnosing.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    /// `BEGIN TRANSACTION` failed; the script text was never sent.
    #[error("Failed to begin transaction: {0}")]
    TransactionBegin(#[source] DbError),

    /// The script failed inside its transaction.
    #[error("Script execution failed: {0}")]
    Execution(#[source] DbError),

    /// The script ran but the commit failed.
    #[error("Commit failed: {0}")]
    Commit(#[source] DbError),
}

impl ScriptError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TransactionBegin(_) => ErrorKind::TransactionBegin,
            Self::Execution(_) => ErrorKind::ScriptExecution,
            Self::Commit(_) => ErrorKind::Commit,
        }
    }
}
