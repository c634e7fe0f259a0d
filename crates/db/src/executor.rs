//! Runs one maintenance script inside its own transaction.
//!
//! The protocol is `begin -> execute -> commit`. Each step that fails ends
//! the script with the matching [`ScriptError`] variant:
//!
//! - begin fails: the script is never sent and nothing is rolled back.
//! - execute fails: the transaction is dropped without a rollback; the
//!   next begin on the session, or its close, releases it.
//! - commit fails: reported as [`ScriptError::Commit`], distinct from an
//!   execution failure.

use crate::connection::{Connection, IsolationLevel};
use crate::error::ScriptError;

/// Isolation level every maintenance script runs at.
pub const SCRIPT_ISOLATION: IsolationLevel = IsolationLevel::ReadCommitted;

pub struct QueryExecutor;

impl QueryExecutor {
    /// Execute `sql` against `connection` in a fresh transaction and return
    /// the number of rows affected.
    pub async fn run(
        connection: &dyn Connection,
        script_name: &str,
        sql: &str,
    ) -> Result<u64, ScriptError> {
        let mut transaction = connection
            .begin(SCRIPT_ISOLATION)
            .await
            .map_err(ScriptError::TransactionBegin)?;
        tracing::debug!(script = script_name, "Transaction begun");

        let rows_affected = transaction
            .execute(sql)
            .await
            .map_err(ScriptError::Execution)?;

        transaction.commit().await.map_err(ScriptError::Commit)?;
        tracing::info!(script = script_name, rows_affected, "Transaction committed");

        Ok(rows_affected)
    }
}
