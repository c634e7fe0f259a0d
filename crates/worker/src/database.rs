//! Runs the maintenance catalog against one database.
//!
//! One connection is opened for the `(instance, database)` pair and shared
//! by one task per script; each task runs in its own transaction. All
//! tasks are settled before the connection is closed, and the close
//! happens exactly once whenever the open succeeded.

use std::sync::Arc;

use sqlsweep_core::{ErrorKind, ExecutionOutcome, Instance};
use sqlsweep_db::QueryExecutor;

use crate::context::RunContext;
use crate::settle::TaskSet;

pub struct DatabaseRunner {
    ctx: Arc<RunContext>,
}

impl DatabaseRunner {
    pub fn new(ctx: Arc<RunContext>) -> Self {
        Self { ctx }
    }

    /// Run every maintenance script against `database` and return one
    /// outcome per script, or a single connection failure.
    pub async fn run(&self, instance: &Instance, database: &str) -> Vec<ExecutionOutcome> {
        let connection = match self
            .ctx
            .factory
            .open(instance, Some(database), &self.ctx.credentials)
            .await
        {
            Ok(connection) => connection,
            Err(e) => {
                tracing::error!(
                    instance = %instance,
                    database,
                    error = %e,
                    "Failed to open database connection",
                );
                return vec![ExecutionOutcome::database_failed(
                    instance.clone(),
                    database,
                    ErrorKind::Connection,
                    e.to_string(),
                )];
            }
        };

        let mut tasks = TaskSet::new();
        for script in self.ctx.catalog.maintenance_scripts() {
            let connection = Arc::clone(&connection);
            let name = script.name.clone();
            tasks.spawn(name, async move {
                QueryExecutor::run(connection.as_ref(), &script.name, &script.sql).await
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for (script, result) in tasks.settle().await {
            let outcome = match result {
                Ok(Ok(rows_affected)) => {
                    ExecutionOutcome::succeeded(instance.clone(), database, script, rows_affected)
                }
                Ok(Err(e)) => {
                    tracing::error!(
                        instance = %instance,
                        database,
                        script = %script,
                        kind = %e.kind(),
                        error = %e,
                        "Script failed",
                    );
                    ExecutionOutcome::script_failed(
                        instance.clone(),
                        database,
                        script,
                        e.kind(),
                        e.to_string(),
                    )
                }
                Err(e) => {
                    tracing::error!(
                        instance = %instance,
                        database,
                        script = %script,
                        error = %e,
                        "Script task aborted",
                    );
                    ExecutionOutcome::script_failed(
                        instance.clone(),
                        database,
                        script,
                        ErrorKind::TaskAborted,
                        e.to_string(),
                    )
                }
            };
            outcomes.push(outcome);
        }

        if let Err(e) = connection.close().await {
            tracing::warn!(
                instance = %instance,
                database,
                error = %e,
                "Failed to close database connection",
            );
        }

        outcomes
    }
}
