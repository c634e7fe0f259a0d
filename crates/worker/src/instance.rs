//! Discovers the databases on one instance and fans out over them.

use std::sync::Arc;

use sqlsweep_core::databases::filter_restricted;
use sqlsweep_core::{ErrorKind, ExecutionOutcome, Instance};

use crate::context::RunContext;
use crate::database::DatabaseRunner;
use crate::settle::TaskSet;

pub struct InstanceRunner {
    ctx: Arc<RunContext>,
}

impl InstanceRunner {
    pub fn new(ctx: Arc<RunContext>) -> Self {
        Self { ctx }
    }

    /// Run the catalog against every client database on `instance`.
    ///
    /// A failed discovery yields exactly one instance-level outcome and no
    /// database is attempted.
    pub async fn run(&self, instance: &Instance) -> Vec<ExecutionOutcome> {
        let databases = match self.discover(instance).await {
            Ok(databases) => databases,
            Err(outcome) => return vec![outcome],
        };

        tracing::info!(
            instance = %instance,
            databases = databases.len(),
            "Databases discovered",
        );

        let mut tasks = TaskSet::new();
        for database in databases {
            let runner = DatabaseRunner::new(Arc::clone(&self.ctx));
            let instance = instance.clone();
            let name = database.clone();
            tasks.spawn(name, async move { runner.run(&instance, &database).await });
        }

        let mut outcomes = Vec::new();
        for (database, result) in tasks.settle().await {
            match result {
                Ok(database_outcomes) => outcomes.extend(database_outcomes),
                Err(e) => {
                    tracing::error!(
                        instance = %instance,
                        database = %database,
                        error = %e,
                        "Database task aborted",
                    );
                    outcomes.push(ExecutionOutcome::database_failed(
                        instance.clone(),
                        database,
                        ErrorKind::TaskAborted,
                        e.to_string(),
                    ));
                }
            }
        }

        outcomes
    }

    /// List the non-restricted databases on `instance`.
    ///
    /// The discovery connection is closed before returning, whatever the
    /// discovery result.
    async fn discover(&self, instance: &Instance) -> Result<Vec<String>, ExecutionOutcome> {
        let connection = self
            .ctx
            .factory
            .open(instance, None, &self.ctx.credentials)
            .await
            .map_err(|e| {
                tracing::error!(instance = %instance, error = %e, "Failed to open instance connection");
                ExecutionOutcome::instance_failed(instance.clone(), ErrorKind::Connection, e.to_string())
            })?;

        let discovered = connection.query_names(self.ctx.catalog.discovery_sql()).await;

        if let Err(e) = connection.close().await {
            tracing::warn!(instance = %instance, error = %e, "Failed to close discovery connection");
        }

        match discovered {
            Ok(names) => Ok(filter_restricted(names)),
            Err(e) => {
                tracing::error!(instance = %instance, error = %e, "Database discovery failed");
                Err(ExecutionOutcome::instance_failed(
                    instance.clone(),
                    ErrorKind::Discovery,
                    e.to_string(),
                ))
            }
        }
    }
}
