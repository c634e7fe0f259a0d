//! Top of the fan-out: one task per configured instance.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use uuid::Uuid;

use sqlsweep_core::{AggregatedReport, Credentials, ErrorKind, ExecutionOutcome, Instance, QueryCatalog};
use sqlsweep_db::ConnectionFactory;

use crate::context::RunContext;
use crate::instance::InstanceRunner;
use crate::settle::TaskSet;

pub struct Orchestrator {
    ctx: Arc<RunContext>,
}

impl Orchestrator {
    pub fn new(
        factory: Arc<dyn ConnectionFactory>,
        catalog: Arc<QueryCatalog>,
        credentials: Credentials,
    ) -> Self {
        Self {
            ctx: Arc::new(RunContext::new(factory, catalog, credentials)),
        }
    }

    /// Run the catalog against every database on every instance and fold
    /// the outcomes into one report.
    ///
    /// Every instance task is awaited, whatever happens to its siblings. An
    /// instance task that panics becomes a single failed outcome for that
    /// instance.
    pub async fn run(&self, instances: &[Instance]) -> AggregatedReport {
        let run_id = Uuid::now_v7();
        let started_at = Utc::now();
        let timer = Instant::now();

        tracing::info!(
            run_id = %run_id,
            instances = instances.len(),
            scripts = self.ctx.catalog.maintenance_count(),
            "Run started",
        );

        let mut tasks = TaskSet::new();
        for instance in instances {
            let runner = InstanceRunner::new(Arc::clone(&self.ctx));
            let target = instance.clone();
            tasks.spawn(instance.clone(), async move { runner.run(&target).await });
        }

        let mut outcomes = Vec::new();
        for (instance, result) in tasks.settle().await {
            match result {
                Ok(instance_outcomes) => outcomes.extend(instance_outcomes),
                Err(e) => {
                    tracing::error!(instance = %instance, error = %e, "Instance task aborted");
                    outcomes.push(ExecutionOutcome::instance_failed(
                        instance,
                        ErrorKind::TaskAborted,
                        e.to_string(),
                    ));
                }
            }
        }

        let report = AggregatedReport::from_outcomes(run_id, started_at, instances.len(), outcomes);

        tracing::info!(
            run_id = %run_id,
            status = ?report.status(),
            databases = report.databases,
            scripts_succeeded = report.scripts_succeeded,
            failures = report.failures.len(),
            elapsed_ms = timer.elapsed().as_millis() as u64,
            "Run finished",
        );

        report
    }
}
