//! One sweep = one orchestrated run followed by exactly one report.

use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use sqlsweep_core::{AggregatedReport, Instance};
use sqlsweep_events::Reporter;

use crate::orchestrator::Orchestrator;

pub struct SweepJob {
    orchestrator: Orchestrator,
    reporter: Reporter,
    instances: Vec<Instance>,
}

impl SweepJob {
    pub fn new(orchestrator: Orchestrator, reporter: Reporter, instances: Vec<Instance>) -> Self {
        Self {
            orchestrator,
            reporter,
            instances,
        }
    }

    /// Run every instance to completion, then publish the report once.
    pub async fn run_once(&self) -> AggregatedReport {
        let report = self.orchestrator.run(&self.instances).await;
        self.reporter.publish(&report).await;
        report
    }

    /// Sweep on a fixed interval until `cancel` fires.
    ///
    /// The first sweep starts immediately. A sweep already in progress is
    /// finished and reported before cancellation is observed. Returns the
    /// number of sweeps completed.
    pub async fn run_every(&self, period: Duration, cancel: CancellationToken) -> usize {
        tracing::info!(interval_secs = period.as_secs(), "Sweep schedule started");

        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut completed = 0;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(completed, "Sweep schedule stopping");
                    break;
                }
                _ = interval.tick() => {
                    let report = self.run_once().await;
                    completed += 1;
                    tracing::debug!(run_id = %report.run_id, completed, "Sweep complete");
                }
            }
        }

        completed
    }
}
