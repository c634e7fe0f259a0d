//! The single per-run summary.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::outcome::ExecutionOutcome;

/// Overall result of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Success,
    Failure,
}

/// Aggregated result of one invocation.
///
/// Holds every failing outcome plus a few counters about the work that
/// completed. The run is a success iff `failures` is empty; there is no
/// partial-success state.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub instances: usize,
    pub databases: usize,
    pub scripts_succeeded: usize,
    pub failures: Vec<ExecutionOutcome>,
}

impl AggregatedReport {
    /// Fold a run's outcomes into a report.
    ///
    /// `instances` is the number of configured instances; databases are
    /// counted from the distinct `(instance, database)` pairs seen.
    pub fn from_outcomes(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        instances: usize,
        outcomes: Vec<ExecutionOutcome>,
    ) -> Self {
        let databases: BTreeSet<(&str, &str)> = outcomes
            .iter()
            .filter_map(|o| o.database.as_deref().map(|d| (o.instance.as_str(), d)))
            .collect();
        let databases = databases.len();

        let (failures, successes): (Vec<_>, Vec<_>) =
            outcomes.into_iter().partition(ExecutionOutcome::is_failure);

        Self {
            run_id,
            started_at,
            finished_at: Utc::now(),
            instances,
            databases,
            scripts_succeeded: successes.len(),
            failures,
        }
    }

    pub fn status(&self) -> ReportStatus {
        if self.failures.is_empty() {
            ReportStatus::Success
        } else {
            ReportStatus::Failure
        }
    }

    pub fn is_success(&self) -> bool {
        self.status() == ReportStatus::Success
    }
}
