//! Turns a run's [`AggregatedReport`] into exactly one notification.
//!
//! One payload per run: a success message when nothing failed, otherwise a
//! single message listing every failing unit. Publishing is best-effort; a
//! delivery failure is logged and never fails the run.

use std::sync::Arc;

use sqlsweep_core::{AggregatedReport, ReportStatus};

use crate::notifier::{Notification, Notifier};

/// Default subject line for published reports.
pub const DEFAULT_SUBJECT: &str = "Message from sqlsweep";

pub struct Reporter {
    notifier: Arc<dyn Notifier>,
    subject: String,
}

impl Reporter {
    pub fn new(notifier: Arc<dyn Notifier>, subject: impl Into<String>) -> Self {
        Self {
            notifier,
            subject: subject.into(),
        }
    }

    /// Build the notification for `report` without sending it.
    pub fn build(&self, report: &AggregatedReport) -> Notification {
        match report.status() {
            ReportStatus::Success => Notification {
                subject: self.subject.clone(),
                status: ReportStatus::Success,
                headline: format!(
                    "Run {} succeeded: {} instance(s), {} database(s), {} script(s) completed",
                    report.run_id, report.instances, report.databases, report.scripts_succeeded
                ),
                lines: Vec::new(),
            },
            ReportStatus::Failure => Notification {
                subject: self.subject.clone(),
                status: ReportStatus::Failure,
                headline: format!(
                    "Run {} failed: {} failed execution(s) across {} instance(s)",
                    report.run_id,
                    report.failures.len(),
                    report.instances
                ),
                lines: report.failures.iter().map(|f| f.summary_line()).collect(),
            },
        }
    }

    /// Publish `report` once. Errors are logged, not returned.
    pub async fn publish(&self, report: &AggregatedReport) {
        let notification = self.build(report);

        match self.notifier.publish(&notification).await {
            Ok(()) => {
                tracing::info!(
                    run_id = %report.run_id,
                    failures = report.failures.len(),
                    "Run report published",
                );
            }
            Err(e) => {
                tracing::error!(
                    run_id = %report.run_id,
                    kind = %e.kind(),
                    error = %e,
                    "Failed to publish run report",
                );
            }
        }
    }
}
