//! Log-only delivery for local and dry runs.

use async_trait::async_trait;
use sqlsweep_core::ReportStatus;

use crate::notifier::{Notification, Notifier, NotifyError};

#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        match notification.status {
            ReportStatus::Success => {
                tracing::info!(subject = %notification.subject, "{}", notification.text());
            }
            ReportStatus::Failure => {
                tracing::warn!(subject = %notification.subject, "{}", notification.text());
            }
        }
        Ok(())
    }
}
