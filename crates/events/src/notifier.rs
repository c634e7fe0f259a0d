//! The notification seam and the message handed across it.

use async_trait::async_trait;
use sqlsweep_core::{ErrorKind, ReportStatus};

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for notification delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The SNS publish call failed.
    #[error("SNS publish failed: {0}")]
    Sns(String),

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),

    /// The payload could not be encoded.
    #[error("Payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl NotifyError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::NotificationDispatch
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// One run's notification.
///
/// `lines` holds one entry per failing unit and is empty on success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub status: ReportStatus,
    pub headline: String,
    pub lines: Vec<String>,
}

impl Notification {
    /// The plain-text payload: headline followed by one line per failure.
    pub fn text(&self) -> String {
        let mut text = self.headline.clone();
        for line in &self.lines {
            text.push('\n');
            text.push_str(line);
        }
        text
    }
}

/// Delivers a notification to some external channel.
///
/// Delivery guarantees belong to the implementation; callers publish once
/// and do not retry.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError>;
}
