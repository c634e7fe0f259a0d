//! Amazon SNS delivery.
//!
//! Publishes the plain-text payload with a subject line to one topic.
//! Downstream subscribers (e.g. a chat relay) are outside this crate.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_sns::error::DisplayErrorContext;

use crate::notifier::{Notification, Notifier, NotifyError};

/// SNS caps subjects at 100 characters.
const MAX_SUBJECT_LEN: usize = 100;

/// SNS rejects messages larger than 256 KiB.
const MAX_MESSAGE_BYTES: usize = 256 * 1024;

pub struct SnsNotifier {
    client: aws_sdk_sns::Client,
    topic_arn: String,
}

impl SnsNotifier {
    pub fn new(client: aws_sdk_sns::Client, topic_arn: impl Into<String>) -> Self {
        Self {
            client,
            topic_arn: topic_arn.into(),
        }
    }

    /// Build a client from the default AWS credential and region chain.
    pub async fn from_env(topic_arn: impl Into<String>) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self::new(aws_sdk_sns::Client::new(&config), topic_arn)
    }
}

#[async_trait]
impl Notifier for SnsNotifier {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        let subject: String = notification.subject.chars().take(MAX_SUBJECT_LEN).collect();

        let output = self
            .client
            .publish()
            .topic_arn(&self.topic_arn)
            .subject(subject)
            .message(bounded_text(notification, MAX_MESSAGE_BYTES))
            .send()
            .await
            .map_err(|e| NotifyError::Sns(DisplayErrorContext(&e).to_string()))?;

        tracing::debug!(
            topic_arn = %self.topic_arn,
            message_id = output.message_id().unwrap_or("-"),
            "Published to SNS",
        );
        Ok(())
    }
}

/// The notification text, cut down to at most `limit` bytes.
///
/// The headline is always kept; it already carries the full failure count.
/// Failure lines are kept in order until the next one would not fit, and the
/// rest are replaced by an `... and N more` marker.
fn bounded_text(notification: &Notification, limit: usize) -> String {
    let full = notification.text();
    if full.len() <= limit {
        return full;
    }

    let total = notification.lines.len();
    let reserve = format!("\n... and {total} more").len();

    let mut text = notification.headline.clone();
    let mut kept = 0;
    for line in &notification.lines {
        if text.len() + 1 + line.len() + reserve > limit {
            break;
        }
        text.push('\n');
        text.push_str(line);
        kept += 1;
    }

    text.push_str(&format!("\n... and {} more", total - kept));
    text
}

#[cfg(test)]
mod tests {
    use sqlsweep_core::ReportStatus;

    use super::*;

    fn failure(lines: usize) -> Notification {
        Notification {
            subject: "subject".into(),
            status: ReportStatus::Failure,
            headline: format!("Run failed: {lines} failed execution(s)"),
            lines: (0..lines)
                .map(|i| format!("[ScriptExecutionError] instance=a database=db{i:03} script=update : boom"))
                .collect(),
        }
    }

    #[test]
    fn small_message_is_sent_whole() {
        let notification = failure(3);
        assert_eq!(bounded_text(&notification, MAX_MESSAGE_BYTES), notification.text());
    }

    #[test]
    fn oversized_message_keeps_headline_and_counts_dropped_lines() {
        let notification = failure(50);
        let limit = 1_000;

        let text = bounded_text(&notification, limit);

        assert!(text.len() <= limit);
        assert!(text.starts_with("Run failed: 50 failed execution(s)\n"));

        let kept = text.lines().filter(|l| l.starts_with("[ScriptExecutionError]")).count();
        assert!(kept > 0);
        assert!(text.ends_with(&format!("... and {} more", 50 - kept)));
    }

    #[test]
    fn full_size_fleet_report_fits_the_sns_limit() {
        let notification = failure(10_000);
        assert!(notification.text().len() > MAX_MESSAGE_BYTES);
        assert!(bounded_text(&notification, MAX_MESSAGE_BYTES).len() <= MAX_MESSAGE_BYTES);
    }
}
