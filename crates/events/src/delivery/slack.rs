//! Slack incoming-webhook delivery.
//!
//! [`SlackNotifier`] POSTs a Slack message to an incoming-webhook URL.
//! Failure reports use a message attachment; success reports are a plain
//! text message. A single attempt is made per notification.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use sqlsweep_core::ReportStatus;

use crate::notifier::{Notification, Notifier, NotifyError};

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Attachment colour.
const ATTACHMENT_COLOR: &str = "#36a64f";

// ---------------------------------------------------------------------------
// Message shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SlackMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<SlackAttachment>,
}

#[derive(Debug, Serialize)]
pub struct SlackAttachment {
    pub fallback: String,
    pub color: String,
    pub title: String,
    pub text: String,
    pub fields: Vec<SlackField>,
}

#[derive(Debug, Serialize)]
pub struct SlackField {
    pub title: String,
    pub value: String,
    pub short: bool,
}

/// A plain text message.
pub fn build_message(text: impl Into<String>) -> SlackMessage {
    SlackMessage {
        text: Some(text.into()),
        attachments: Vec::new(),
    }
}

/// A critical-priority attachment summarising failed executions.
pub fn build_failure_attachment(app_name: &str, lines: &[String]) -> SlackMessage {
    SlackMessage {
        text: None,
        attachments: vec![SlackAttachment {
            fallback: "Summary of Failed Executions".to_string(),
            color: ATTACHMENT_COLOR.to_string(),
            title: format!("{app_name} Execution Error"),
            text: lines.join("\n"),
            fields: vec![SlackField {
                title: "Priority".to_string(),
                value: "Critical".to_string(),
                short: false,
            }],
        }],
    }
}

// ---------------------------------------------------------------------------
// SlackNotifier
// ---------------------------------------------------------------------------

pub struct SlackNotifier {
    client: reqwest::Client,
    webhook_url: String,
    app_name: String,
}

impl SlackNotifier {
    pub fn new(webhook_url: impl Into<String>, app_name: impl Into<String>) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.into(),
            app_name: app_name.into(),
        })
    }

    /// Slack message for `notification`.
    pub fn message(&self, notification: &Notification) -> SlackMessage {
        match notification.status {
            ReportStatus::Success => build_message(notification.headline.clone()),
            ReportStatus::Failure => {
                let mut message = build_failure_attachment(&self.app_name, &notification.lines);
                message.text = Some(notification.headline.clone());
                message
            }
        }
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    async fn publish(&self, notification: &Notification) -> Result<(), NotifyError> {
        let body = serde_json::to_value(self.message(notification))?;
        let response = self.client.post(&self.webhook_url).json(&body).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}
