/// Notification sink module
///
/// Narrow interface to the outbound messaging channel, implemented against a
/// Discord webhook. Delivery semantics (rate limits, retries) are the sink's
/// concern; callers only see success or a single failure.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Request timeout for a single webhook delivery
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Transport(String),

    #[error("Webhook rejected message: status {status}: {body}")]
    Rejected { status: StatusCode, body: String },
}

/// Outbound notification sink
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message. A slow or failed delivery never blocks beyond a
    /// single request round trip.
    async fn send(&self, content: &str) -> Result<(), NotifyError>;
}

#[derive(Serialize)]
struct AllowedMentions<'a> {
    roles: Vec<&'a str>,
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    content: &'a str,
    allowed_mentions: AllowedMentions<'a>,
}

/// Discord webhook adapter
///
/// Tags the configured staff role in `allowed_mentions` so role pings in the
/// message body actually notify. Discord signals success with 204 No Content.
#[derive(Clone)]
pub struct DiscordWebhook {
    client: Client,
    webhook_url: String,
    staff_role_id: Option<String>,
}

impl DiscordWebhook {
    pub fn new(webhook_url: String, staff_role_id: Option<String>) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            webhook_url,
            staff_role_id,
        })
    }

    fn payload<'a>(&'a self, content: &'a str) -> WebhookPayload<'a> {
        WebhookPayload {
            content,
            allowed_mentions: AllowedMentions {
                roles: self.staff_role_id.iter().map(String::as_str).collect(),
            },
        }
    }
}

#[async_trait]
impl Notifier for DiscordWebhook {
    async fn send(&self, content: &str) -> Result<(), NotifyError> {
        debug!("Delivering webhook message ({} chars)", content.len());

        let resp = self
            .client
            .post(&self.webhook_url)
            .json(&self.payload(content))
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::NO_CONTENT {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Rejected { status, body });
        }

        Ok(())
    }
}
