//! Notification transport client
//!
//! Delivers the end-of-run summary through a webhook. Dispatch is
//! fire-and-forget from the pipeline's perspective: callers log a failed
//! send and move on, the run record is already final by then.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

/// A rendered notification ready for dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    /// Names of archived files referenced by the summary.
    pub attachments: Vec<String>,
    /// Delivery address the transport routes to.
    pub to: String,
}

/// HTTP client for the notification webhook
#[derive(Debug, Clone)]
pub struct NotificationClient {
    webhook_url: String,
    client: Client,
}

impl NotificationClient {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: Client::new(),
        }
    }

    pub fn webhook_url(&self) -> &str {
        &self.webhook_url
    }

    /// Posts the notification to the webhook
    pub async fn send(&self, notification: &Notification) -> Result<()> {
        debug!(
            "Dispatching notification '{}' to {}",
            notification.subject, self.webhook_url
        );

        let response = self
            .client
            .post(&self.webhook_url)
            .json(notification)
            .send()
            .await?;
        crate::expect_success(response).await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_payload_shape() {
        let notification = Notification {
            subject: "[drydock] demo build #3 - Succeeded".to_string(),
            body: "all stages passed".to_string(),
            attachments: vec!["run.json".to_string()],
            to: "ops@example.com".to_string(),
        };
        let json = serde_json::to_value(&notification).unwrap();
        assert_eq!(json["subject"], "[drydock] demo build #3 - Succeeded");
        assert_eq!(json["attachments"][0], "run.json");
        assert_eq!(json["to"], "ops@example.com");
    }
}
