//! Notification seam
//!
//! Delivers the final suggestion list to the address collected during the
//! dialog. Production talks to a mail-relay style HTTP API; the worker only
//! sees the trait.

use crate::config::NotifyConfig;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Result type for notification operations
pub type Result<T> = std::result::Result<T, NotifyError>;

/// Errors that can occur while sending a notification
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Message rejected: {0}")]
    Rejected(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Timeout")]
    Timeout,
}

/// Seam to the delivery channel
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// Send one message; returns only after the relay accepted it.
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// HTTP client for a mail-relay API
pub struct HttpNotifier {
    config: NotifyConfig,
    client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NotificationSender for HttpNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()> {
        let url = format!("{}/messages", self.config.base_url);

        let payload = json!({
            "from": self.config.sender,
            "to": recipient,
            "subject": subject,
            "body": body,
        });

        let mut request = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(&payload);

        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NotifyError::Timeout
            } else {
                NotifyError::NetworkError(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 || status.as_u16() == 403 {
                return Err(NotifyError::AuthenticationFailed(text));
            }
            return Err(NotifyError::Rejected(text));
        }

        Ok(())
    }
}
