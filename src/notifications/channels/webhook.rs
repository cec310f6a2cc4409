//! Webhook notification channel
//!
//! Posts notices as chat-style JSON messages.
//!
//! # Payload Format
//!
//! ```json
//! {
//!   "content": "**Transfer Relay ERROR**\nError processing @FabrizioRomano: ...",
//!   "timestamp": "2025-07-04T15:15:00+00:00"
//! }
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Channel, ChannelError, ChannelResult};
use crate::notifications::Notice;

/// Title prefix of every message
const MESSAGE_TITLE: &str = "Transfer Relay";

/// Webhook channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookConfig {
    /// Webhook URL endpoint
    pub url: String,
    /// Optional authentication token (sent as Bearer token)
    pub auth_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 {
    10
}

impl WebhookConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            auth_token: None,
            timeout_secs: default_timeout(),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.url.is_empty() {
            return Err("Webhook URL cannot be empty".to_string());
        }

        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err("Webhook URL must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Webhook notification channel
pub struct WebhookChannel {
    config: WebhookConfig,
    client: Client,
}

impl WebhookChannel {
    pub fn new(config: WebhookConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Create a webhook channel with just a URL
    pub fn from_url(url: impl Into<String>) -> ChannelResult<Self> {
        Self::new(WebhookConfig::new(url))
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    fn build_payload(&self, notice: &Notice) -> serde_json::Value {
        serde_json::json!({
            "content": format!("**{MESSAGE_TITLE} {}**\n{}", notice.kind.label(), notice.message),
            "timestamp": notice.created_at.to_rfc3339(),
        })
    }
}

#[async_trait]
impl Channel for WebhookChannel {
    fn name(&self) -> &str {
        "webhook"
    }

    async fn send(&self, notice: &Notice) -> ChannelResult<()> {
        let payload = self.build_payload(notice);

        let mut request = self.client.post(&self.config.url);
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.json(&payload).send().await?;
        let status = response.status();

        if status.is_success() {
            tracing::info!(kind = %notice.kind, "Webhook notification sent");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ChannelError::Unavailable(format!("HTTP {status}: {body}")));
        }
        Err(ChannelError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
