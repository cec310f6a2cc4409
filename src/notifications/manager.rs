//! Fan-out notifier over configured channels

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::channels::webhook::{WebhookChannel, WebhookConfig};
use super::channels::{Channel, ChannelResult};
use super::{Notice, NoticeKind, NotificationSink};

/// Notification settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Webhook endpoint; none means notices are only logged
    pub webhook_url: Option<String>,

    /// Bearer token sent with every webhook request
    pub webhook_token: Option<String>,

    /// Webhook request timeout in seconds
    pub timeout_secs: Option<u64>,
}

impl NotificationConfig {
    pub fn from_env() -> Self {
        Self {
            webhook_url: std::env::var("WEBHOOK_URL")
                .ok()
                .filter(|url| !url.trim().is_empty()),
            webhook_token: std::env::var("WEBHOOK_TOKEN")
                .ok()
                .filter(|token| !token.trim().is_empty()),
            timeout_secs: None,
        }
    }
}

/// Delivers every notice to every registered channel
#[derive(Default)]
pub struct Notifier {
    channels: Vec<Box<dyn Channel>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build channels from config
    pub fn from_config(config: &NotificationConfig) -> ChannelResult<Self> {
        let mut notifier = Self::new();
        if let Some(url) = &config.webhook_url {
            let mut webhook = WebhookConfig::new(url.clone());
            if let Some(token) = &config.webhook_token {
                webhook = webhook.with_auth_token(token.clone());
            }
            if let Some(timeout) = config.timeout_secs {
                webhook = webhook.with_timeout(timeout);
            }
            notifier.add_channel(Box::new(WebhookChannel::new(webhook)?));
        }
        Ok(notifier)
    }

    pub fn add_channel(&mut self, channel: Box<dyn Channel>) {
        self.channels.push(channel);
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[async_trait]
impl NotificationSink for Notifier {
    async fn notify(&self, kind: NoticeKind, message: &str) {
        if self.channels.is_empty() {
            tracing::warn!(kind = %kind, message, "No webhook URL configured");
            return;
        }

        let notice = Notice::new(kind, message);
        for channel in &self.channels {
            match channel.send(&notice).await {
                Ok(()) => tracing::debug!(channel = channel.name(), "Notice delivered"),
                Err(e) => tracing::error!(
                    channel = channel.name(),
                    error = %e,
                    "Failed to send notification"
                ),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::channels::ChannelError;
    use std::sync::{Arc, Mutex};

    struct Recording {
        sent: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    #[async_trait]
    impl Channel for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, notice: &Notice) -> ChannelResult<()> {
            self.sent.lock().unwrap().push(notice.message.clone());
            if self.fail {
                Err(ChannelError::Unavailable("offline".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_from_config_without_url_has_no_channels() {
        let notifier = Notifier::from_config(&NotificationConfig::default()).unwrap();
        assert_eq!(notifier.channel_count(), 0);
    }

    #[test]
    fn test_from_config_rejects_bad_url() {
        let config = NotificationConfig {
            webhook_url: Some("ftp://nope".to_string()),
            ..Default::default()
        };
        assert!(Notifier::from_config(&config).is_err());
    }

    #[tokio::test]
    async fn test_failed_channel_does_not_stop_fan_out() {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let mut notifier = Notifier::new();
        notifier.add_channel(Box::new(Recording {
            sent: sent.clone(),
            fail: true,
        }));
        notifier.add_channel(Box::new(Recording {
            sent: sent.clone(),
            fail: false,
        }));

        notifier.notify(NoticeKind::Error, "boom").await;

        assert_eq!(*sent.lock().unwrap(), vec!["boom".to_string(), "boom".to_string()]);
    }

    #[tokio::test]
    async fn test_notify_without_channels_is_silent() {
        Notifier::new().notify(NoticeKind::Info, "nobody listens").await;
    }
}
