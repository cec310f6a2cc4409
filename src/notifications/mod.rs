//! Operator notifications
//!
//! The pipeline reports failures and lifecycle events through a
//! [`NotificationSink`]. Delivery is best-effort: a sink never returns an
//! error to its caller, and a failed delivery is only logged.
//!
//! ```text
//!   Orchestrator / Scheduler / main
//!                 │ notify(kind, message)
//!                 ▼
//!   ┌──────────────────────────────┐
//!   │ Notifier                     │
//!   │  - fan-out to channels       │
//!   │  - logs failed deliveries    │
//!   └──────────────────────────────┘
//!                 │
//!                 ▼
//!          ┌─────────────┐
//!          │   Webhook   │
//!          │   Channel   │
//!          └─────────────┘
//! ```

pub mod channels;
mod manager;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub use channels::webhook::{WebhookChannel, WebhookConfig};
pub use channels::{Channel, ChannelError, ChannelResult};
pub use manager::{NotificationConfig, Notifier};

/// Kind of operator notice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    /// A run, source or item failed
    Error,
    /// Degraded behavior that did not fail anything
    Warning,
    /// Lifecycle events (startup, shutdown)
    Info,
}

impl NoticeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Upper-case label used in message headers
    pub fn label(&self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
            Self::Info => "INFO",
        }
    }
}

impl fmt::Display for NoticeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operator-facing message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            created_at: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Error, message)
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NoticeKind::Info, message)
    }
}

/// Best-effort delivery of operator messages
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver a message. Never fails and never retries.
    async fn notify(&self, kind: NoticeKind, message: &str);
}

/// Sink that drops every message
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn notify(&self, kind: NoticeKind, message: &str) {
        tracing::debug!(kind = %kind, message, "Notification dropped");
    }
}
