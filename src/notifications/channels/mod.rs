//! Notification channels for delivering operator notices

pub mod webhook;

use async_trait::async_trait;

use crate::notifications::Notice;

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Channel temporarily unavailable
    #[error("Channel temporarily unavailable: {0}")]
    Unavailable(String),

    /// Endpoint refused the notice
    #[error("Delivery rejected ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// A delivery target for notices
#[async_trait]
pub trait Channel: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver a notice with a single attempt
    async fn send(&self, notice: &Notice) -> ChannelResult<()>;
}
