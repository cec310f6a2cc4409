//! Source feeds
//!
//! A [`SourceFeed`] yields the latest raw items of a named source. The
//! pipeline only consumes this capability; transport details live in the
//! implementations ([`NitterFeed`]).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::RawItem;
use crate::utils::error::{FetchError, InitError};

mod nitter;

pub use nitter::{parse_timeline, NitterFeed};

/// Fetches raw items for a source
#[async_trait]
pub trait SourceFeed: Send + Sync {
    /// Acquire the feed session. Failure is fatal at startup.
    async fn open(&self) -> Result<(), InitError> {
        Ok(())
    }

    /// Latest items for `source_id`, newest first, at most `count`
    async fn fetch_latest(&self, source_id: &str, count: usize)
        -> Result<Vec<RawItem>, FetchError>;

    /// Release the feed session
    async fn close(&self) {}
}

/// Feed transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Timeline front-end base URL; the source id is appended as a path
    pub base_url: String,

    /// Request pacing
    pub requests_per_second: u32,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nitter.net".to_string(),
            requests_per_second: 1,
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .to_string(),
        }
    }
}
