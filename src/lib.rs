//! transfer-relay - Football transfer news relay
//!
//! Watches a set of journalist timelines, keeps the posts that are transfer
//! news, rewrites them with a completion banner and a trust footer, and
//! republishes them at a paced rate on a recurring schedule.
//!
//! # Architecture
//!
//! - [`scheduler`] - Immediate + periodic runs, never overlapping
//! - [`pipeline`] - One run over all active sources: dedup, classify, rewrite, publish
//! - [`feed`] - Source timelines ([`feed::SourceFeed`])
//! - [`classifier`] - Relevance and completion signal ([`classifier::ContentClassifier`])
//! - [`rewriter`] - Rewriting and banner policy ([`rewriter::TextRewriter`])
//! - [`formatter`] - Provenance footer
//! - [`publisher`] - Outbound publishing ([`publisher::Publisher`])
//! - [`notifications`] - Operator notices ([`notifications::NotificationSink`])
//! - [`registry`] - Source registry snapshots
//! - [`storage`] - Dedup ledger
//! - [`config`] - Configuration management and settings
//! - [`metrics`] - Prometheus counters
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use transfer_relay::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let components = Components {
//!         feed: Arc::new(NitterFeed::new(&config.feed)?),
//!         classifier: Arc::new(KeywordClassifier::new(&config.classifier)?),
//!         rewriter: Arc::new(LlmRewriter::new(config.rewriter.clone())?),
//!         publisher: Arc::new(DryRunPublisher::new()),
//!         notifier: Arc::new(Notifier::from_config(&config.notifications)?),
//!     };
//!     let orchestrator = Arc::new(Orchestrator::new(config.pipeline.clone(), components));
//!     let registry = Arc::new(FileRegistry::new(&config.registry.path));
//!     let scheduler = Scheduler::new(orchestrator, registry);
//!     scheduler.start(config.scheduler.interval_minutes).await?;
//!     Ok(())
//! }
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod feed;
pub mod formatter;
pub mod metrics;
pub mod models;
pub mod notifications;
pub mod pipeline;
pub mod publisher;
pub mod registry;
pub mod rewriter;
pub mod scheduler;
pub mod storage;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::classifier::{ContentClassifier, KeywordClassifier};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, RelayErrorTrait, Result};
    pub use crate::feed::{NitterFeed, SourceFeed};
    pub use crate::models::{RawItem, RunOutcome, Source, SourceStatus, TrustTier};
    pub use crate::notifications::{NoticeKind, NotificationSink, Notifier};
    pub use crate::pipeline::{Components, Orchestrator, PipelineConfig};
    pub use crate::publisher::{ApiPublisher, DryRunPublisher, Publisher};
    pub use crate::registry::{FileRegistry, SourceRegistry, StaticRegistry};
    pub use crate::rewriter::{BannerPolicy, LlmRewriter, LocalRewriter, TextRewriter};
    pub use crate::scheduler::{Scheduler, TriggerOutcome};
}

// Direct re-exports for convenience
pub use models::{RawItem, RunOutcome, Source, TrustTier};
