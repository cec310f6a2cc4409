//! Pipeline orchestrator
//!
//! One run walks the active sources in registry order and, for each item
//! the feed returns, applies:
//!
//! ```text
//! dedup check → relevance → completion → rewrite → footer → publish → mark seen → cool-down
//! ```
//!
//! Containment rules:
//! - a failed fetch abandons that source for this run; later sources still run
//! - a classifier error counts as "not relevant" (or "no completion")
//! - a failed publish leaves the item unmarked, so a later run retries it,
//!   and skips the cool-down
//! - a publish against a closed session abandons the rest of that source
//!
//! The dedup ledger is owned here and nowhere else.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::Instrument;
use uuid::Uuid;

use crate::classifier::ContentClassifier;
use crate::error::{Error, RelayErrorTrait, Result};
use crate::feed::SourceFeed;
use crate::formatter;
use crate::metrics::{self, SkipReason};
use crate::models::{RawItem, RunOutcome, Source, SourceStatus};
use crate::notifications::{NoticeKind, NotificationSink};
use crate::publisher::Publisher;
use crate::rewriter::TextRewriter;
use crate::storage::DedupLedger;
use crate::utils::error::{InitError, PublishError};
use crate::utils::preview;

/// Pacing and fetch settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Pause after each successful publish, in seconds
    pub cooldown_secs: u64,

    /// Items requested per source per run
    pub fetch_count: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 30,
            fetch_count: 5,
        }
    }
}

impl PipelineConfig {
    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }
}

/// External collaborators of the pipeline
#[derive(Clone)]
pub struct Components {
    pub feed: Arc<dyn SourceFeed>,
    pub classifier: Arc<dyn ContentClassifier>,
    pub rewriter: Arc<dyn TextRewriter>,
    pub publisher: Arc<dyn Publisher>,
    pub notifier: Arc<dyn NotificationSink>,
}

/// Classification and formatting of a text, without publishing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Preview {
    pub relevant: bool,
    pub completion: bool,
    /// Final post text; `None` when the text is not relevant
    pub text: Option<String>,
}

/// Drives runs over a source snapshot
pub struct Orchestrator {
    config: PipelineConfig,
    components: Components,
    ledger: RwLock<DedupLedger>,
}

impl Orchestrator {
    pub fn new(config: PipelineConfig, components: Components) -> Self {
        Self {
            config,
            components,
            ledger: RwLock::new(DedupLedger::new()),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn notifier(&self) -> Arc<dyn NotificationSink> {
        Arc::clone(&self.components.notifier)
    }

    /// Whether an item id has been handled during this process lifetime
    pub async fn has_seen(&self, id: &str) -> bool {
        self.ledger.read().await.has_seen(id)
    }

    /// Open feed and publisher sessions, in that order
    ///
    /// A failure is notified before it is returned; callers treat it as fatal.
    pub async fn open_sessions(&self) -> std::result::Result<(), InitError> {
        let opened = match self.components.feed.open().await {
            Ok(()) => self.components.publisher.open().await,
            Err(e) => Err(e),
        };

        if let Err(e) = &opened {
            tracing::error!(error = %e, "Initialization failed");
            self.components
                .notifier
                .notify(NoticeKind::Error, &format!("Initialization failed: {e}"))
                .await;
        }
        opened
    }

    /// Release feed and publisher sessions
    pub async fn close_sessions(&self) {
        self.components.feed.close().await;
        self.components.publisher.close().await;
        tracing::info!("Sessions released");
    }

    /// Process every active source once
    ///
    /// Never fails: per-source and per-item errors are logged, notified and
    /// recorded in the returned outcomes.
    pub async fn run_once(&self, sources: &[Source]) -> Vec<RunOutcome> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("run", run_id = %run_id);

        async {
            let _timer = metrics::start_run_timer();
            metrics::record_run_started();

            let active: Vec<&Source> = sources.iter().filter(|s| s.active).collect();
            tracing::info!(sources = active.len(), "Starting run");

            let mut outcomes = Vec::with_capacity(active.len());
            for source in active {
                outcomes.push(self.run_source(source).await);
            }

            let published: usize = outcomes.iter().map(|o| o.published).sum();
            let failed: usize = outcomes.iter().map(|o| o.failed).sum();
            tracing::info!(published, failed, "Run completed");
            outcomes
        }
        .instrument(span)
        .await
    }

    /// Source boundary: nothing below escapes as an error
    async fn run_source(&self, source: &Source) -> RunOutcome {
        let mut outcome = RunOutcome::new(&source.id);

        if let Err(e) = self.process_source(source, &mut outcome).await {
            outcome.status = match &e {
                Error::Fetch(fetch) => {
                    metrics::record_fetch_failure(&source.id);
                    SourceStatus::FetchFailed(fetch.to_string())
                }
                other => SourceStatus::Aborted(other.to_string()),
            };
            tracing::error!(
                source = %source.id,
                error = %e,
                category = %e.category(),
                recoverable = e.is_recoverable(),
                "Error processing source"
            );
            self.components
                .notifier
                .notify(
                    NoticeKind::Error,
                    &format!("Error processing {}: {e}", source.handle()),
                )
                .await;
        }

        tracing::debug!(summary = %outcome.summary(), "Source finished");
        outcome
    }

    async fn process_source(&self, source: &Source, outcome: &mut RunOutcome) -> Result<()> {
        tracing::info!(source = %source.id, "Fetching latest items");
        let items = self
            .components
            .feed
            .fetch_latest(&source.id, self.config.fetch_count)
            .await?;

        outcome.seen = items.len();
        metrics::record_items_seen(&source.id, items.len());

        if items.is_empty() {
            tracing::info!(source = %source.id, "No items found");
            outcome.status = SourceStatus::Empty;
            return Ok(());
        }

        for item in &items {
            self.process_item(source, item, outcome).await?;
        }

        outcome.status = SourceStatus::Completed;
        Ok(())
    }

    async fn process_item(
        &self,
        source: &Source,
        item: &RawItem,
        outcome: &mut RunOutcome,
    ) -> Result<()> {
        if self.has_seen(&item.id).await {
            tracing::debug!(source = %source.id, item_id = %item.id, "Already handled, skipping");
            outcome.skipped_duplicate += 1;
            metrics::record_skipped(&source.id, SkipReason::Duplicate);
            return Ok(());
        }

        tracing::debug!(item_id = %item.id, text = %preview(&item.text), "Analyzing item");

        if !self.is_relevant(&item.text).await {
            tracing::debug!(source = %source.id, item_id = %item.id, "Not relevant, skipping");
            self.mark_seen(&item.id).await;
            outcome.skipped_irrelevant += 1;
            metrics::record_skipped(&source.id, SkipReason::Irrelevant);
            return Ok(());
        }

        let completion = self.has_completion_signal(&item.text).await;
        let rewritten = self
            .components
            .rewriter
            .rewrite(&item.text, &source.id, completion)
            .await;
        let text = formatter::build_payload(&rewritten, source);

        match self.components.publisher.publish(&text).await {
            Ok(()) => {
                self.mark_seen(&item.id).await;
                outcome.published += 1;
                metrics::record_published(&source.id);
                tracing::info!(
                    source = %source.id,
                    item_id = %item.id,
                    completion,
                    "Published item"
                );
                tokio::time::sleep(self.config.cooldown()).await;
            }
            Err(PublishError::SessionClosed) => {
                outcome.failed += 1;
                metrics::record_publish_failure(&source.id);
                return Err(Error::Publish(PublishError::SessionClosed));
            }
            Err(e) => {
                outcome.failed += 1;
                metrics::record_publish_failure(&source.id);
                tracing::error!(
                    source = %source.id,
                    item_id = %item.id,
                    error = %e,
                    recoverable = e.is_recoverable(),
                    "Failed to publish item"
                );
                self.components
                    .notifier
                    .notify(
                        NoticeKind::Error,
                        &format!(
                            "Failed to publish item {} from {}: {e}",
                            item.id,
                            source.handle()
                        ),
                    )
                    .await;
            }
        }
        Ok(())
    }

    /// Run classification, rewriting and formatting without publishing
    pub async fn preview(&self, source: &Source, text: &str) -> Preview {
        let relevant = self.is_relevant(text).await;
        let completion = self.has_completion_signal(text).await;

        let text = if relevant {
            let rewritten = self
                .components
                .rewriter
                .rewrite(text, &source.id, completion)
                .await;
            Some(formatter::build_payload(&rewritten, source))
        } else {
            None
        };

        Preview {
            relevant,
            completion,
            text,
        }
    }

    async fn mark_seen(&self, id: &str) {
        self.ledger.write().await.mark_seen(id);
    }

    async fn is_relevant(&self, text: &str) -> bool {
        self.components
            .classifier
            .is_relevant(text)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Relevance check failed, treating as not relevant");
                false
            })
    }

    async fn has_completion_signal(&self, text: &str) -> bool {
        self.components
            .classifier
            .has_completion_signal(text)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Completion check failed, treating as rumour");
                false
            })
    }
}
