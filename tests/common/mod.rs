//! Common test utilities

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use transfer_relay::classifier::ContentClassifier;
use transfer_relay::error::{ClassifyError, FetchError, InitError, PublishError};
use transfer_relay::feed::SourceFeed;
use transfer_relay::models::{RawItem, Source, TrustTier};
use transfer_relay::notifications::{NoticeKind, NotificationSink};
use transfer_relay::pipeline::{Components, Orchestrator, PipelineConfig};
use transfer_relay::publisher::Publisher;
use transfer_relay::rewriter::{BannerPolicy, LocalRewriter, TextRewriter};

/// Create an active source
pub fn source(id: &str, tier: TrustTier, reliability: u8) -> Source {
    Source::new(id, tier, reliability)
}

/// Create a raw item for a source
pub fn item(id: &str, text: &str, source_id: &str) -> RawItem {
    RawItem::new(id, text, source_id)
}

enum Script {
    Items(Vec<RawItem>),
    Fail,
}

/// Feed returning canned items per source, or failing for chosen sources
#[derive(Default)]
pub struct ScriptedFeed {
    scripts: Mutex<HashMap<String, Script>>,
    fetched: Mutex<Vec<String>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
    fail_open: AtomicBool,
    delay: Mutex<Option<Duration>>,
}

impl ScriptedFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_items(self, source_id: &str, items: Vec<RawItem>) -> Self {
        self.set_items(source_id, items);
        self
    }

    pub fn with_failure(self, source_id: &str) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(source_id.to_string(), Script::Fail);
        self
    }

    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    pub fn failing_open(self) -> Self {
        self.fail_open.store(true, Ordering::SeqCst);
        self
    }

    pub fn set_items(&self, source_id: &str, items: Vec<RawItem>) {
        self.scripts
            .lock()
            .unwrap()
            .insert(source_id.to_string(), Script::Items(items));
    }

    /// Source ids in fetch order
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceFeed for ScriptedFeed {
    async fn open(&self) -> Result<(), InitError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if self.fail_open.load(Ordering::SeqCst) {
            return Err(InitError::Feed("browser unavailable".to_string()));
        }
        Ok(())
    }

    async fn fetch_latest(&self, source_id: &str, count: usize) -> Result<Vec<RawItem>, FetchError> {
        self.fetched.lock().unwrap().push(source_id.to_string());

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.scripts.lock().unwrap().get(source_id) {
            Some(Script::Items(items)) => Ok(items.iter().take(count).cloned().collect()),
            Some(Script::Fail) => Err(FetchError::ServerError(503)),
            None => Ok(Vec::new()),
        }
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Classifier with fixed answers
pub struct FixedClassifier {
    pub relevant: bool,
    pub completion: bool,
}

impl FixedClassifier {
    pub fn new(relevant: bool, completion: bool) -> Self {
        Self {
            relevant,
            completion,
        }
    }
}

#[async_trait]
impl ContentClassifier for FixedClassifier {
    async fn is_relevant(&self, _text: &str) -> Result<bool, ClassifyError> {
        Ok(self.relevant)
    }

    async fn has_completion_signal(&self, _text: &str) -> Result<bool, ClassifyError> {
        Ok(self.completion)
    }
}

/// Publisher recording every call with the instant it was made
#[derive(Default)]
pub struct RecordingPublisher {
    calls: Mutex<Vec<(String, Instant)>>,
    fail_next: AtomicUsize,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `n` publish calls
    pub fn fail_next(&self, n: usize) {
        self.fail_next.store(n, Ordering::SeqCst);
    }

    pub fn texts(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(text, _)| text.clone())
            .collect()
    }

    pub fn instants(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(_, at)| *at).collect()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn open(&self) -> Result<(), InitError> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn publish(&self, text: &str) -> Result<(), PublishError> {
        self.calls
            .lock()
            .unwrap()
            .push((text.to_string(), Instant::now()));

        let remaining = self.fail_next.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_next.store(remaining - 1, Ordering::SeqCst);
            return Err(PublishError::RateLimited);
        }
        Ok(())
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Sink keeping every notice
#[derive(Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<(NoticeKind, String)>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notices(&self) -> Vec<(NoticeKind, String)> {
        self.notices.lock().unwrap().clone()
    }

    pub fn of_kind(&self, kind: NoticeKind) -> Vec<String> {
        self.notices()
            .into_iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, message)| message)
            .collect()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn notify(&self, kind: NoticeKind, message: &str) {
        self.notices
            .lock()
            .unwrap()
            .push((kind, message.to_string()));
    }
}

/// Banner-only rewriter that counts its calls
pub struct CountingRewriter {
    inner: LocalRewriter,
    calls: AtomicUsize,
}

impl CountingRewriter {
    pub fn new(policy: BannerPolicy) -> Self {
        Self {
            inner: LocalRewriter::new(policy),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextRewriter for CountingRewriter {
    async fn rewrite(&self, text: &str, source_id: &str, completion: bool) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.rewrite(text, source_id, completion).await
    }
}

/// Orchestrator over test doubles, with a banner-only rewriter
pub struct Harness {
    pub feed: Arc<ScriptedFeed>,
    pub rewriter: Arc<CountingRewriter>,
    pub publisher: Arc<RecordingPublisher>,
    pub sink: Arc<RecordingSink>,
    pub orchestrator: Arc<Orchestrator>,
}

impl Harness {
    pub fn new(feed: ScriptedFeed, classifier: FixedClassifier, cooldown_secs: u64) -> Self {
        let feed = Arc::new(feed);
        let rewriter = Arc::new(CountingRewriter::new(BannerPolicy::new(["FabrizioRomano"])));
        let publisher = Arc::new(RecordingPublisher::new());
        let sink = Arc::new(RecordingSink::new());

        let components = Components {
            feed: feed.clone(),
            classifier: Arc::new(classifier),
            rewriter: rewriter.clone(),
            publisher: publisher.clone(),
            notifier: sink.clone(),
        };
        let config = PipelineConfig {
            cooldown_secs,
            fetch_count: 5,
        };

        Self {
            feed,
            rewriter,
            publisher,
            sink,
            orchestrator: Arc::new(Orchestrator::new(config, components)),
        }
    }
}
