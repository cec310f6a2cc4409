//! Periodic, non-overlapping pipeline scheduling
//!
//! [`Scheduler::start`] runs the pipeline once immediately and then on a
//! fixed interval until [`Scheduler::stop`] is called. At most one run is in
//! flight at any time: a tick that fires while a run is executing is dropped,
//! not queued, and the next chance is the following tick.
//!
//! Each run receives a fresh snapshot of the source registry. When the
//! registry cannot be read, the last good snapshot is reused and the failure
//! is notified.

mod error;
mod trigger;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{watch, RwLock};
use tokio::time::MissedTickBehavior;

use crate::metrics;
use crate::models::Source;
use crate::notifications::NoticeKind;
use crate::pipeline::Orchestrator;
use crate::registry::SourceRegistry;

pub use error::{SchedulerError, SchedulerResult};
pub use trigger::TriggerOutcome;

use trigger::InFlightGuard;

/// Longest accepted run interval (one week)
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Drives orchestrator runs on a timer
pub struct Scheduler {
    orchestrator: Arc<Orchestrator>,
    registry: Arc<dyn SourceRegistry>,

    /// Last successfully loaded registry snapshot
    snapshot: RwLock<Vec<Source>>,

    in_flight: AtomicBool,
    loop_running: AtomicBool,

    runs_completed: AtomicU64,
    runs_skipped: AtomicU64,

    shutdown: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Scheduler {
    pub fn new(orchestrator: Arc<Orchestrator>, registry: Arc<dyn SourceRegistry>) -> Self {
        let (shutdown, shutdown_rx) = watch::channel(false);

        Self {
            orchestrator,
            registry,
            snapshot: RwLock::new(Vec::new()),
            in_flight: AtomicBool::new(false),
            loop_running: AtomicBool::new(false),
            runs_completed: AtomicU64::new(0),
            runs_skipped: AtomicU64::new(0),
            shutdown,
            shutdown_rx,
        }
    }

    /// Seed the fallback snapshot used when the registry cannot be read
    pub fn with_snapshot(mut self, sources: Vec<Source>) -> Self {
        self.snapshot = RwLock::new(sources);
        self
    }

    pub fn orchestrator(&self) -> &Arc<Orchestrator> {
        &self.orchestrator
    }

    /// Whether a run is executing right now
    pub fn is_run_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn runs_completed(&self) -> u64 {
        self.runs_completed.load(Ordering::Relaxed)
    }

    /// Triggers dropped because a run was in flight
    pub fn runs_skipped(&self) -> u64 {
        self.runs_skipped.load(Ordering::Relaxed)
    }

    /// Run the pipeline now unless a run is already in flight
    pub async fn trigger(&self) -> TriggerOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            self.record_skip();
            return TriggerOutcome::Skipped;
        };

        let sources = self.refresh_snapshot().await;
        let outcomes = self.orchestrator.run_once(&sources).await;
        self.runs_completed.fetch_add(1, Ordering::Relaxed);

        for outcome in outcomes.iter().filter(|o| o.status.is_failure()) {
            tracing::warn!(summary = %outcome.summary(), "Source failed this run");
        }

        TriggerOutcome::Completed(outcomes)
    }

    /// Run immediately, then every `interval_minutes` until stopped
    pub async fn start(&self, interval_minutes: u64) -> SchedulerResult<()> {
        if !(1..=MAX_INTERVAL_MINUTES).contains(&interval_minutes) {
            return Err(SchedulerError::invalid_interval(interval_minutes));
        }
        let secs = interval_minutes
            .checked_mul(60)
            .ok_or(SchedulerError::invalid_interval(interval_minutes))?;

        tracing::info!(interval_minutes, "Scheduler started");
        self.run_every(Duration::from_secs(secs)).await
    }

    /// Run immediately, then every `period` until stopped
    pub async fn run_every(&self, period: Duration) -> SchedulerResult<()> {
        if period.is_zero() {
            return Err(SchedulerError::trigger_config("period", "must be non-zero"));
        }
        if self.loop_running.swap(true, Ordering::AcqRel) {
            return Err(SchedulerError::AlreadyStarted);
        }

        let mut shutdown_rx = self.shutdown_rx.clone();
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        while !*shutdown_rx.borrow() {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown_rx.changed() => break,
            }

            tracing::info!("Scheduled check triggered");
            let run = self.trigger();
            tokio::pin!(run);

            // Keep the ticker polled during the run so overlapping ticks are
            // observed and dropped.
            loop {
                tokio::select! {
                    outcome = &mut run => {
                        if outcome.is_skipped() {
                            tracing::warn!("Run already in flight, trigger dropped");
                        }
                        break;
                    }
                    _ = ticker.tick() => {
                        tracing::warn!("Previous run still in progress, skipping trigger");
                        self.record_skip();
                    }
                }
            }
        }

        self.loop_running.store(false, Ordering::Release);
        tracing::info!("Scheduler stopped");
        Ok(())
    }

    /// Stop issuing new triggers. An in-flight run is allowed to finish.
    pub fn stop(&self) {
        let _ = self.shutdown.send(true);
    }

    fn record_skip(&self) {
        self.runs_skipped.fetch_add(1, Ordering::Relaxed);
        metrics::record_run_skipped();
    }

    async fn refresh_snapshot(&self) -> Vec<Source> {
        match self.registry.load().await {
            Ok(sources) => {
                let active = sources.iter().filter(|s| s.active).count();
                tracing::info!(total = sources.len(), active, "Loaded source registry");
                *self.snapshot.write().await = sources.clone();
                sources
            }
            Err(e) => {
                let snapshot = self.snapshot.read().await.clone();
                tracing::error!(
                    error = %e,
                    fallback = snapshot.len(),
                    "Failed to reload registry, using last good snapshot"
                );
                self.orchestrator
                    .notifier()
                    .notify(
                        NoticeKind::Warning,
                        &format!(
                            "Failed to reload source registry: {e}. Using last good snapshot ({} sources)",
                            snapshot.len()
                        ),
                    )
                    .await;
                snapshot
            }
        }
    }
}
