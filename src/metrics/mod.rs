//! Prometheus metrics for the relay loop
//!
//! Call `init_metrics()` once at startup. If registration fails, every
//! recording function becomes a no-op.

use prometheus::{
    register_counter, register_counter_vec, register_gauge, register_histogram, Counter,
    CounterVec, Encoder, Gauge, Histogram, TextEncoder,
};
use std::sync::OnceLock;

// ============================================================================
// Metrics Storage
// ============================================================================

struct RelayMetrics {
    items_seen: CounterVec,
    items_published: CounterVec,
    publish_failures: CounterVec,
    items_skipped: CounterVec,
    fetch_failures: CounterVec,
    runs_started: Counter,
    runs_skipped: Counter,
    run_in_flight: Gauge,
    run_duration: Histogram,
}

static RELAY_METRICS: OnceLock<RelayMetrics> = OnceLock::new();

static METRICS_INIT_ATTEMPTED: OnceLock<bool> = OnceLock::new();

/// Why an item was skipped before publishing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Duplicate,
    Irrelevant,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Duplicate => "duplicate",
            Self::Irrelevant => "irrelevant",
        }
    }
}

// ============================================================================
// Initialization
// ============================================================================

/// Register all relay metrics with the default registry
///
/// Idempotent; a second call returns `Ok(())` without registering again.
pub fn init_metrics() -> Result<(), Box<dyn std::error::Error>> {
    if METRICS_INIT_ATTEMPTED.get().is_some() {
        return Ok(());
    }
    METRICS_INIT_ATTEMPTED.set(true).ok();

    let metrics = RelayMetrics {
        items_seen: register_counter_vec!(
            "relay_items_seen_total",
            "Items returned by the source feed",
            &["source"]
        )?,
        items_published: register_counter_vec!(
            "relay_items_published_total",
            "Items published successfully",
            &["source"]
        )?,
        publish_failures: register_counter_vec!(
            "relay_publish_failures_total",
            "Failed publish attempts",
            &["source"]
        )?,
        items_skipped: register_counter_vec!(
            "relay_items_skipped_total",
            "Items skipped before publishing",
            &["source", "reason"]
        )?,
        fetch_failures: register_counter_vec!(
            "relay_fetch_failures_total",
            "Failed timeline fetches",
            &["source"]
        )?,
        runs_started: register_counter!("relay_runs_started_total", "Pipeline runs started")?,
        runs_skipped: register_counter!(
            "relay_runs_skipped_total",
            "Scheduled triggers dropped because a run was in flight"
        )?,
        run_in_flight: register_gauge!(
            "relay_run_in_flight",
            "Whether a pipeline run is executing (1 = yes, 0 = no)"
        )?,
        run_duration: register_histogram!(
            "relay_run_duration_seconds",
            "Duration of a full pipeline run in seconds",
            vec![1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0, 1800.0]
        )?,
    };

    RELAY_METRICS
        .set(metrics)
        .map_err(|_| "Relay metrics already initialized")?;

    tracing::info!("Prometheus metrics initialized successfully");
    Ok(())
}

pub fn metrics_initialized() -> bool {
    RELAY_METRICS.get().is_some()
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Encode all metrics to Prometheus text format
pub fn encode_metrics() -> Result<String, Box<dyn std::error::Error>> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}

pub fn record_items_seen(source: &str, count: usize) {
    if let Some(m) = RELAY_METRICS.get() {
        if count > 0 {
            m.items_seen.with_label_values(&[source]).inc_by(count as f64);
        }
    }
}

pub fn record_published(source: &str) {
    if let Some(m) = RELAY_METRICS.get() {
        m.items_published.with_label_values(&[source]).inc();
    }
}

pub fn record_publish_failure(source: &str) {
    if let Some(m) = RELAY_METRICS.get() {
        m.publish_failures.with_label_values(&[source]).inc();
    }
}

pub fn record_skipped(source: &str, reason: SkipReason) {
    if let Some(m) = RELAY_METRICS.get() {
        m.items_skipped
            .with_label_values(&[source, reason.as_str()])
            .inc();
    }
}

pub fn record_fetch_failure(source: &str) {
    if let Some(m) = RELAY_METRICS.get() {
        m.fetch_failures.with_label_values(&[source]).inc();
    }
}

pub fn record_run_started() {
    if let Some(m) = RELAY_METRICS.get() {
        m.runs_started.inc();
    }
}

pub fn record_run_skipped() {
    if let Some(m) = RELAY_METRICS.get() {
        m.runs_skipped.inc();
    }
}

pub fn set_run_in_flight(in_flight: bool) {
    if let Some(m) = RELAY_METRICS.get() {
        m.run_in_flight.set(if in_flight { 1.0 } else { 0.0 });
    }
}

/// Histogram timer guard that records duration on drop
pub struct MetricsTimer {
    timer: Option<prometheus::HistogramTimer>,
}

impl MetricsTimer {
    fn noop() -> Self {
        Self { timer: None }
    }
}

impl Drop for MetricsTimer {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.observe_duration();
        }
    }
}

/// Start timing a pipeline run
pub fn start_run_timer() -> MetricsTimer {
    match RELAY_METRICS.get() {
        Some(m) => MetricsTimer {
            timer: Some(m.run_duration.start_timer()),
        },
        None => MetricsTimer::noop(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ensure_metrics_initialized() {
        let _ = init_metrics();
    }

    #[test]
    fn test_init_metrics_is_idempotent() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_recording_shows_in_output() {
        ensure_metrics_initialized();
        assert!(metrics_initialized());

        record_items_seen("FabrizioRomano", 5);
        record_published("FabrizioRomano");
        record_publish_failure("FabrizioRomano");
        record_skipped("FabrizioRomano", SkipReason::Duplicate);
        record_skipped("FabrizioRomano", SkipReason::Irrelevant);
        record_fetch_failure("ghost");
        record_run_started();
        record_run_skipped();
        set_run_in_flight(true);
        set_run_in_flight(false);
        drop(start_run_timer());

        let text = encode_metrics().unwrap();
        assert!(text.contains("relay_items_published_total"));
        assert!(text.contains("reason=\"irrelevant\""));
    }

    #[test]
    fn test_skip_reason_labels() {
        assert_eq!(SkipReason::Duplicate.as_str(), "duplicate");
        assert_eq!(SkipReason::Irrelevant.as_str(), "irrelevant");
    }
}
