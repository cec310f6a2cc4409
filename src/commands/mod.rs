pub mod once;
pub mod preview;
pub mod run;
pub mod sources;

// Re-export command functions for convenience
pub use once::once;
pub use preview::preview;
pub use run::run;
pub use sources::sources;

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use transfer_relay::classifier::KeywordClassifier;
use transfer_relay::config::Config;
use transfer_relay::feed::NitterFeed;
use transfer_relay::metrics;
use transfer_relay::notifications::{NotificationSink, Notifier};
use transfer_relay::pipeline::{Components, Orchestrator};
use transfer_relay::publisher::{ApiPublisher, DryRunPublisher, Publisher};
use transfer_relay::registry::{FileRegistry, SourceRegistry};
use transfer_relay::rewriter::{BannerPolicy, LlmRewriter, LocalRewriter, TextRewriter};

/// Command-line values that take precedence over the loaded config
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub interval_minutes: Option<u64>,
    pub cooldown_secs: Option<u64>,
    pub dry_run: bool,
    pub verbose: bool,
    pub log_format: Option<String>,
}

/// Load config from file or environment, apply overrides and validate
pub fn load_config(path: Option<&Path>, overrides: &Overrides) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)?,
        None => Config::from_env().context("Failed to load configuration from environment")?,
    };

    if let Some(minutes) = overrides.interval_minutes {
        config.scheduler.interval_minutes = minutes;
    }
    if let Some(secs) = overrides.cooldown_secs {
        config.pipeline.cooldown_secs = secs;
    }
    if overrides.dry_run {
        config.publisher.dry_run = true;
    }
    if overrides.verbose {
        config.logging.level = "debug".to_string();
    }
    if let Some(format) = &overrides.log_format {
        config.logging.format = format.clone();
    }

    config.validate()?;
    Ok(config)
}

/// Wired-up pipeline plus the registry it reads from
pub struct Relay {
    pub orchestrator: Arc<Orchestrator>,
    pub notifier: Arc<dyn NotificationSink>,
    pub registry: Arc<dyn SourceRegistry>,
}

/// Which rewriter a command wants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteMode {
    /// Hosted model, falling back to the original text
    Model,
    /// Banner only
    Local,
}

pub fn build_relay(config: &Config, mode: RewriteMode) -> Result<Relay> {
    let feed = NitterFeed::new(&config.feed).context("Failed to create feed client")?;
    let classifier =
        KeywordClassifier::new(&config.classifier).context("Failed to build classifier")?;

    let rewriter: Arc<dyn TextRewriter> = match mode {
        RewriteMode::Model => Arc::new(
            LlmRewriter::new(config.rewriter.clone()).context("Failed to create rewriter")?,
        ),
        RewriteMode::Local => Arc::new(LocalRewriter::new(BannerPolicy::from_config(
            &config.rewriter.banners,
        ))),
    };

    let publisher: Arc<dyn Publisher> = if config.publisher.dry_run {
        tracing::info!("Dry run: posts will be logged, not published");
        Arc::new(DryRunPublisher::new())
    } else {
        Arc::new(
            ApiPublisher::new(config.publisher.clone()).context("Failed to create publisher")?,
        )
    };

    let notifier: Arc<dyn NotificationSink> = Arc::new(
        Notifier::from_config(&config.notifications).context("Invalid notification config")?,
    );

    let components = Components {
        feed: Arc::new(feed),
        classifier: Arc::new(classifier),
        rewriter,
        publisher,
        notifier: Arc::clone(&notifier),
    };

    Ok(Relay {
        orchestrator: Arc::new(Orchestrator::new(config.pipeline.clone(), components)),
        notifier,
        registry: Arc::new(FileRegistry::new(&config.registry.path)),
    })
}

/// Print the Prometheus text exposition to stdout
pub fn print_metrics() {
    match metrics::encode_metrics() {
        Ok(text) => {
            println!("\nMetrics");
            println!("=======");
            print!("{text}");
        }
        Err(e) => tracing::warn!(error = %e, "Failed to encode metrics"),
    }
}

/// Resolves on Ctrl+C, or SIGTERM on unix
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to wait for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
