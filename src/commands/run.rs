use anyhow::{Context, Result};

use transfer_relay::config::Config;
use transfer_relay::metrics;
use transfer_relay::notifications::NoticeKind;
use transfer_relay::registry::load_startup_snapshot;
use transfer_relay::scheduler::Scheduler;

use super::{build_relay, print_metrics, shutdown_signal, RewriteMode};

pub async fn run(config: Config, show_metrics: bool) -> Result<()> {
    println!("Starting Transfer Relay");
    println!("=======================");

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Failed to register metrics");
    }

    let relay = build_relay(&config, RewriteMode::Model)?;

    // Later reload failures fall back to this snapshot
    let sources = load_startup_snapshot(relay.registry.as_ref(), relay.notifier.as_ref())
        .await
        .context("Failed to load source registry")?;
    let active = sources.iter().filter(|s| s.active).count();
    println!("Sources: {} ({} active)", sources.len(), active);
    println!("Interval: {} min", config.scheduler.interval_minutes);
    println!("Cool-down: {} s", config.pipeline.cooldown_secs);
    if config.publisher.dry_run {
        println!("Mode: dry run");
    }
    println!();

    if let Err(e) = relay.orchestrator.open_sessions().await {
        relay.orchestrator.close_sessions().await;
        return Err(e.into());
    }

    relay
        .notifier
        .notify(
            NoticeKind::Info,
            &format!("Transfer relay started, monitoring {active} sources"),
        )
        .await;

    let scheduler = Scheduler::new(relay.orchestrator.clone(), relay.registry.clone())
        .with_snapshot(sources);

    let result = tokio::select! {
        result = scheduler.start(config.scheduler.interval_minutes) => result,
        _ = shutdown_signal() => {
            println!("\nShutdown signal received, stopping...");
            scheduler.stop();
            Ok(())
        }
    };

    relay.orchestrator.close_sessions().await;
    println!(
        "Runs completed: {}, triggers skipped: {}",
        scheduler.runs_completed(),
        scheduler.runs_skipped()
    );

    if show_metrics {
        print_metrics();
    }

    result.context("Scheduler failed")
}
