use anyhow::{Context, Result};

use transfer_relay::config::Config;
use transfer_relay::metrics;
use transfer_relay::models::RunOutcome;
use transfer_relay::registry::load_startup_snapshot;

use super::{build_relay, print_metrics, RewriteMode};

pub async fn once(config: Config, show_metrics: bool) -> Result<()> {
    println!("Single Relay Run");
    println!("================");

    if let Err(e) = metrics::init_metrics() {
        tracing::warn!(error = %e, "Failed to register metrics");
    }

    let relay = build_relay(&config, RewriteMode::Model)?;
    let sources = load_startup_snapshot(relay.registry.as_ref(), relay.notifier.as_ref())
        .await
        .context("Failed to load source registry")?;

    if let Err(e) = relay.orchestrator.open_sessions().await {
        relay.orchestrator.close_sessions().await;
        return Err(e.into());
    }

    let outcomes = relay.orchestrator.run_once(&sources).await;
    relay.orchestrator.close_sessions().await;

    print_outcomes(&outcomes);
    if show_metrics {
        print_metrics();
    }
    Ok(())
}

fn print_outcomes(outcomes: &[RunOutcome]) {
    if outcomes.is_empty() {
        println!("\nNo active sources.");
        return;
    }

    println!(
        "\n{:<20} {:<14} {:>5} {:>5} {:>5} {:>5} {:>5}",
        "SOURCE", "STATUS", "SEEN", "DUP", "SKIP", "PUB", "FAIL"
    );
    println!("{}", "-".repeat(65));

    for outcome in outcomes {
        println!(
            "{:<20} {:<14} {:>5} {:>5} {:>5} {:>5} {:>5}",
            outcome.source_id,
            outcome.status.as_str(),
            outcome.seen,
            outcome.skipped_duplicate,
            outcome.skipped_irrelevant,
            outcome.published,
            outcome.failed
        );
    }

    let published: usize = outcomes.iter().map(|o| o.published).sum();
    let failed = outcomes.iter().filter(|o| o.status.is_failure()).count();
    println!("\nPublished: {published}");
    if failed > 0 {
        println!("Failed sources: {failed}");
        for outcome in outcomes.iter().filter(|o| o.status.is_failure()) {
            println!("  - {}", outcome.summary());
        }
    }
}
