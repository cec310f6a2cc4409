use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::Overrides;
use transfer_relay::config::LoggingConfig;

#[derive(Parser)]
#[command(
    name = "transfer-relay",
    version,
    about = "Relays football transfer news from journalist timelines with a trust footer",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a TOML config file (environment variables are used when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log every post instead of publishing it
    #[arg(long, global = true, default_value = "false")]
    dry_run: bool,

    /// Print Prometheus metrics when the command finishes
    #[arg(long, global = true, default_value = "false")]
    metrics: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log format (text, json); overrides the config file
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run immediately, then on every interval until interrupted
    Run {
        /// Minutes between runs
        #[arg(short, long)]
        interval: Option<u64>,

        /// Seconds to pause after each published post
        #[arg(long)]
        cooldown: Option<u64>,
    },

    /// Perform a single run over all active sources and exit
    Once {
        /// Seconds to pause after each published post
        #[arg(long)]
        cooldown: Option<u64>,
    },

    /// List the sources in the registry
    Sources {
        /// Include inactive sources
        #[arg(short, long, default_value = "false")]
        all: bool,
    },

    /// Show how a text would be classified and formatted for a source
    Preview {
        /// Source handle, as listed in the registry
        #[arg(short, long)]
        source: String,

        /// Text to preview
        text: String,

        /// Call the rewrite model instead of only applying the banner
        #[arg(long, default_value = "false")]
        rewrite: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut overrides = Overrides {
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        log_format: cli.log_format.clone(),
        ..Default::default()
    };
    match &cli.command {
        Commands::Run { interval, cooldown } => {
            overrides.interval_minutes = *interval;
            overrides.cooldown_secs = *cooldown;
        }
        Commands::Once { cooldown } => overrides.cooldown_secs = *cooldown,
        Commands::Sources { .. } | Commands::Preview { .. } => {}
    }

    let config = commands::load_config(cli.config.as_deref(), &overrides)?;

    // Initialize tracing/logging
    setup_tracing(&config.logging, cli.verbose)?;

    tracing::info!("Transfer relay starting");

    match cli.command {
        Commands::Run { .. } => {
            tracing::info!(
                interval_minutes = %config.scheduler.interval_minutes,
                cooldown_secs = %config.pipeline.cooldown_secs,
                dry_run = %config.publisher.dry_run,
                "Starting run command"
            );
            commands::run(config, cli.metrics).await?;
        }

        Commands::Once { .. } => {
            tracing::info!(
                cooldown_secs = %config.pipeline.cooldown_secs,
                dry_run = %config.publisher.dry_run,
                "Starting once command"
            );
            commands::once(config, cli.metrics).await?;
        }

        Commands::Sources { all } => {
            commands::sources(config, all).await?;
        }

        Commands::Preview {
            source,
            text,
            rewrite,
        } => {
            tracing::info!(source = %source, rewrite = %rewrite, "Starting preview command");
            commands::preview(config, &source, &text, rewrite).await?;
        }
    }

    Ok(())
}

/// `--verbose` forces debug and ignores `RUST_LOG`; otherwise `RUST_LOG`
/// wins over the configured level.
fn setup_tracing(logging: &LoggingConfig, verbose: bool) -> Result<()> {
    let env_filter = if verbose {
        tracing_subscriber::EnvFilter::new("transfer_relay=debug,info")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(logging.filter_directive()))
    };

    if logging.is_json() {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }

    Ok(())
}
