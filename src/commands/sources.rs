use anyhow::{Context, Result};

use transfer_relay::config::Config;
use transfer_relay::formatter;
use transfer_relay::registry::{FileRegistry, SourceRegistry};

pub async fn sources(config: Config, all: bool) -> Result<()> {
    let registry = FileRegistry::new(&config.registry.path);
    let sources = if all {
        registry.load().await
    } else {
        registry.load_active().await
    }
    .context("Failed to load source registry")?;

    println!("Source Registry: {}", registry.path().display());
    println!("================");

    if sources.is_empty() {
        println!("No sources.");
        return Ok(());
    }

    for source in &sources {
        let status = if source.active { "" } else { " (inactive)" };
        println!(
            "  {} {:<20} {:>3}%  {}{}",
            source.tier.glyph(),
            source.handle(),
            source.reliability,
            formatter::reliability_descriptor(source.reliability),
            status
        );
        if source.name != source.id {
            println!("      {}", source.name);
        }
    }

    println!("\nTotal: {}", sources.len());
    Ok(())
}
