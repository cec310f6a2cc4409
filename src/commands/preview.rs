use anyhow::Result;

use transfer_relay::config::Config;

use super::{build_relay, RewriteMode};

pub async fn preview(config: Config, source_id: &str, text: &str, rewrite: bool) -> Result<()> {
    let mode = if rewrite {
        RewriteMode::Model
    } else {
        RewriteMode::Local
    };
    let relay = build_relay(&config, mode)?;

    let source = relay
        .registry
        .load()
        .await?
        .into_iter()
        .find(|s| s.id.eq_ignore_ascii_case(source_id.trim_start_matches('@')))
        .ok_or_else(|| anyhow::anyhow!("Source not in registry: {source_id}"))?;

    let preview = relay.orchestrator.preview(&source, text).await;

    println!("Preview for {}", source.handle());
    println!("================");
    println!("Relevant:   {}", preview.relevant);
    println!("Completion: {}", preview.completion);

    match preview.text {
        Some(post) => println!("\n{post}"),
        None => println!("\nNot transfer news; nothing would be published."),
    }

    Ok(())
}
