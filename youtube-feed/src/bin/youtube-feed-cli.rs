use eyre::Context;
use std::io::IsTerminal;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_feed::{FeedConfig, ResourceClient, load_sections};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let Some(path) = std::env::args_os().nth(1) else {
        eyre::bail!("usage: youtube-feed-cli <config.json>");
    };

    let config = FeedConfig::load(&path).await?;
    let client = ResourceClient::from_config(&config).context("set up YouTube client")?;

    let sections = load_sections(&client, &config).await;
    for section in &sections {
        tracing::info!(kind = %section.kind, items = section.items().len(), failure = ?section.failure(), "loaded section");
    }

    let json = serde_json::to_string_pretty(&sections).context("serialize feed sections")?;
    println!("{json}");

    Ok(())
}
