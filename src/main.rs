mod config;
mod cursor;
mod filter;
mod platform;
mod relay;
mod source;
mod watcher;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::cursor::CursorStore;
use crate::filter::ContentFilter;
use crate::platform::telegram::TelegramSink;
use crate::relay::Relay;
use crate::source::discord::DiscordClient;
use crate::watcher::WatcherContext;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,discord_relay=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // An explicit path must exist; the default one is optional
    let (config_path, required) = match std::env::args().nth(1) {
        Some(path) => (PathBuf::from(path), true),
        None => (PathBuf::from("config.toml"), false),
    };

    let config = Config::load(&config_path, required)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;

    info!("Configuration loaded successfully");
    info!("  Channels: {:?}", config.discord.channel_ids);
    info!("  Poll interval: {:?}", config.poll_interval());
    info!("  State directory: {}", config.relay.state_dir.display());
    info!("  Filter words: {:?}", config.relay.filter_words);

    let source = DiscordClient::new(
        &config.discord.api_base,
        &config.discord.token,
        config.request_timeout(),
    )?;
    let sink = TelegramSink::new(
        &config.telegram.bot_token,
        &config.telegram.chat_id,
        config.telegram.api_url.as_deref(),
        config.request_timeout(),
    )?;
    let filter = ContentFilter::new(&config.relay.filter_words)?;

    let relay = Relay::new(WatcherContext {
        source: Arc::new(source),
        sink: Arc::new(sink),
        cursors: CursorStore::new(&config.relay.state_dir),
        filter: Arc::new(filter),
        interval: config.poll_interval(),
    });

    info!("Relay is starting...");
    relay
        .run(&config.discord.channel_ids, shutdown_signal())
        .await?;

    Ok(())
}
