use std::future::Future;

use anyhow::{Context, Result};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::source::Channel;
use crate::watcher::{ChannelWatcher, WatcherContext};

/// Starts and supervises one watcher per channel
pub struct Relay {
    ctx: WatcherContext,
}

impl Relay {
    pub fn new(ctx: WatcherContext) -> Self {
        Self { ctx }
    }

    /// Check the source credential; returns the account's username.
    pub async fn verify_identity(&self) -> Result<String> {
        let username = self
            .ctx
            .source
            .current_user()
            .await
            .context("Could not verify token")?;
        info!("Token is valid. Username: {}", username);
        Ok(username)
    }

    /// Look up display names. Channels that fail to resolve are skipped.
    pub async fn resolve_channels(&self, channel_ids: &[String]) -> Vec<Channel> {
        let mut channels = Vec::new();

        for id in channel_ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
            info!("Getting channel information for channel {}...", id);
            match self.ctx.source.channel_name(id).await {
                Ok(name) => {
                    info!("Monitoring channel: {} (ID: {})", name, id);
                    channels.push(Channel {
                        id: id.to_string(),
                        name,
                    });
                }
                Err(e) => {
                    error!(
                        "Skipping channel {} due to failure in retrieving channel name: {}",
                        id, e
                    );
                }
            }
        }

        channels
    }

    /// Verify the credential, start a watcher per resolvable channel and
    /// run until `shutdown` completes.
    pub async fn run<F>(self, channel_ids: &[String], shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.verify_identity().await?;

        let channels = self.resolve_channels(channel_ids).await;
        if channels.is_empty() {
            anyhow::bail!("None of the {} configured channel(s) could be resolved", channel_ids.len());
        }

        let cancel = CancellationToken::new();
        let mut watchers = JoinSet::new();

        for channel in channels {
            info!(
                "Starting monitoring for channel {} (ID: {})",
                channel.name, channel.id
            );
            let watcher = ChannelWatcher::load(channel, self.ctx.clone()).await;
            watchers.spawn(watcher.run(cancel.child_token()));
        }

        shutdown.await;
        info!("Shutting down...");
        cancel.cancel();

        while let Some(result) = watchers.join_next().await {
            if let Err(e) = result {
                warn!("Watcher task ended abnormally: {}", e);
            }
        }

        Ok(())
    }
}
