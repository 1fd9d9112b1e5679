use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::cursor::CursorStore;
use crate::filter::ContentFilter;
use crate::platform::MessageSink;
use crate::source::{Channel, MessageSource, SourceError};

/// Everything a watcher needs, shared by all channels
#[derive(Clone)]
pub struct WatcherContext {
    pub source: Arc<dyn MessageSource>,
    pub sink: Arc<dyn MessageSink>,
    pub cursors: CursorStore,
    pub filter: Arc<ContentFilter>,
    pub interval: Duration,
}

/// What a single poll did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// A new message was forwarded (or the attempt failed) and the cursor moved
    Forwarded { id: String },
    /// A new message filtered down to nothing; the cursor moved without a send
    Skipped { id: String },
    Unchanged,
    Empty,
    Failed,
}

/// Polls one channel and relays its newest message whenever it changes
pub struct ChannelWatcher {
    channel: Channel,
    ctx: WatcherContext,
    last_seen: Option<String>,
    reported_idle: bool,
}

impl ChannelWatcher {
    /// Create a watcher, restoring the channel's cursor from disk.
    pub async fn load(channel: Channel, ctx: WatcherContext) -> Self {
        let last_seen = ctx.cursors.load(&channel.id).await;
        if let Some(id) = &last_seen {
            debug!("Resuming channel {} after message {}", channel.name, id);
        }
        Self {
            channel,
            ctx,
            last_seen,
            reported_idle: false,
        }
    }

    pub fn last_seen(&self) -> Option<&str> {
        self.last_seen.as_deref()
    }

    pub async fn poll_once(&mut self) -> PollOutcome {
        let messages = match self.ctx.source.latest_messages(&self.channel.id).await {
            Ok(messages) => messages,
            Err(SourceError::RateLimited) => {
                warn!(
                    "Rate limited in channel {}, waiting before retrying...",
                    self.channel.name
                );
                return PollOutcome::Failed;
            }
            Err(e) => {
                error!(
                    "Unable to retrieve messages for channel {}: {}",
                    self.channel.name, e
                );
                return PollOutcome::Failed;
            }
        };

        let Some(newest) = messages.first() else {
            debug!("Channel {} returned no messages", self.channel.name);
            return PollOutcome::Empty;
        };

        if self.last_seen.as_deref() == Some(newest.id.as_str()) {
            if !self.reported_idle {
                info!("No new messages in channel {}.", self.channel.name);
                self.reported_idle = true;
            }
            return PollOutcome::Unchanged;
        }
        self.reported_idle = true;

        let content = self.ctx.filter.apply(&newest.content);
        if content != newest.content.trim() {
            debug!("Removed filtered words from content.");
        }

        info!(
            "New message from {} in channel {}",
            newest.author_name(),
            self.channel.name
        );
        info!("{}", content);

        let id = newest.id.clone();
        let forwarded = if content.is_empty() {
            info!(
                "Message {} in channel {} is empty after filtering, not forwarding",
                id, self.channel.name
            );
            false
        } else {
            match self.ctx.sink.forward(&content).await {
                Ok(()) => info!("Message forwarded to Telegram successfully."),
                Err(e) => error!("{:#}", e),
            }
            true
        };

        // The forward attempt comes first; a crash before this line re-forwards on restart.
        if let Err(e) = self.ctx.cursors.save(&self.channel.id, Some(&id)).await {
            error!(
                "Failed to persist cursor for channel {}: {:#}",
                self.channel.name, e
            );
        }
        self.last_seen = Some(id.clone());

        if forwarded {
            PollOutcome::Forwarded { id }
        } else {
            PollOutcome::Skipped { id }
        }
    }

    /// Poll until `cancel` fires. Cancellation is only observed between polls.
    pub async fn run(mut self, cancel: CancellationToken) {
        info!(
            "Monitoring for new messages in channel {} (ID: {}, last seen: {})...",
            self.channel.name,
            self.channel.id,
            self.last_seen().unwrap_or("none")
        );

        loop {
            self.poll_once().await;

            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.ctx.interval) => {}
            }
        }

        info!("Stopped monitoring channel {}", self.channel.name);
    }
}
