pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

/// A destination that relayed text is delivered to
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Deliver `text`. Errors are reported to the caller, never retried here.
    async fn forward(&self, text: &str) -> Result<()>;
}
