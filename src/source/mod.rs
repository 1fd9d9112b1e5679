pub mod discord;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

/// Outcome classes of a source API call that did not yield a payload
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("access is locked (403 Forbidden)")]
    AccessLocked,

    #[error("rate limited (429 Too Many Requests)")]
    RateLimited,

    #[error("invalid token or unexpected response: {0}")]
    Invalid(String),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),
}

/// A channel being watched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    /// Display name, used for logs only
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
}

/// A message as returned by the source platform
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub id: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Author,
}

impl Message {
    /// Author display name: global name, then username, then "Unknown".
    pub fn author_name(&self) -> &str {
        match self.author.global_name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ if !self.author.username.is_empty() => &self.author.username,
            _ => "Unknown",
        }
    }
}

/// Read access to the platform being relayed from
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Validate the credential and return the account's username.
    async fn current_user(&self) -> Result<String, SourceError>;

    async fn channel_name(&self, channel_id: &str) -> Result<String, SourceError>;

    /// Most recent messages of a channel, newest first.
    async fn latest_messages(&self, channel_id: &str) -> Result<Vec<Message>, SourceError>;
}
