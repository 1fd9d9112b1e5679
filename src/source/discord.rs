use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, info};

use super::{Message, MessageSource, SourceError};

#[derive(Debug, Deserialize)]
struct CurrentUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct ChannelInfo {
    #[serde(default)]
    name: Option<String>,
}

/// Discord REST client authenticated with a single token
pub struct DiscordClient {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl DiscordClient {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, SourceError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.token)
            .send()
            .await
            .map_err(SourceError::Transport)?;

        match response.status() {
            StatusCode::OK => response
                .json::<T>()
                .await
                .map_err(|e| SourceError::Invalid(format!("malformed response body: {}", e))),
            StatusCode::FORBIDDEN => Err(SourceError::AccessLocked),
            StatusCode::TOO_MANY_REQUESTS => Err(SourceError::RateLimited),
            status => Err(SourceError::Invalid(format!("unexpected status {}", status))),
        }
    }
}

#[async_trait]
impl MessageSource for DiscordClient {
    async fn current_user(&self) -> Result<String, SourceError> {
        info!("Checking token validity...");
        let user: CurrentUser = self.get("/users/@me").await?;
        Ok(user.username)
    }

    async fn channel_name(&self, channel_id: &str) -> Result<String, SourceError> {
        let channel: ChannelInfo = self.get(&format!("/channels/{}", channel_id)).await?;
        channel
            .name
            .ok_or_else(|| SourceError::Invalid(format!("channel {} has no name", channel_id)))
    }

    async fn latest_messages(&self, channel_id: &str) -> Result<Vec<Message>, SourceError> {
        self.get(&format!("/channels/{}/messages", channel_id)).await
    }
}
