use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::Recipient;
use tracing::{debug, info};

use super::MessageSink;

/// Chunk size kept under Telegram's 4096 char limit
const MAX_CHUNK_LEN: usize = 4000;

/// Split long messages for Telegram's 4096 char limit
fn split_message(text: &str, max_len: usize) -> Vec<String> {
    if text.len() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        // Walk back to a valid UTF-8 char boundary so slicing doesn't panic
        while end > start && !text.is_char_boundary(end) {
            end -= 1;
        }
        let actual_end = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .or_else(|| text[start..end].rfind(' '))
                .map(|pos| start + pos + 1)
                .unwrap_or(end)
        } else {
            end
        };

        chunks.push(text[start..actual_end].to_string());
        start = actual_end;
    }

    chunks
}

/// Numeric ids go to a chat, anything else is treated as an `@channel` username.
fn parse_recipient(chat_id: &str) -> Recipient {
    let chat_id = chat_id.trim();
    match chat_id.parse::<i64>() {
        Ok(id) => Recipient::Id(ChatId(id)),
        Err(_) => Recipient::ChannelUsername(chat_id.to_string()),
    }
}

/// Forwards relayed text to a single Telegram chat
pub struct TelegramSink {
    bot: Bot,
    chat: Recipient,
}

impl TelegramSink {
    pub fn new(
        bot_token: &str,
        chat_id: &str,
        api_url: Option<&str>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = teloxide::net::default_reqwest_settings()
            .timeout(timeout)
            .build()
            .context("Failed to build Telegram HTTP client")?;
        let mut bot = Bot::with_client(bot_token, client);

        if let Some(url) = api_url {
            let url = reqwest::Url::parse(url)
                .with_context(|| format!("Invalid Telegram API URL: {}", url))?;
            bot = bot.set_api_url(url);
        }

        info!("Telegram sink configured for chat {}", chat_id);
        Ok(Self {
            bot,
            chat: parse_recipient(chat_id),
        })
    }
}

#[async_trait]
impl MessageSink for TelegramSink {
    async fn forward(&self, text: &str) -> Result<()> {
        let chunks = split_message(text, MAX_CHUNK_LEN);
        let total = chunks.len();

        for (i, chunk) in chunks.into_iter().enumerate() {
            self.bot
                .send_message(self.chat.clone(), chunk)
                .await
                .with_context(|| {
                    format!("Failed to send message to Telegram (part {}/{})", i + 1, total)
                })?;
        }

        debug!("Delivered {} part(s) to Telegram", total);
        Ok(())
    }
}
