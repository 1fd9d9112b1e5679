use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub discord: DiscordConfig,
    #[serde(default)]
    pub telegram: TelegramConfig,
    #[serde(default)]
    pub relay: RelayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DiscordConfig {
    /// Sent verbatim in the Authorization header
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub channel_ids: Vec<String>,
    #[serde(default = "default_discord_api_base")]
    pub api_base: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,
    /// Numeric chat id or an `@channel` username
    #[serde(default)]
    pub chat_id: String,
    /// Override for the Bot API endpoint (e.g. a local Bot API server)
    #[serde(default)]
    pub api_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RelayConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default = "default_state_dir")]
    pub state_dir: PathBuf,
    #[serde(default = "default_filter_words")]
    pub filter_words: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for DiscordConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_ids: Vec::new(),
            api_base: default_discord_api_base(),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            state_dir: default_state_dir(),
            filter_words: default_filter_words(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_discord_api_base() -> String {
    "https://discord.com/api/v9".to_string()
}

fn default_poll_interval_secs() -> u64 {
    1
}

fn default_state_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_filter_words() -> Vec<String> {
    ["Binance", "Futures", "Kucoin", "ByBit"]
        .iter()
        .map(|w| w.to_string())
        .collect()
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Split a comma-separated list, dropping blank entries.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_secs(name: &str, value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .with_context(|| format!("{} must be a whole number of seconds, got '{}'", name, value))
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.relay.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.relay.request_timeout_secs)
    }

    /// Load the optional TOML file, then apply overrides from the process
    /// environment. A missing file is only an error when `required` is set.
    pub fn load(path: &Path, required: bool) -> Result<Self> {
        let config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else if required {
            anyhow::bail!("Config file not found: {}", path.display());
        } else {
            Config::default()
        };

        let config = config.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-style overrides. `lookup` returns the value of a
    /// variable if it is set.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        if let Some(ids) = lookup("CHANNEL_IDS") {
            self.discord.channel_ids = split_list(&ids);
        }
        if let Some(base) = lookup("DISCORD_API_BASE") {
            self.discord.api_base = base;
        }
        if let Some(token) = lookup("TELEGRAM_TOKEN") {
            self.telegram.bot_token = token;
        }
        if let Some(chat_id) = lookup("TELEGRAM_CHAT_ID") {
            self.telegram.chat_id = chat_id;
        }
        if let Some(url) = lookup("TELEGRAM_API_URL") {
            self.telegram.api_url = Some(url);
        }
        if let Some(secs) = lookup("POLL_INTERVAL_SECS") {
            self.relay.poll_interval_secs = parse_secs("POLL_INTERVAL_SECS", &secs)?;
        }
        if let Some(secs) = lookup("REQUEST_TIMEOUT_SECS") {
            self.relay.request_timeout_secs = parse_secs("REQUEST_TIMEOUT_SECS", &secs)?;
        }
        if let Some(dir) = lookup("STATE_DIR") {
            self.relay.state_dir = PathBuf::from(dir);
        }
        if let Some(words) = lookup("FILTER_WORDS") {
            self.relay.filter_words = split_list(&words);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.discord.token.trim().is_empty() {
            anyhow::bail!("Discord token is missing (set DISCORD_TOKEN or [discord] token)");
        }
        if self.discord.channel_ids.iter().all(|id| id.trim().is_empty()) {
            anyhow::bail!("No channels configured (set CHANNEL_IDS or [discord] channel_ids)");
        }
        if self.telegram.bot_token.trim().is_empty() {
            anyhow::bail!("Telegram bot token is missing (set TELEGRAM_TOKEN or [telegram] bot_token)");
        }
        if self.telegram.chat_id.trim().is_empty() {
            anyhow::bail!("Telegram chat id is missing (set TELEGRAM_CHAT_ID or [telegram] chat_id)");
        }
        if self.relay.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than zero");
        }
        if self.relay.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn complete_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DISCORD_TOKEN", "discord-secret"),
            ("CHANNEL_IDS", "111, 222,,333 "),
            ("TELEGRAM_TOKEN", "123:abc"),
            ("TELEGRAM_CHAT_ID", "-10042"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.discord.api_base, "https://discord.com/api/v9");
        assert_eq!(config.poll_interval(), Duration::from_secs(1));
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(
            config.relay.filter_words,
            vec!["Binance", "Futures", "Kucoin", "ByBit"]
        );
        assert_eq!(config.relay.state_dir, PathBuf::from("."));
    }

    #[test]
    fn test_env_overrides_fill_required_fields() {
        let config = Config::default()
            .with_overrides(env(&complete_env()))
            .unwrap();
        config.validate().unwrap();
        assert_eq!(config.discord.token, "discord-secret");
        assert_eq!(config.discord.channel_ids, vec!["111", "222", "333"]);
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.chat_id, "-10042");
        assert!(config.telegram.api_url.is_none());
    }

    #[test]
    fn test_env_overrides_relay_settings() {
        let mut pairs = complete_env();
        pairs.push(("POLL_INTERVAL_SECS", "5"));
        pairs.push(("STATE_DIR", "/var/lib/relay"));
        pairs.push(("FILTER_WORDS", "spam, scam"));
        let config = Config::default().with_overrides(env(&pairs)).unwrap();
        assert_eq!(config.poll_interval(), Duration::from_secs(5));
        assert_eq!(config.relay.state_dir, PathBuf::from("/var/lib/relay"));
        assert_eq!(config.relay.filter_words, vec!["spam", "scam"]);
    }

    #[test]
    fn test_bad_interval_is_rejected() {
        let mut pairs = complete_env();
        pairs.push(("POLL_INTERVAL_SECS", "soon"));
        let err = Config::default().with_overrides(env(&pairs)).unwrap_err();
        assert!(err.to_string().contains("POLL_INTERVAL_SECS"));
    }

    #[test]
    fn test_zero_interval_fails_validation() {
        let mut pairs = complete_env();
        pairs.push(("POLL_INTERVAL_SECS", "0"));
        let config = Config::default().with_overrides(env(&pairs)).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_token_names_variable() {
        let config = Config::default()
            .with_overrides(env(&[("CHANNEL_IDS", "1")]))
            .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DISCORD_TOKEN"));
    }

    #[test]
    fn test_blank_channel_list_fails_validation() {
        let mut pairs = complete_env();
        pairs.retain(|(k, _)| *k != "CHANNEL_IDS");
        pairs.push(("CHANNEL_IDS", " , "));
        let config = Config::default().with_overrides(env(&pairs)).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("CHANNEL_IDS"));
    }

    #[test]
    fn test_parse_toml_sections() {
        let config: Config = toml::from_str(
            r#"
            [discord]
            token = "t"
            channel_ids = ["1", "2"]

            [telegram]
            bot_token = "b"
            chat_id = "@news"

            [relay]
            poll_interval_secs = 3
            filter_words = ["Foo"]
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.discord.channel_ids, vec!["1", "2"]);
        assert_eq!(config.discord.api_base, "https://discord.com/api/v9");
        assert_eq!(config.telegram.chat_id, "@news");
        assert_eq!(config.poll_interval(), Duration::from_secs(3));
        assert_eq!(config.relay.filter_words, vec!["Foo"]);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_env_wins_over_file() {
        let config: Config = toml::from_str(
            r#"
            [discord]
            token = "from-file"
            channel_ids = ["1"]
            "#,
        )
        .unwrap();
        let config = config
            .with_overrides(env(&[("DISCORD_TOKEN", "from-env")]))
            .unwrap();
        assert_eq!(config.discord.token, "from-env");
        assert_eq!(config.discord.channel_ids, vec!["1"]);
    }

    #[test]
    fn test_missing_required_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join("absent.toml"), true).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
