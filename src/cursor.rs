use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, warn};

/// On-disk shape of a cursor file
#[derive(Debug, Serialize, Deserialize)]
struct CursorFile {
    last_message_id: Option<String>,
}

/// File-backed store of the last forwarded message id, one JSON file per channel.
#[derive(Debug, Clone)]
pub struct CursorStore {
    dir: PathBuf,
}

impl CursorStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Path of the cursor file for a channel. Characters that are not safe
    /// in a file name are replaced with `_`.
    pub fn path_for(&self, channel_id: &str) -> PathBuf {
        let safe: String = channel_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("last_message_{}.json", safe))
    }

    /// Load the cursor for a channel. Missing, unreadable or malformed files
    /// all yield `None`.
    pub async fn load(&self, channel_id: &str) -> Option<String> {
        let path = self.path_for(channel_id);
        let data = match tokio::fs::read_to_string(&path).await {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No cursor file for channel {} yet", channel_id);
                return None;
            }
            Err(e) => {
                warn!("Failed to read cursor file {}: {}", path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<CursorFile>(&data) {
            Ok(file) => file.last_message_id,
            Err(e) => {
                warn!(
                    "Ignoring corrupt cursor file {}: {}",
                    path.display(),
                    e
                );
                None
            }
        }
    }

    /// Persist the cursor for a channel. The value is written to a temp file
    /// next to the target and renamed over it.
    pub async fn save(&self, channel_id: &str, message_id: Option<&str>) -> Result<()> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create state directory: {}", self.dir.display()))?;

        let path = self.path_for(channel_id);
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string(&CursorFile {
            last_message_id: message_id.map(str::to_string),
        })?;

        tokio::fs::write(&tmp, data)
            .await
            .with_context(|| format!("Failed to write cursor file: {}", tmp.display()))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .with_context(|| format!("Failed to replace cursor file: {}", path.display()))?;

        debug!("Saved cursor {:?} for channel {}", message_id, channel_id);
        Ok(())
    }
}
