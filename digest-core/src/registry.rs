//! Set of channels the bot is active in, persisted as a YAML sequence of ids.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::error::Result;
use crate::persist;

pub struct ChannelRegistry {
    path: PathBuf,
    channels: RwLock<BTreeSet<String>>,
}

/// Ids may have been written as YAML numbers; both forms are accepted.
fn parse_snapshot(data: &str) -> Result<BTreeSet<String>> {
    let values: Option<Vec<serde_yaml::Value>> = serde_yaml::from_str(data)?;
    Ok(values
        .unwrap_or_default()
        .into_iter()
        .filter_map(|v| match v {
            serde_yaml::Value::String(s) => Some(s),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .collect())
}

impl ChannelRegistry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            channels: RwLock::new(BTreeSet::new()),
        }
    }

    /// Loads the snapshot. Missing file gives an empty registry; corrupt file is logged and
    /// gives an empty registry.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let channels = match persist::read_optional(path).await {
            Ok(Some(data)) => parse_snapshot(&data).unwrap_or_else(|e| {
                warn!(error = %e, "Corrupt channel registry, starting empty");
                BTreeSet::new()
            }),
            Ok(None) => BTreeSet::new(),
            Err(e) => {
                warn!(error = %e, "Cannot read channel registry, starting empty");
                BTreeSet::new()
            }
        };
        info!(channels = channels.len(), "Loaded channel registry");
        Self {
            path: path.to_path_buf(),
            channels: RwLock::new(channels),
        }
    }

    pub async fn contains(&self, channel_id: &str) -> bool {
        self.channels.read().await.contains(channel_id)
    }

    /// Records a channel. A newly seen channel is persisted right away; returns true when new.
    pub async fn observe(&self, channel_id: &str) -> bool {
        let mut channels = self.channels.write().await;
        if !channels.insert(channel_id.to_string()) {
            return false;
        }
        info!(channel_id = %channel_id, "New channel registered");
        if let Err(e) = self.write(&channels).await {
            warn!(path = %self.path.display(), error = %e, "Failed to save channel registry");
        }
        true
    }

    /// Rewrites the snapshot (used on shutdown).
    pub async fn save(&self) -> Result<()> {
        let channels = self.channels.read().await;
        self.write(&channels).await?;
        info!(channels = channels.len(), "Channel registry saved");
        Ok(())
    }

    pub async fn channels(&self) -> Vec<String> {
        self.channels.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.channels.read().await.len()
    }

    async fn write(&self, channels: &BTreeSet<String>) -> Result<()> {
        let list: Vec<&String> = channels.iter().collect();
        let data = serde_yaml::to_string(&list)?;
        persist::write_atomic(&self.path, data.as_bytes()).await
    }
}
