//! Per-channel configuration layered over a process-wide default record.
//!
//! [`ConfigStore::resolve`] returns the channel's override record when one exists and the
//! default record otherwise. The first write for a channel seeds a full copy of the
//! defaults before setting the field, so later reads never mix override and default
//! values. Every mutation rewrites the snapshot file under the store's write lock; a
//! failed write is logged and the in-memory state stays authoritative.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::persist;

pub const DEFAULT_TEMPERATURE: f32 = 1.0;

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

/// Settings of one channel (or of the default record).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    pub main_model: String,
    pub error_model: String,
    pub main_prompt: String,
    pub error_prompt: String,
    /// Process-wide sampling temperature. Not part of the snapshot; loaded records take
    /// it from the default record.
    #[serde(default = "default_temperature", skip_serializing)]
    pub temperature: f32,
}

impl ChannelSettings {
    pub fn get(&self, field: ConfigField) -> &str {
        match field {
            ConfigField::MainModel => &self.main_model,
            ConfigField::ErrorModel => &self.error_model,
            ConfigField::MainPrompt => &self.main_prompt,
            ConfigField::ErrorPrompt => &self.error_prompt,
        }
    }

    pub fn set(&mut self, field: ConfigField, value: String) {
        match field {
            ConfigField::MainModel => self.main_model = value,
            ConfigField::ErrorModel => self.error_model = value,
            ConfigField::MainPrompt => self.main_prompt = value,
            ConfigField::ErrorPrompt => self.error_prompt = value,
        }
    }
}

/// Resolved configuration for a channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelConfig {
    pub channel_id: String,
    /// True when the settings come from the channel's own override record.
    pub overridden: bool,
    pub settings: ChannelSettings,
}

/// Mutable fields of a channel record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigField {
    MainModel,
    ErrorModel,
    MainPrompt,
    ErrorPrompt,
}

impl ConfigField {
    pub const ALL: [ConfigField; 4] = [
        ConfigField::MainModel,
        ConfigField::ErrorModel,
        ConfigField::MainPrompt,
        ConfigField::ErrorPrompt,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigField::MainModel => "main_model",
            ConfigField::ErrorModel => "error_model",
            ConfigField::MainPrompt => "main_prompt",
            ConfigField::ErrorPrompt => "error_prompt",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConfigField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Invalid field: {}", s))
    }
}

struct State {
    defaults: ChannelSettings,
    overrides: BTreeMap<String, ChannelSettings>,
}

/// Default record plus per-channel overrides, persisted as JSON `{channel_id: record}`.
pub struct ConfigStore {
    path: PathBuf,
    state: RwLock<State>,
}

impl ConfigStore {
    /// Empty store; nothing is read from `path` until [`ConfigStore::load`].
    pub fn new(path: impl Into<PathBuf>, defaults: ChannelSettings) -> Self {
        Self {
            path: path.into(),
            state: RwLock::new(State {
                defaults,
                overrides: BTreeMap::new(),
            }),
        }
    }

    /// Loads overrides from `path`. A missing file gives an empty store; a corrupt one is
    /// logged and also gives an empty store.
    #[instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>, defaults: ChannelSettings) -> Self {
        let path = path.as_ref();
        let overrides = match persist::read_optional(path).await {
            Ok(Some(data)) => match serde_json::from_str::<BTreeMap<String, ChannelSettings>>(&data) {
                Ok(mut map) => {
                    info!(channels = map.len(), "Loaded channel configuration");
                    for settings in map.values_mut() {
                        settings.temperature = defaults.temperature;
                    }
                    map
                }
                Err(e) => {
                    warn!(error = %e, "Corrupt channel configuration, starting empty");
                    BTreeMap::new()
                }
            },
            Ok(None) => {
                info!("No channel configuration file, starting empty");
                BTreeMap::new()
            }
            Err(e) => {
                warn!(error = %e, "Cannot read channel configuration, starting empty");
                BTreeMap::new()
            }
        };
        Self {
            path: path.to_path_buf(),
            state: RwLock::new(State {
                defaults,
                overrides,
            }),
        }
    }

    /// Channel's override record, or the default record. Never absent.
    pub async fn resolve(&self, channel_id: &str) -> ChannelConfig {
        let state = self.state.read().await;
        match state.overrides.get(channel_id) {
            Some(settings) => ChannelConfig {
                channel_id: channel_id.to_string(),
                overridden: true,
                settings: settings.clone(),
            },
            None => ChannelConfig {
                channel_id: channel_id.to_string(),
                overridden: false,
                settings: state.defaults.clone(),
            },
        }
    }

    /// Sets one field by name. Returns false for an unknown field name.
    pub async fn update(&self, channel_id: &str, field: &str, value: impl Into<String>) -> bool {
        match field.parse::<ConfigField>() {
            Ok(field) => {
                self.update_field(channel_id, field, value).await;
                true
            }
            Err(e) => {
                warn!(channel_id = %channel_id, error = %e, "Rejected configuration update");
                false
            }
        }
    }

    /// Sets one field, seeding the channel from the defaults on first write.
    #[instrument(skip(self, value))]
    pub async fn update_field(&self, channel_id: &str, field: ConfigField, value: impl Into<String>) {
        let mut state = self.state.write().await;
        let defaults = state.defaults.clone();
        state
            .overrides
            .entry(channel_id.to_string())
            .or_insert(defaults)
            .set(field, value.into());
        info!(channel_id = %channel_id, field = %field, "Channel configuration updated");
        self.persist(&state).await;
    }

    /// Restores one field to its default, or drops the whole override when `field` is `None`.
    /// Returns false when the channel had no override.
    #[instrument(skip(self))]
    pub async fn reset(&self, channel_id: &str, field: Option<ConfigField>) -> bool {
        let mut state = self.state.write().await;
        let changed = match field {
            Some(field) => {
                let default_value = state.defaults.get(field).to_string();
                match state.overrides.get_mut(channel_id) {
                    Some(settings) => {
                        settings.set(field, default_value);
                        true
                    }
                    None => false,
                }
            }
            None => state.overrides.remove(channel_id).is_some(),
        };
        if changed {
            info!(channel_id = %channel_id, field = ?field, "Channel configuration reset");
            self.persist(&state).await;
        }
        changed
    }

    pub async fn defaults(&self) -> ChannelSettings {
        self.state.read().await.defaults.clone()
    }

    /// Mutates the default record. Channels with overrides are unaffected.
    pub async fn set_default(&self, field: ConfigField, value: impl Into<String>) {
        let mut state = self.state.write().await;
        state.defaults.set(field, value.into());
        info!(field = %field, "Default configuration updated");
    }

    /// Channel ids that have an override record.
    pub async fn channels(&self) -> Vec<String> {
        self.state.read().await.overrides.keys().cloned().collect()
    }

    /// Rewrites the snapshot (used on shutdown).
    pub async fn save(&self) -> crate::error::Result<()> {
        let state = self.state.read().await;
        let data = serde_json::to_vec_pretty(&state.overrides)?;
        persist::write_atomic(&self.path, &data).await
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, state: &State) {
        let result = match serde_json::to_vec_pretty(&state.overrides) {
            Ok(data) => persist::write_atomic(&self.path, &data).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!(path = %self.path.display(), error = %e, "Failed to save channel configuration");
        }
    }
}
