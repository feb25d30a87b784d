//! # digest-core
//!
//! Per-channel state and policy for the digest bot: bounded message history,
//! layered channel configuration, channel registry, request statistics, and the
//! summarization, direct-ask and error-voice engines. Transport-agnostic; the Telegram
//! side lives in `digest-bot` and talks to this crate through [`DigestService`].
//!
//! ## External interactions
//!
//! - **AI models**: every model call goes through [`llm_client::LlmClient`].
//! - **Files**: channel configuration (JSON) and channel registry (YAML) snapshots.

pub mod admin;
pub mod ask;
pub mod channel_config;
mod commands;
pub mod error;
pub mod error_voice;
pub mod history;
mod persist;
pub mod registry;
pub mod sanitize;
pub mod service;
pub mod stats;
pub mod summarizer;
pub mod trigger;
pub mod types;

pub use admin::{Admin, AdminOutcome, ModelCatalog, DEFAULT_SUPPORTED_MODELS};
pub use ask::AskEngine;
pub use channel_config::{ChannelConfig, ChannelSettings, ConfigField, ConfigStore};
pub use error::{DigestError, Result, UserInputError};
pub use error_voice::ErrorVoice;
pub use history::{HistoryBuffer, HistoryStore, HISTORY_CAPACITY};
pub use registry::ChannelRegistry;
pub use service::{BotMode, DigestService, PendingReply, ServiceOptions};
pub use stats::{RequestKind, RequestStats, StatsSnapshot};
pub use summarizer::Summarizer;
pub use types::{BufferedMessage, Reply, ReplyFormat};
