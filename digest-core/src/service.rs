//! Message pipeline: buffers inbound messages, detects triggers and produces replies.
//!
//! Flow for a group message: (debug mode: drop unknown chats) → register chat →
//! trigger? parse count, take the last N buffered messages, summarize, reply with a
//! header; anything else is appended to history. Every user-facing failure goes through the error voice.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use llm_client::LlmClient;
use tracing::{debug, info, instrument, warn};

use crate::admin::{Admin, ModelCatalog};
use crate::ask::AskEngine;
use crate::channel_config::ConfigStore;
use crate::error::{Result, UserInputError};
use crate::error_voice::ErrorVoice;
use crate::history::HistoryStore;
use crate::registry::ChannelRegistry;
use crate::sanitize::escape_html;
use crate::stats::{RequestKind, RequestStats};
use crate::summarizer::{Summarizer, NOTHING_TO_SUMMARIZE};
use crate::trigger::parse_trigger;
use crate::types::{BufferedMessage, Reply};

/// Accumulated debug echo length that forces a flush.
pub const DEBUG_ECHO_FLUSH_CHARS: usize = 3000;

/// Operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BotMode {
    #[default]
    Info,
    /// Only registered chats are served and summaries are followed by an echo of the input.
    Debug,
}

impl FromStr for BotMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(BotMode::Info),
            "debug" => Ok(BotMode::Debug),
            other => Err(format!("Invalid BOT_MODE: {} (expected info or debug)", other)),
        }
    }
}

impl fmt::Display for BotMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotMode::Info => f.write_str("info"),
            BotMode::Debug => f.write_str("debug"),
        }
    }
}

/// Behaviour switches for [`DigestService`].
#[derive(Debug, Clone, Default)]
pub struct ServiceOptions {
    pub mode: BotMode,
    /// The only user allowed to change models and prompts; `None` disables administration.
    pub admin_username: Option<String>,
}

/// Work left after intake; everything here needs a model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingReply {
    /// Summarize `messages`, taken from the history when the trigger arrived.
    Summary {
        channel_id: String,
        messages: Vec<BufferedMessage>,
    },
    /// Voice a rejected trigger.
    InputError {
        channel_id: String,
        error: UserInputError,
    },
}

pub struct DigestService {
    pub(crate) history: HistoryStore,
    pub(crate) config: Arc<ConfigStore>,
    pub(crate) registry: ChannelRegistry,
    pub(crate) stats: RequestStats,
    pub(crate) summarizer: Summarizer,
    pub(crate) asker: AskEngine,
    pub(crate) voice: ErrorVoice,
    pub(crate) admin: Admin,
    pub(crate) options: ServiceOptions,
}

impl DigestService {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        config: Arc<ConfigStore>,
        registry: ChannelRegistry,
        catalog: ModelCatalog,
        options: ServiceOptions,
    ) -> Self {
        Self {
            history: HistoryStore::default(),
            summarizer: Summarizer::new(Arc::clone(&llm), Arc::clone(&config)),
            asker: AskEngine::new(Arc::clone(&llm), Arc::clone(&config)),
            voice: ErrorVoice::new(llm, Arc::clone(&config)),
            admin: Admin::new(Arc::clone(&config), catalog),
            config,
            registry,
            stats: RequestStats::new(),
            options,
        }
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }

    pub fn stats(&self) -> &RequestStats {
        &self.stats
    }

    pub fn mode(&self) -> BotMode {
        self.options.mode
    }

    /// In-persona reply for a failure context.
    pub async fn voice(&self, channel_id: &str, context: &str) -> Reply {
        Reply::plain(self.voice.voice_error(channel_id, context).await)
    }

    pub(crate) async fn voice_input_error(&self, channel_id: &str, err: &UserInputError) -> Reply {
        self.voice(channel_id, &err.to_string()).await
    }

    /// Handles a group or private message end to end. Returns the replies to send,
    /// possibly none.
    pub async fn on_message(
        &self,
        channel_id: &str,
        message: BufferedMessage,
        bot_username: &str,
    ) -> Vec<Reply> {
        match self.accept_message(channel_id, message, bot_username).await {
            Some(pending) => self.render(pending).await,
            None => Vec::new(),
        }
    }

    /// Intake half of [`DigestService::on_message`]: registers the chat, buffers plain
    /// messages and snapshots the history for a trigger. No model is called here, so
    /// callers can run [`DigestService::render`] on another task without holding up the
    /// chat's later messages.
    #[instrument(skip(self, message))]
    pub async fn accept_message(
        &self,
        channel_id: &str,
        message: BufferedMessage,
        bot_username: &str,
    ) -> Option<PendingReply> {
        if self.options.mode == BotMode::Debug && !self.registry.contains(channel_id).await {
            debug!("Ignoring message from unregistered chat in debug mode");
            return None;
        }
        self.registry.observe(channel_id).await;

        let trigger = message
            .text
            .as_deref()
            .and_then(|text| parse_trigger(text, bot_username));
        match trigger {
            None => {
                self.history.append(channel_id, message).await;
                None
            }
            Some(Err(e)) => {
                info!(error = %e, "Rejected summary trigger");
                Some(PendingReply::InputError {
                    channel_id: channel_id.to_string(),
                    error: e,
                })
            }
            Some(Ok(n)) => Some(self.snapshot(channel_id, n).await),
        }
    }

    /// Buffers a channel post. Channel posts register the channel in every mode.
    #[instrument(skip(self, message))]
    pub async fn on_channel_post(&self, channel_id: &str, message: BufferedMessage) {
        self.registry.observe(channel_id).await;
        self.history.append(channel_id, message).await;
    }

    /// Takes the last `n` messages as they are now.
    async fn snapshot(&self, channel_id: &str, n: usize) -> PendingReply {
        let messages = self.history.take_last(channel_id, n).await;
        if messages.is_empty() {
            return PendingReply::InputError {
                channel_id: channel_id.to_string(),
                error: UserInputError::NoPreviousMessages,
            };
        }
        info!(requested = n, taken = messages.len(), "Summary snapshot taken");
        PendingReply::Summary {
            channel_id: channel_id.to_string(),
            messages,
        }
    }

    /// Model half of [`DigestService::on_message`]: summary or voiced error.
    #[instrument(skip_all)]
    pub async fn render(&self, pending: PendingReply) -> Vec<Reply> {
        match pending {
            PendingReply::InputError { channel_id, error } => {
                vec![self.voice_input_error(&channel_id, &error).await]
            }
            PendingReply::Summary {
                channel_id,
                messages,
            } => self.render_summary(&channel_id, &messages).await,
        }
    }

    /// Summary with its header, plus the debug echo.
    async fn render_summary(&self, channel_id: &str, messages: &[BufferedMessage]) -> Vec<Reply> {
        let summary = match self.summarizer.summarize(channel_id, messages).await {
            Some(summary) => {
                self.stats.increment(channel_id, RequestKind::Summary).await;
                summary
            }
            None => NOTHING_TO_SUMMARIZE.to_string(),
        };

        let model = self.config.resolve(channel_id).await.settings.main_model;
        let mut replies = vec![Reply::html(format!(
            "<b>Summary of the last {} messages by {}:</b>\n\n{}",
            messages.len(),
            escape_html(&model),
            summary
        ))];
        if self.options.mode == BotMode::Debug {
            replies.extend(debug_echo(messages));
        }
        replies
    }

    /// Persists the channel configuration and the registry; called on shutdown.
    /// Both saves are attempted; the first failure is returned.
    pub async fn shutdown(&self) -> Result<()> {
        let config = self.config.save().await;
        if let Err(e) = &config {
            warn!(error = %e, "Failed to save channel configuration");
        }
        let registry = self.registry.save().await;
        if let Err(e) = &registry {
            warn!(error = %e, "Failed to save channel registry");
        }
        config.and(registry)
    }
}

/// Summarized messages newest first, numbered, flushed past [`DEBUG_ECHO_FLUSH_CHARS`].
pub fn debug_echo(messages: &[BufferedMessage]) -> Vec<Reply> {
    let mut replies = Vec::new();
    let mut current = format!("<b>Last {} messages:</b>\n\n", messages.len());
    for (i, msg) in messages.iter().rev().enumerate() {
        if let Some(text) = msg.body() {
            current.push_str(&format!("{}. <code>{}</code>\n\n", i + 1, escape_html(text)));
        }
        if current.chars().count() > DEBUG_ECHO_FLUSH_CHARS {
            replies.push(Reply::html(std::mem::take(&mut current)));
        }
    }
    if !current.is_empty() {
        replies.push(Reply::html(current));
    }
    replies
}
