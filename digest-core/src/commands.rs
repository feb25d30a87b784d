//! Command handlers. Argument strings are the text after the command name.

use tracing::{info, instrument, warn};

use crate::error::UserInputError;
use crate::sanitize::escape_html;
use crate::service::DigestService;
use crate::stats::RequestKind;
use crate::types::Reply;

const MODEL_ARGS_MISSING: &str = "Please specify model type (main/error) and model name";
const PROMPT_ARGS_MISSING: &str = "Please specify prompt type (main/error) and prompt text";

/// First whitespace-separated word and the trimmed remainder.
fn split_args(args: &str) -> (Option<&str>, &str) {
    let args = args.trim();
    match args.split_once(char::is_whitespace) {
        Some((first, rest)) => (Some(first), rest.trim()),
        None if args.is_empty() => (None, ""),
        None => (Some(args), ""),
    }
}

impl DigestService {
    /// True when `username` is the configured admin (case-insensitive, optional `@`).
    pub fn is_admin(&self, username: Option<&str>) -> bool {
        match (&self.options.admin_username, username) {
            (Some(admin), Some(user)) => admin
                .trim_start_matches('@')
                .eq_ignore_ascii_case(user.trim_start_matches('@')),
            _ => false,
        }
    }

    async fn require_admin(&self, channel_id: &str, username: Option<&str>, action: &str) -> Option<Reply> {
        if self.is_admin(username) {
            return None;
        }
        warn!(channel_id = %channel_id, user = ?username, action = %action, "Unauthorized command");
        let err = UserInputError::Unauthorized(action.to_string());
        Some(self.voice_input_error(channel_id, &err).await)
    }

    pub fn start(&self, bot_username: &str) -> Reply {
        Reply::html(format!(
            "Hi! I summarize recent messages in this chat. Mention me as <code>@{} N</code> \
to get a summary of the last N messages.",
            escape_html(bot_username)
        ))
    }

    /// Usage plus the settings currently in effect for the chat.
    pub async fn help(&self, channel_id: &str, bot_username: &str) -> Reply {
        let cfg = self.config.resolve(channel_id).await;
        let bot = escape_html(bot_username);
        let scope = if cfg.overridden { "this chat" } else { "defaults" };
        Reply::html(format!(
            "<b>Commands</b>\n\n\
@{bot} N - summary of the last N messages (1-500, default 1)\n\
/ask question - ask the model directly\n\
/status - request statistics\n\n\
<b>Admin commands</b>\n\
/model [main|error|add] model_id - change default models\n\
/prompt [main|error] text - change default prompts\n\
/chatmodel [main|error] model_id - change models for this chat\n\
/chatprompt [main|error] text - change prompts for this chat\n\
/reset [field] - restore this chat's settings to the defaults\n\n\
<b>Current settings ({scope})</b>\n\
Main model: <code>{main}</code>\n\
Error model: <code>{error}</code>\n\n\
At most {cap} messages are kept per chat.",
            bot = bot,
            scope = scope,
            main = escape_html(&cfg.settings.main_model),
            error = escape_html(&cfg.settings.error_model),
            cap = crate::history::HISTORY_CAPACITY,
        ))
    }

    /// `/ask question`.
    #[instrument(skip(self, question))]
    pub async fn ask(&self, channel_id: &str, question: &str) -> Reply {
        match self.asker.ask(channel_id, question).await {
            Ok(answer) => {
                self.stats.increment(channel_id, RequestKind::Ask).await;
                Reply::html(answer)
            }
            Err(e) => self.voice_input_error(channel_id, &e).await,
        }
    }

    pub async fn status(&self) -> Reply {
        Reply::html(self.stats.snapshot().await.render())
    }

    /// `/model`, `/model <main|error|add> <id>` on the defaults.
    #[instrument(skip(self))]
    pub async fn model_command(&self, channel_id: &str, username: Option<&str>, args: &str) -> Reply {
        if let Some(denied) = self.require_admin(channel_id, username, "model change").await {
            return denied;
        }
        let (kind, value) = split_args(args);
        let Some(kind) = kind else {
            return self.model_listing().await;
        };
        let value = value.split_whitespace().next().unwrap_or_default();
        if value.is_empty() {
            return self.voice(channel_id, MODEL_ARGS_MISSING).await;
        }
        let outcome = self.admin.set_model(kind, value, None).await;
        self.admin_reply(channel_id, outcome.ok, &outcome.message).await
    }

    /// `/prompt <main|error> <text>` on the defaults.
    #[instrument(skip(self, args))]
    pub async fn prompt_command(&self, channel_id: &str, username: Option<&str>, args: &str) -> Reply {
        if let Some(denied) = self.require_admin(channel_id, username, "prompt change").await {
            return denied;
        }
        let (kind, text) = split_args(args);
        match kind {
            Some(kind) if !text.is_empty() => {
                let outcome = self.admin.set_prompt(kind, text, None).await;
                self.admin_reply(channel_id, outcome.ok, &outcome.message).await
            }
            _ => Reply::html(
                "<b>To change the prompt, use:</b>\n/prompt main your new prompt\n/prompt error your new prompt",
            ),
        }
    }

    /// `/chatmodel <main|error> <id>` for the current chat.
    #[instrument(skip(self))]
    pub async fn chat_model_command(&self, channel_id: &str, username: Option<&str>, args: &str) -> Reply {
        if let Some(denied) = self.require_admin(channel_id, username, "model change").await {
            return denied;
        }
        let (kind, value) = split_args(args);
        let value = value.split_whitespace().next().unwrap_or_default();
        match kind {
            Some(kind) if !value.is_empty() => {
                let outcome = self.admin.set_model(kind, value, Some(channel_id)).await;
                self.admin_reply(channel_id, outcome.ok, &outcome.message).await
            }
            _ => self.voice(channel_id, MODEL_ARGS_MISSING).await,
        }
    }

    /// `/chatprompt <main|error> <text>` for the current chat.
    #[instrument(skip(self, args))]
    pub async fn chat_prompt_command(&self, channel_id: &str, username: Option<&str>, args: &str) -> Reply {
        if let Some(denied) = self.require_admin(channel_id, username, "prompt change").await {
            return denied;
        }
        let (kind, text) = split_args(args);
        match kind {
            Some(kind) if !text.is_empty() => {
                let outcome = self.admin.set_prompt(kind, text, Some(channel_id)).await;
                self.admin_reply(channel_id, outcome.ok, &outcome.message).await
            }
            _ => self.voice(channel_id, PROMPT_ARGS_MISSING).await,
        }
    }

    /// `/reset [field]` for the current chat.
    #[instrument(skip(self))]
    pub async fn reset_command(&self, channel_id: &str, username: Option<&str>, args: &str) -> Reply {
        if let Some(denied) = self.require_admin(channel_id, username, "settings reset").await {
            return denied;
        }
        let (field, _) = split_args(args);
        let outcome = self.admin.reset(channel_id, field).await;
        self.admin_reply(channel_id, outcome.ok, &outcome.message).await
    }

    async fn admin_reply(&self, channel_id: &str, ok: bool, message: &str) -> Reply {
        if ok {
            info!(channel_id = %channel_id, message = %message, "Admin change applied");
            Reply::html(format!("<code>{}</code>", escape_html(message)))
        } else {
            self.voice(channel_id, message).await
        }
    }

    async fn model_listing(&self) -> Reply {
        let defaults = self.config.defaults().await;
        let models: String = self
            .admin
            .catalog()
            .list()
            .await
            .iter()
            .map(|m| format!("- <code>{}</code>\n", escape_html(m)))
            .collect();
        Reply::html(format!(
            "<b>Current settings:</b>\nMain model: <code>{}</code>\nError model: <code>{}</code>\n\n\
<b>To change the model, use:</b>\n/model main model_name\n/model error model_name\n/model add model_name\n\n\
<b>Available models:</b>\n{}",
            escape_html(&defaults.main_model),
            escape_html(&defaults.error_model),
            models
        ))
    }
}
