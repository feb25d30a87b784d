//! Summarization engine: renders buffered messages into a transcript, asks the channel's
//! main model for a summary and sanitizes the returned markup.

use std::sync::Arc;

use llm_client::{CompletionRequest, LlmClient, ModelOutcome};
use prompt::MARKUP_INSTRUCTION;
use tracing::{info, instrument, warn};

use crate::channel_config::ConfigStore;
use crate::sanitize::sanitize_html;
use crate::types::BufferedMessage;

/// Generation ceiling for summaries.
pub const SUMMARY_MAX_TOKENS: u32 = 1500;

pub const NOTHING_TO_SUMMARIZE: &str = "No text messages found to summarize.";
pub const MODEL_UNAVAILABLE: &str = "Sorry, I couldn't generate a summary at this time.";

/// `"Error code {code}, {message}"`, shown as-is for model-reported errors.
pub fn format_model_error(code: &str, message: &str) -> String {
    format!("Error code {}, {}", code, message)
}

/// One line per message with text, each terminated by a newline.
pub fn render_transcript(messages: &[BufferedMessage]) -> String {
    messages
        .iter()
        .filter_map(BufferedMessage::render)
        .map(|line| line + "\n")
        .collect()
}

pub struct Summarizer {
    llm: Arc<dyn LlmClient>,
    config: Arc<ConfigStore>,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmClient>, config: Arc<ConfigStore>) -> Self {
        Self { llm, config }
    }

    /// Display-ready summary of `messages` using the channel's main model and prompt.
    /// `None` when no message has text, in which case the model is not called.
    #[instrument(skip(self, messages), fields(count = messages.len()))]
    pub async fn summarize(&self, channel_id: &str, messages: &[BufferedMessage]) -> Option<String> {
        let transcript = render_transcript(messages);
        if transcript.is_empty() {
            info!("No renderable messages, skipping model call");
            return None;
        }
        let cfg = self.config.resolve(channel_id).await.settings;
        let request = CompletionRequest {
            model: cfg.main_model,
            system_turns: vec![MARKUP_INSTRUCTION.to_string(), cfg.main_prompt],
            user_turn: transcript,
            max_tokens: SUMMARY_MAX_TOKENS,
            temperature: cfg.temperature,
        };
        Some(match self.llm.complete(request).await {
            ModelOutcome::Text(text) => sanitize_html(&text),
            ModelOutcome::ModelError { code, message } => {
                warn!(code = %code, message = %message, "Model returned an error for summary");
                format_model_error(&code, &message)
            }
            ModelOutcome::TransportFailure(detail) => {
                warn!(detail = %detail, "Summary request failed");
                MODEL_UNAVAILABLE.to_string()
            }
        })
    }
}
