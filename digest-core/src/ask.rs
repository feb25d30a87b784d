//! Direct-ask engine: answers a free-form question with the channel's main model and a
//! fixed persona. The answer is returned unsanitized.

use std::sync::Arc;

use llm_client::{CompletionRequest, LlmClient, ModelOutcome};
use prompt::ASK_INSTRUCTION;
use tracing::{instrument, warn};

use crate::channel_config::ConfigStore;
use crate::error::UserInputError;
use crate::summarizer::{format_model_error, MODEL_UNAVAILABLE};

/// Generation ceiling for direct questions.
pub const ASK_MAX_TOKENS: u32 = 15000;
/// Asks do not use the channel temperature.
pub const ASK_TEMPERATURE: f32 = 0.7;

pub struct AskEngine {
    llm: Arc<dyn LlmClient>,
    config: Arc<ConfigStore>,
}

impl AskEngine {
    pub fn new(llm: Arc<dyn LlmClient>, config: Arc<ConfigStore>) -> Self {
        Self { llm, config }
    }

    /// Blank questions are rejected before any model call.
    #[instrument(skip(self, question))]
    pub async fn ask(&self, channel_id: &str, question: &str) -> Result<String, UserInputError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(UserInputError::EmptyQuestion);
        }
        let model = self.config.resolve(channel_id).await.settings.main_model;
        let request = CompletionRequest {
            model,
            system_turns: vec![ASK_INSTRUCTION.to_string()],
            user_turn: question.to_string(),
            max_tokens: ASK_MAX_TOKENS,
            temperature: ASK_TEMPERATURE,
        };
        Ok(match self.llm.complete(request).await {
            ModelOutcome::Text(text) => text,
            ModelOutcome::ModelError { code, message } => {
                warn!(code = %code, message = %message, "Model returned an error for ask");
                format_model_error(&code, &message)
            }
            ModelOutcome::TransportFailure(detail) => {
                warn!(detail = %detail, "Ask request failed");
                MODEL_UNAVAILABLE.to_string()
            }
        })
    }
}
