//! # Model client abstraction
//!
//! Defines the [`LlmClient`] trait, the [`CompletionRequest`] it takes and the
//! [`ModelOutcome`] it returns, plus an OpenAI-compatible implementation.
//!
//! A call never fails with `Err`: every request ends in exactly one outcome. Either the
//! model produced text, the service reported an error with a code and message, or the
//! request never got a usable answer (network, timeout, malformed response).

use async_trait::async_trait;
use openai_client::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use prompt::{ChatMessage, MessageRole};

mod config;
mod openai_llm;

pub use config::EnvLlmConfig;
pub use openai_llm::OpenAILlmClient;

/// One request to the model: ordered system turns, one user turn, sampling limits.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system_turns: Vec<String>,
    pub user_turn: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    /// Messages in send order: system turns, then the user turn.
    pub fn messages(&self) -> Vec<ChatMessage> {
        prompt::build_messages(self.system_turns.iter().cloned(), self.user_turn.clone())
    }
}

/// Result of one model call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelOutcome {
    /// Completion text (possibly empty).
    Text(String),
    /// The service answered with an error payload.
    ModelError { code: String, message: String },
    /// No usable answer was received; the detail is for logs only.
    TransportFailure(String),
}

/// Model client interface. Implementations must be cheap to share across tasks.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> ModelOutcome;
}

/// Converts a single [`ChatMessage`] into OpenAI API message format.
fn chat_message_to_openai(msg: &ChatMessage) -> anyhow::Result<ChatCompletionRequestMessage> {
    let content = msg.content.clone();
    let openai_msg: ChatCompletionRequestMessage = match msg.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    };
    Ok(openai_msg)
}
