//! [`LlmClient`] backed by `openai-client`.

use async_trait::async_trait;
use openai_client::{ChatError, CompletionParams, OpenAIClient};
use tracing::{instrument, warn};

use super::{chat_message_to_openai, CompletionRequest, EnvLlmConfig, LlmClient, ModelOutcome};

/// [`LlmClient`] over an OpenAI-compatible endpoint.
#[derive(Clone)]
pub struct OpenAILlmClient {
    client: OpenAIClient,
}

impl OpenAILlmClient {
    pub fn new(client: OpenAIClient) -> Self {
        Self { client }
    }

    /// Builds the client from endpoint settings, attaching attribution headers.
    pub fn from_config(config: &EnvLlmConfig) -> anyhow::Result<Self> {
        let client = OpenAIClient::with_headers(
            config.openai_api_key.clone(),
            config.openai_base_url.clone(),
            &config.headers(),
        )?;
        Ok(Self::new(client))
    }
}

/// Maps a failed call to an outcome: error payloads keep their code and message.
fn classify_error(err: ChatError) -> ModelOutcome {
    match err {
        ChatError::Api { code, message } => ModelOutcome::ModelError { code, message },
        ChatError::Transport(detail) => ModelOutcome::TransportFailure(detail),
    }
}

#[async_trait]
impl LlmClient for OpenAILlmClient {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> ModelOutcome {
        let mut messages = Vec::with_capacity(request.system_turns.len() + 1);
        for msg in &request.messages() {
            match chat_message_to_openai(msg) {
                Ok(m) => messages.push(m),
                Err(e) => {
                    warn!(error = %e, "Failed to build request message");
                    return ModelOutcome::TransportFailure(e.to_string());
                }
            }
        }
        let params = CompletionParams {
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };
        match self
            .client
            .chat_completion(&request.model, messages, params)
            .await
        {
            Ok(text) => ModelOutcome::Text(text),
            Err(e) => {
                warn!(error = %e, "Model call failed");
                classify_error(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// **Test: An API error becomes ModelError with its code and message.**
    #[test]
    fn classify_api_error() {
        let err = ChatError::Api {
            code: "429".to_string(),
            message: "Rate limit exceeded".to_string(),
        };
        assert_eq!(
            classify_error(err),
            ModelOutcome::ModelError {
                code: "429".to_string(),
                message: "Rate limit exceeded".to_string()
            }
        );
    }

    /// **Test: Anything else is a transport failure.**
    #[test]
    fn classify_other_error() {
        let err = ChatError::Transport("connection reset".to_string());
        assert!(matches!(
            classify_error(err),
            ModelOutcome::TransportFailure(detail) if detail.contains("connection reset")
        ));
    }
}
