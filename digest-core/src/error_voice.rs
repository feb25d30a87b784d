//! Error-voice engine: asks the channel's error model to phrase a failure in persona.
//!
//! The model receives `{"context": error_prompt, "error": description}` and must answer
//! `{"response": "..."}`. Replies are parsed defensively and raw model output is never
//! returned; every failure collapses to a fixed phrase.

use std::sync::{Arc, OnceLock};

use llm_client::{CompletionRequest, LlmClient, ModelOutcome};
use prompt::ERROR_VOICE_INSTRUCTION;
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use crate::channel_config::ConfigStore;

/// Generation ceiling for error phrasing.
pub const ERROR_VOICE_MAX_TOKENS: u32 = 10000;

/// Returned when the reply cannot be parsed or the call fails.
pub const PARSE_FAILURE: &str = "Error parsing model response";
/// Returned when the reply is JSON without a usable `response` field.
pub const MISSING_RESPONSE: &str = "Произошла ошибка при обработке запроса.";

static JSON_OBJECT_RE: OnceLock<Regex> = OnceLock::new();

fn json_object_re() -> &'static Regex {
    JSON_OBJECT_RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("object pattern is valid"))
}

/// Removes a leading ```` ```json ```` / ```` ``` ```` fence and a trailing ```` ``` ````, then trims.
fn strip_fence(raw: &str) -> &str {
    let text = raw.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}

fn response_field(value: &Value) -> String {
    match value.get("response").and_then(Value::as_str) {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => MISSING_RESPONSE.to_string(),
    }
}

/// Extracts the `response` field from a model reply.
pub fn parse_voice_reply(raw: &str) -> String {
    let text = strip_fence(raw);
    if let Ok(value) = serde_json::from_str::<Value>(text) {
        return response_field(&value);
    }
    debug!(reply = %text, "Reply is not plain JSON, searching for an object");
    json_object_re()
        .find(text)
        .and_then(|m| serde_json::from_str::<Value>(m.as_str()).ok())
        .map(|value| response_field(&value))
        .unwrap_or_else(|| PARSE_FAILURE.to_string())
}

pub struct ErrorVoice {
    llm: Arc<dyn LlmClient>,
    config: Arc<ConfigStore>,
}

impl ErrorVoice {
    pub fn new(llm: Arc<dyn LlmClient>, config: Arc<ConfigStore>) -> Self {
        Self { llm, config }
    }

    /// In-persona message for `error_context`. Never fails.
    #[instrument(skip(self))]
    pub async fn voice_error(&self, channel_id: &str, error_context: &str) -> String {
        let cfg = self.config.resolve(channel_id).await.settings;
        let payload = json!({ "context": cfg.error_prompt, "error": error_context });
        let request = CompletionRequest {
            model: cfg.error_model,
            system_turns: vec![ERROR_VOICE_INSTRUCTION.to_string()],
            user_turn: payload.to_string(),
            max_tokens: ERROR_VOICE_MAX_TOKENS,
            temperature: cfg.temperature,
        };
        match self.llm.complete(request).await {
            ModelOutcome::Text(text) => parse_voice_reply(&text),
            ModelOutcome::ModelError { code, message } => {
                warn!(code = %code, message = %message, "Error model returned an error");
                PARSE_FAILURE.to_string()
            }
            ModelOutcome::TransportFailure(detail) => {
                warn!(detail = %detail, "Error model request failed");
                PARSE_FAILURE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fenced_json() {
        assert_eq!(parse_voice_reply("```json\n{\"response\":\"X\"}\n```"), "X");
        assert_eq!(parse_voice_reply("```\n{\"response\":\"Y\"}```"), "Y");
    }

    #[test]
    fn test_embedded_object() {
        assert_eq!(
            parse_voice_reply("Sure! Here you go:\n{\"response\": \"Ну что ж ты\"}\nBye"),
            "Ну что ж ты"
        );
    }

    #[test]
    fn test_garbage_never_echoed() {
        let garbage = "I refuse to answer in JSON { nope";
        let out = parse_voice_reply(garbage);
        assert_eq!(out, PARSE_FAILURE);
        assert_ne!(out, garbage);
    }

    #[test]
    fn test_missing_response_field() {
        assert_eq!(parse_voice_reply("{\"answer\": \"x\"}"), MISSING_RESPONSE);
        assert_eq!(parse_voice_reply("{\"response\": 42}"), MISSING_RESPONSE);
        assert_eq!(parse_voice_reply("[1, 2]"), MISSING_RESPONSE);
    }
}
