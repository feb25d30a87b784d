//! # OpenAI-compatible API client
//!
//! Non-streaming chat completion against any OpenAI-compatible endpoint (OpenAI itself,
//! OpenRouter, local proxies). Requests are built with [async-openai] types and posted
//! with reqwest; the response body is inspected as raw JSON so that error payloads are
//! recognized whatever the HTTP status and whatever JSON type the provider uses for
//! `error.code`.
//!
//! Every call is a single HTTP request. Nothing is retried.

use async_openai::types::CreateChatCompletionRequestArgs;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde_json::Value;
use thiserror::Error;
use tracing;

pub use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};

/// Longest body excerpt kept in a transport error.
const BODY_EXCERPT_CHARS: usize = 200;

/// Masks an API key/token for safe logging: shows first 7 chars + "***" + last 4 chars.
/// If length <= 11, returns "***" to avoid leaking any part of the key.
pub fn mask_token(token: &str) -> String {
    let len = token.len();
    if len <= 11 || !token.is_char_boundary(7) || !token.is_char_boundary(len - 4) {
        return "***".to_string();
    }
    format!("{}***{}", &token[..7], &token[len - 4..])
}

/// Per-call sampling parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Why a chat completion produced no text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// The service answered with an `{"error": {...}}` payload.
    #[error("API error {code}: {message}")]
    Api { code: String, message: String },

    /// No usable answer: network failure, non-JSON body, unexpected shape.
    #[error("{0}")]
    Transport(String),
}

/// Reads an `{"error": {"code": ..., "message": ...}}` payload. `code` may be a string or a
/// number; when absent the HTTP status stands in for it.
pub fn api_error_from_body(status: u16, body: &Value) -> Option<ChatError> {
    let error = body.get("error")?;
    let code = match error.get("code") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Null) | None if !(200..300).contains(&status) => status.to_string(),
        Some(Value::Null) | None => "unknown".to_string(),
        Some(other) => other.to_string(),
    };
    let message = match error {
        Value::String(s) => s.clone(),
        _ => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    };
    Some(ChatError::Api { code, message })
}

/// First choice's `message.content`; a missing or null content is empty text.
fn first_choice_content(body: &Value) -> Option<String> {
    let choice = body.get("choices")?.as_array()?.first()?;
    Some(
        choice
            .get("message")
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    )
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

/// OpenAI chat client: one reqwest client with the attribution headers, one endpoint.
#[derive(Clone)]
pub struct OpenAIClient {
    http: reqwest::Client,
    completions_url: String,
    api_key: String,
}

impl OpenAIClient {
    /// Builds a client for `base_url` with extra headers attached to every request
    /// (OpenRouter reads `HTTP-Referer` and `X-Title` for attribution).
    ///
    /// Fails when a header name or value is not valid HTTP.
    pub fn with_headers(
        api_key: String,
        base_url: String,
        headers: &[(&str, &str)],
    ) -> anyhow::Result<Self> {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(
                HeaderName::from_bytes(name.as_bytes())?,
                HeaderValue::from_str(value)?,
            );
        }
        let http = reqwest::Client::builder().default_headers(map).build()?;
        Ok(Self {
            http,
            completions_url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        })
    }

    /// Sends a chat completion request and returns the first choice's content.
    ///
    /// Logs masked API key, request JSON, and token usage.
    pub async fn chat_completion(
        &self,
        model: &str,
        messages: Vec<ChatCompletionRequestMessage>,
        params: CompletionParams,
    ) -> Result<String, ChatError> {
        tracing::info!(
            model = %model,
            message_count = messages.len(),
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            api_key = %mask_token(&self.api_key),
            "chat_completion request"
        );

        #[allow(deprecated)]
        let request = CreateChatCompletionRequestArgs::default()
            .model(model)
            .messages(messages)
            .max_tokens(params.max_tokens)
            .temperature(params.temperature)
            .build()
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        if let Ok(json) = serde_json::to_string(&request) {
            tracing::debug!(request_json = %json, "chat_completion request JSON");
        }

        let response = self
            .http
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChatError::Transport(e.to_string()))?;

        let body: Value = serde_json::from_str(&text).map_err(|e| {
            ChatError::Transport(format!(
                "HTTP {}: response is not JSON ({}): {}",
                status,
                e,
                excerpt(&text)
            ))
        })?;

        // Providers may report errors with HTTP 200, so the body is checked first.
        if let Some(err) = api_error_from_body(status.as_u16(), &body) {
            return Err(err);
        }
        if !status.is_success() {
            return Err(ChatError::Transport(format!("HTTP {}: {}", status, excerpt(&text))));
        }

        if let Some(usage) = body.get("usage") {
            tracing::info!(
                prompt_tokens = usage.get("prompt_tokens").and_then(serde_json::Value::as_u64),
                completion_tokens = usage.get("completion_tokens").and_then(serde_json::Value::as_u64),
                total_tokens = usage.get("total_tokens").and_then(serde_json::Value::as_u64),
                "chat_completion usage"
            );
        }

        first_choice_content(&body)
            .ok_or_else(|| ChatError::Transport("No choices in chat completion response".to_string()))
    }
}
