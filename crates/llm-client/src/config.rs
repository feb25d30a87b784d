//! Model endpoint configuration loaded from environment variables.

use anyhow::{Context, Result};
use std::env;

/// Default endpoint: OpenRouter's OpenAI-compatible API.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_HTTP_REFERER: &str = "digest-bot";
pub const DEFAULT_APP_TITLE: &str = "Telegram Bot";

/// Endpoint settings loaded from environment variables.
#[derive(Debug, Clone)]
pub struct EnvLlmConfig {
    pub openai_api_key: String,
    pub openai_base_url: String,
    /// Sent as `HTTP-Referer`; a blank variable disables the header.
    pub http_referer: Option<String>,
    /// Sent as `X-Title`; a blank variable disables the header.
    pub app_title: Option<String>,
}

impl EnvLlmConfig {
    /// Load from environment variables. `OPENAI_API_KEY` is required.
    pub fn from_env() -> Result<Self> {
        let openai_api_key = env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
        let openai_base_url =
            env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Ok(Self {
            openai_api_key,
            openai_base_url,
            http_referer: header_var("HTTP_REFERER", DEFAULT_HTTP_REFERER),
            app_title: header_var("APP_TITLE", DEFAULT_APP_TITLE),
        })
    }

    /// Attribution headers to attach to every request.
    pub fn headers(&self) -> Vec<(&'static str, &str)> {
        let mut headers = Vec::new();
        if let Some(referer) = self.http_referer.as_deref() {
            headers.push(("HTTP-Referer", referer));
        }
        if let Some(title) = self.app_title.as_deref() {
            headers.push(("X-Title", title));
        }
        headers
    }
}

fn header_var(key: &str, default: &str) -> Option<String> {
    match env::var(key) {
        Ok(v) if v.trim().is_empty() => None,
        Ok(v) => Some(v),
        Err(_) => Some(default.to_string()),
    }
}
