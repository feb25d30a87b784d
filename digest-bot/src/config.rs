//! Bot configuration loaded from environment variables (after `.env`).

use anyhow::{Context, Result};
use digest_core::{BotMode, ChannelSettings, DEFAULT_SUPPORTED_MODELS};
use llm_client::EnvLlmConfig;
use std::env;

use crate::logger::DEFAULT_LOG_FILE;

pub const DEFAULT_MAIN_MODEL: &str = "google/gemini-2.5-flash-preview-05-20";
pub const DEFAULT_ERROR_MODEL: &str = "google/gemini-2.0-flash-001";

/// Everything the bot needs to start.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// BOT_TOKEN (or `--token`)
    pub bot_token: String,
    /// TELEGRAM_API_URL or TELOXIDE_API_URL
    pub telegram_api_url: Option<String>,
    /// LOG_FILE
    pub log_file: String,
    /// Model endpoint (OPENAI_API_KEY, OPENAI_BASE_URL, HTTP_REFERER, APP_TITLE)
    pub llm: EnvLlmConfig,
    /// Default record: MAIN_MODEL, ERROR_MODEL, MAIN_PROMPT, ERROR_PROMPT, TEMPERATURE
    pub defaults: ChannelSettings,
    /// SUPPORTED_MODELS, comma separated
    pub supported_models: Vec<String>,
    /// ADMIN_USERNAME
    pub admin_username: Option<String>,
    /// BOT_MODE
    pub mode: BotMode,
    /// CHANNELS_FILE
    pub channels_file: String,
    /// CHANNEL_CONFIG_FILE
    pub channel_config_file: String,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

impl BotConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let bot_token = match token {
            Some(t) => t,
            None => env::var("BOT_TOKEN").context("BOT_TOKEN not set")?,
        };
        let telegram_api_url = env::var("TELEGRAM_API_URL")
            .or_else(|_| env::var("TELOXIDE_API_URL"))
            .ok();
        let log_file = var_or("LOG_FILE", DEFAULT_LOG_FILE);
        let llm = EnvLlmConfig::from_env()?;

        let temperature = match env::var("TEMPERATURE") {
            Ok(t) => t
                .trim()
                .parse::<f32>()
                .with_context(|| format!("TEMPERATURE is not a number: {}", t))?,
            Err(_) => digest_core::channel_config::DEFAULT_TEMPERATURE,
        };
        let defaults = ChannelSettings {
            main_model: var_or("MAIN_MODEL", DEFAULT_MAIN_MODEL),
            error_model: var_or("ERROR_MODEL", DEFAULT_ERROR_MODEL),
            main_prompt: var_or("MAIN_PROMPT", prompt::DEFAULT_MAIN_PROMPT),
            error_prompt: var_or("ERROR_PROMPT", prompt::DEFAULT_ERROR_PROMPT),
            temperature,
        };

        let supported_models = match env::var("SUPPORTED_MODELS") {
            Ok(list) if !list.trim().is_empty() => list
                .split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
            _ => DEFAULT_SUPPORTED_MODELS.iter().map(|m| m.to_string()).collect(),
        };

        let admin_username = env::var("ADMIN_USERNAME")
            .ok()
            .map(|u| u.trim().trim_start_matches('@').to_string())
            .filter(|u| !u.is_empty());

        let mode = var_or("BOT_MODE", "info")
            .parse::<BotMode>()
            .map_err(anyhow::Error::msg)?;

        Ok(Self {
            bot_token,
            telegram_api_url,
            log_file,
            llm,
            defaults,
            supported_models,
            admin_username,
            mode,
            channels_file: var_or("CHANNELS_FILE", "channels.yaml"),
            channel_config_file: var_or("CHANNEL_CONFIG_FILE", "channel_config.json"),
        })
    }

    /// Validate config (URLs must parse, temperature in the range the API accepts).
    pub fn validate(&self) -> Result<()> {
        if let Some(ref url_str) = self.telegram_api_url {
            if reqwest::Url::parse(url_str).is_err() {
                anyhow::bail!(
                    "TELEGRAM_API_URL (or TELOXIDE_API_URL) is set but not a valid URL: {}",
                    url_str
                );
            }
        }
        if reqwest::Url::parse(&self.llm.openai_base_url).is_err() {
            anyhow::bail!("OPENAI_BASE_URL is not a valid URL: {}", self.llm.openai_base_url);
        }
        if !(0.0..=2.0).contains(&self.defaults.temperature) {
            anyhow::bail!(
                "TEMPERATURE must be between 0 and 2, got {}",
                self.defaults.temperature
            );
        }
        if self.bot_token.trim().is_empty() {
            anyhow::bail!("BOT_TOKEN is empty");
        }
        Ok(())
    }
}
