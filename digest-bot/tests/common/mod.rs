//! Shared fixtures: recording [`Bot`], scripted model client and config over temp files.

#![allow(dead_code)]

use async_trait::async_trait;
use digest_bot::{Bot, BotConfig, BotError};
use digest_core::{BotMode, ChannelSettings, Reply};
use llm_client::{CompletionRequest, EnvLlmConfig, LlmClient, ModelOutcome};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const MAIN_MODEL: &str = "google/gemini-2.0-flash-001";
pub const ERROR_MODEL: &str = "qwen/qwen3-14b:free";
pub const BOT: &str = "digest_bot";
pub const ADMIN: &str = "boss";

/// Records every `send_reply(chat_id, reply)`; optionally fails every send.
#[derive(Default)]
pub struct MockBot {
    pub sent: Mutex<Vec<(i64, Reply)>>,
    fail: bool,
}

impl MockBot {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            sent: Mutex::new(Vec::new()),
            fail: true,
        })
    }

    pub fn sent(&self) -> Vec<(i64, Reply)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Bot for MockBot {
    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<(), BotError> {
        self.sent.lock().unwrap().push((chat_id, reply.clone()));
        if self.fail {
            return Err(BotError::Other("send refused".to_string()));
        }
        Ok(())
    }
}

/// Main model echoes a fixed summary; error model voices `"voiced: <error>"`.
pub struct MockLlm {
    summary: String,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    pub fn new(summary: &str) -> Arc<Self> {
        Arc::new(Self {
            summary: summary.to_string(),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, request: CompletionRequest) -> ModelOutcome {
        let outcome = if request.model == ERROR_MODEL {
            let payload: serde_json::Value = serde_json::from_str(&request.user_turn).unwrap();
            let error = payload["error"].as_str().unwrap_or_default().to_string();
            ModelOutcome::Text(serde_json::json!({ "response": format!("voiced: {}", error) }).to_string())
        } else {
            ModelOutcome::Text(self.summary.clone())
        };
        self.requests.lock().unwrap().push(request);
        outcome
    }
}

/// A loaded-looking config whose state files live in a fresh temp dir.
pub fn config(mode: BotMode) -> (BotConfig, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = BotConfig {
        bot_token: "123:test".to_string(),
        telegram_api_url: None,
        log_file: dir.path().join("logs/bot.log").to_string_lossy().into_owned(),
        llm: EnvLlmConfig {
            openai_api_key: "sk-test-key-0000".to_string(),
            openai_base_url: "https://openrouter.ai/api/v1".to_string(),
            http_referer: None,
            app_title: None,
        },
        defaults: ChannelSettings {
            main_model: MAIN_MODEL.to_string(),
            error_model: ERROR_MODEL.to_string(),
            main_prompt: "Summarize.".to_string(),
            error_prompt: "Grumpy dwarf.".to_string(),
            temperature: 1.0,
        },
        supported_models: vec![MAIN_MODEL.to_string(), ERROR_MODEL.to_string()],
        admin_username: Some(ADMIN.to_string()),
        mode,
        channels_file: dir.path().join("channels.yaml").to_string_lossy().into_owned(),
        channel_config_file: dir
            .path()
            .join("channel_config.json")
            .to_string_lossy()
            .into_owned(),
    };
    (config, dir)
}

/// Holds every main-model answer until [`GatedLlm::release`] is called.
pub struct GatedLlm {
    gate: tokio::sync::Semaphore,
    summary: String,
}

impl GatedLlm {
    pub fn new(summary: &str) -> Arc<Self> {
        Arc::new(Self {
            gate: tokio::sync::Semaphore::new(0),
            summary: summary.to_string(),
        })
    }

    pub fn release(&self) {
        self.gate.add_permits(1);
    }
}

#[async_trait]
impl LlmClient for GatedLlm {
    async fn complete(&self, _request: CompletionRequest) -> ModelOutcome {
        let _permit = self.gate.acquire().await.unwrap();
        ModelOutcome::Text(self.summary.clone())
    }
}
