//! Shared fixtures: scripted [`LlmClient`] and a service wired to temp files.

#![allow(dead_code)]

use async_trait::async_trait;
use digest_core::{
    BotMode, ChannelRegistry, ChannelSettings, ConfigStore, DigestService, ModelCatalog,
    ServiceOptions,
};
use llm_client::{CompletionRequest, LlmClient, ModelOutcome};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

pub const MAIN_MODEL: &str = "google/gemini-2.0-flash-001";
pub const ERROR_MODEL: &str = "qwen/qwen3-14b:free";
pub const BOT: &str = "digest_bot";
pub const ADMIN: &str = "boss";

type Responder = dyn Fn(&CompletionRequest) -> ModelOutcome + Send + Sync;

/// Records every request and answers through a closure. No network.
pub struct MockLlm {
    responder: Box<Responder>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    pub fn new(responder: impl Fn(&CompletionRequest) -> ModelOutcome + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Main model answers `summary`; error model answers `{"response": "voiced: <error>"}`.
    pub fn standard(summary: &'static str) -> Arc<Self> {
        Self::new(move |req| {
            if req.model == ERROR_MODEL {
                let payload: serde_json::Value = serde_json::from_str(&req.user_turn).unwrap();
                let error = payload["error"].as_str().unwrap_or_default();
                ModelOutcome::Text(format!("```json\n{{\"response\": \"voiced: {}\"}}\n```", error))
            } else {
                ModelOutcome::Text(summary.to_string())
            }
        })
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, model: &str) -> Vec<CompletionRequest> {
        self.requests().into_iter().filter(|r| r.model == model).collect()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, request: CompletionRequest) -> ModelOutcome {
        let outcome = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        outcome
    }
}

pub fn defaults() -> ChannelSettings {
    ChannelSettings {
        main_model: MAIN_MODEL.to_string(),
        error_model: ERROR_MODEL.to_string(),
        main_prompt: "Summarize.".to_string(),
        error_prompt: "Grumpy dwarf.".to_string(),
        temperature: 1.0,
    }
}

/// Service over fresh temp files. Keep the `TempDir` alive for the test's duration.
pub async fn service(llm: Arc<MockLlm>, mode: BotMode) -> (DigestService, TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = Arc::new(ConfigStore::load(dir.path().join("channel_config.json"), defaults()).await);
    let registry = ChannelRegistry::load(dir.path().join("channels.yaml")).await;
    let svc = DigestService::new(
        llm,
        config,
        registry,
        ModelCatalog::default(),
        ServiceOptions {
            mode,
            admin_username: Some(ADMIN.to_string()),
        },
    );
    (svc, dir)
}
