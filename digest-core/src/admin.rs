//! Model and prompt administration for the default record and for single channels.
//!
//! Changing a default model requires the model to be in the [`ModelCatalog`]; `add`
//! extends the catalog unconditionally. Per-channel changes go straight to the
//! [`ConfigStore`]. Prompts are free text.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, instrument};

use crate::channel_config::{ConfigField, ConfigStore};

/// Models offered when no list is configured.
pub const DEFAULT_SUPPORTED_MODELS: &[&str] = &[
    "qwen/qwen3-235b-a22b:free",
    "qwen/qwen3-14b:free",
    "meta-llama/llama-3.2-3b-instruct:free",
    "meta-llama/llama-3.2-3b-instruct",
    "deepseek/deepseek-r1:free",
    "google/gemini-2.0-flash-001",
];

/// Outcome of an administrative change; `message` is shown to the caller or voiced on failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminOutcome {
    pub ok: bool,
    pub message: String,
}

impl AdminOutcome {
    fn ok(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    fn rejected(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Allow-list of model identifiers accepted as defaults.
pub struct ModelCatalog {
    models: RwLock<Vec<String>>,
}

impl ModelCatalog {
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list: Vec<String> = Vec::new();
        for m in models.into_iter().map(Into::into) {
            if !m.is_empty() && !list.contains(&m) {
                list.push(m);
            }
        }
        Self {
            models: RwLock::new(list),
        }
    }

    pub async fn contains(&self, model: &str) -> bool {
        self.models.read().await.iter().any(|m| m == model)
    }

    /// Appends if absent.
    pub async fn add(&self, model: &str) {
        let mut models = self.models.write().await;
        if !models.iter().any(|m| m == model) {
            models.push(model.to_string());
        }
    }

    pub async fn list(&self) -> Vec<String> {
        self.models.read().await.clone()
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_SUPPORTED_MODELS.iter().copied())
    }
}

fn invalid_kind(kind: &str) -> AdminOutcome {
    AdminOutcome::rejected(format!(
        "Invalid model type: {}. Use 'main' or 'error'",
        kind
    ))
}

pub struct Admin {
    config: Arc<ConfigStore>,
    catalog: ModelCatalog,
}

impl Admin {
    pub fn new(config: Arc<ConfigStore>, catalog: ModelCatalog) -> Self {
        Self { config, catalog }
    }

    pub fn catalog(&self) -> &ModelCatalog {
        &self.catalog
    }

    /// `kind` is `main`, `error` or `add` (defaults only).
    #[instrument(skip(self))]
    pub async fn set_model(&self, kind: &str, value: &str, channel_id: Option<&str>) -> AdminOutcome {
        let kind = kind.to_lowercase();
        let value = value.trim();
        if value.is_empty() {
            return AdminOutcome::rejected(format!("Invalid model: {}", value));
        }
        let outcome = match (kind.as_str(), channel_id) {
            ("main" | "error", Some(channel_id)) => {
                let field = if kind == "main" {
                    ConfigField::MainModel
                } else {
                    ConfigField::ErrorModel
                };
                self.config.update_field(channel_id, field, value).await;
                AdminOutcome::ok(format!(
                    "{} model for this chat changed to: {}",
                    capitalized(&kind),
                    value
                ))
            }
            ("add", Some(_)) => AdminOutcome::rejected(
                "Adding models is only possible for the global list".to_string(),
            ),
            ("main" | "error", None) => {
                if !self.catalog.contains(value).await {
                    return AdminOutcome::rejected(format!("Invalid model: {}", value));
                }
                let field = if kind == "main" {
                    ConfigField::MainModel
                } else {
                    ConfigField::ErrorModel
                };
                self.config.set_default(field, value).await;
                AdminOutcome::ok(format!("{} model changed to: {}", capitalized(&kind), value))
            }
            ("add", None) => {
                self.catalog.add(value).await;
                AdminOutcome::ok(format!("Model added to supported models: {}", value))
            }
            _ => invalid_kind(&kind),
        };
        info!(ok = outcome.ok, message = %outcome.message, "set_model");
        outcome
    }

    /// `kind` is `main` or `error`; any non-empty text is accepted.
    #[instrument(skip(self, text))]
    pub async fn set_prompt(&self, kind: &str, text: &str, channel_id: Option<&str>) -> AdminOutcome {
        let kind = kind.to_lowercase();
        let field = match kind.as_str() {
            "main" => ConfigField::MainPrompt,
            "error" => ConfigField::ErrorPrompt,
            _ => return invalid_kind(&kind),
        };
        let text = text.trim();
        if text.is_empty() {
            return AdminOutcome::rejected("Prompt text must not be empty".to_string());
        }
        let outcome = match channel_id {
            Some(channel_id) => {
                self.config.update_field(channel_id, field, text).await;
                AdminOutcome::ok(format!("{} prompt for this chat changed", capitalized(&kind)))
            }
            None => {
                self.config.set_default(field, text).await;
                AdminOutcome::ok(format!("{} prompt changed", capitalized(&kind)))
            }
        };
        info!(ok = outcome.ok, message = %outcome.message, "set_prompt");
        outcome
    }

    /// Resets one field by name, or the whole channel override when `field` is `None`.
    pub async fn reset(&self, channel_id: &str, field: Option<&str>) -> AdminOutcome {
        let field = match field.map(str::parse::<ConfigField>).transpose() {
            Ok(field) => field,
            Err(e) => {
                return AdminOutcome::rejected(format!(
                    "{}. Use one of: main_model, error_model, main_prompt, error_prompt",
                    e
                ))
            }
        };
        if !self.config.reset(channel_id, field).await {
            return AdminOutcome::ok("This chat already uses the default settings");
        }
        match field {
            Some(field) => AdminOutcome::ok(format!("{} reset to default", field)),
            None => AdminOutcome::ok("Chat settings reset to defaults"),
        }
    }
}

fn capitalized(kind: &str) -> String {
    let mut chars = kind.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
