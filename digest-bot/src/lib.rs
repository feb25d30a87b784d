//! # digest-bot
//!
//! Telegram transport for [`digest_core::DigestService`]: config loading, logging,
//! update routing, message conversion and reply delivery.

pub mod adapters;
pub mod bot;
pub mod cli;
pub mod command;
pub mod config;
pub mod handler;
pub mod logger;
pub mod runner;

pub use adapters::TelegramMessageWrapper;
pub use bot::{Bot, BotError, TelegramBotAdapter};
pub use cli::{Cli, Commands};
pub use command::Command;
pub use config::BotConfig;
pub use handler::{command_reply, deliver, schema, spawn_reply};
pub use logger::{init_tracing, DEFAULT_LOG_FILE};
pub use runner::{build_service, run_bot};

/// Loads config from the environment; `token` overrides BOT_TOKEN.
pub fn load_config(token: Option<String>) -> anyhow::Result<BotConfig> {
    BotConfig::load(token)
}
