use anyhow::Result;
use digest_core::{ChannelRegistry, ConfigStore, DigestService, ModelCatalog, ServiceOptions};
use llm_client::{LlmClient, OpenAILlmClient};
use openai_client::mask_token;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, instrument, warn};

use crate::bot::{Bot as ReplySender, TelegramBotAdapter};
use crate::command::Command;
use crate::config::BotConfig;
use crate::handler::schema;
use crate::logger::init_tracing;

/// Loads persisted state and assembles the service around the given model client.
#[instrument(skip_all)]
pub async fn build_service(config: &BotConfig, llm: Arc<dyn LlmClient>) -> DigestService {
    let store = Arc::new(ConfigStore::load(&config.channel_config_file, config.defaults.clone()).await);
    let registry = ChannelRegistry::load(&config.channels_file).await;
    let catalog = ModelCatalog::new(config.supported_models.iter().cloned());
    info!(
        channels = registry.len().await,
        overrides = store.channels().await.len(),
        "Loaded persisted state"
    );
    DigestService::new(
        llm,
        store,
        registry,
        catalog,
        ServiceOptions {
            mode: config.mode,
            admin_username: config.admin_username.clone(),
        },
    )
}

fn build_teloxide_bot(config: &BotConfig) -> Bot {
    let bot = Bot::new(config.bot_token.clone());
    if let Some(ref url_str) = config.telegram_api_url {
        match reqwest::Url::parse(url_str) {
            Ok(url) => bot.set_api_url(url),
            Err(e) => {
                error!(error = %e, url = %url_str, "Invalid TELEGRAM_API_URL, using default");
                bot
            }
        }
    } else {
        bot
    }
}

/// Main entry: validate config, init logging, load state, then dispatch updates until Ctrl-C.
#[instrument(skip(config))]
pub async fn run_bot(config: BotConfig) -> Result<()> {
    config.validate()?;
    init_tracing(&config.log_file)?;

    info!(
        base_url = %config.llm.openai_base_url,
        api_key = %mask_token(&config.llm.openai_api_key),
        mode = %config.mode,
        main_model = %config.defaults.main_model,
        error_model = %config.defaults.error_model,
        "Initializing bot"
    );

    let llm: Arc<dyn LlmClient> = Arc::new(OpenAILlmClient::from_config(&config.llm)?);
    let service = Arc::new(build_service(&config, llm).await);

    let bot = build_teloxide_bot(&config);
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }
    let sender: Arc<dyn ReplySender> = Arc::new(TelegramBotAdapter::new(bot.clone()));

    info!("Bot started successfully");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![Arc::clone(&service), sender])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("Dispatcher stopped, saving state");
    if let Err(e) = service.shutdown().await {
        error!(error = %e, "Failed to save state on shutdown");
    }
    Ok(())
}
