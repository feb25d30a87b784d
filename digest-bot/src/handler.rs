//! Update routing: commands, group/private messages and channel posts.

use std::sync::Arc;

use digest_core::{DigestService, PendingReply, Reply};
use teloxide::dispatching::{UpdateFilterExt, UpdateHandler};
use teloxide::prelude::{dptree, Message, ResponseResult, Update};
use teloxide::types::Me;
use teloxide::utils::command::BotCommands;
use teloxide::RequestError;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::adapters::TelegramMessageWrapper;
use crate::bot::Bot;
use crate::command::Command;

/// Builds the reply to a parsed command. Transport-free so it can be tested directly.
pub async fn command_reply(
    service: &DigestService,
    channel_id: &str,
    username: Option<&str>,
    cmd: Command,
    bot_username: &str,
) -> Reply {
    match cmd {
        Command::Start => service.start(bot_username),
        Command::Help => service.help(channel_id, bot_username).await,
        Command::Model(args) => service.model_command(channel_id, username, &args).await,
        Command::Prompt(args) => service.prompt_command(channel_id, username, &args).await,
        Command::ChatModel(args) => service.chat_model_command(channel_id, username, &args).await,
        Command::ChatPrompt(args) => service.chat_prompt_command(channel_id, username, &args).await,
        Command::Reset(args) => service.reset_command(channel_id, username, &args).await,
        Command::Ask(question) => service.ask(channel_id, &question).await,
        Command::Status => service.status().await,
    }
}

/// Sends every reply in order; send failures are logged and never abort the handler.
pub async fn deliver(sender: &dyn Bot, chat_id: i64, replies: &[Reply]) {
    for reply in replies {
        if let Err(e) = sender.send_reply(chat_id, reply).await {
            warn!(chat_id = chat_id, error = %e, "Failed to send reply");
        }
    }
}

/// Group and private messages: commands first, everything else goes to history/trigger.
#[instrument(skip_all, fields(chat_id = msg.chat.id.0))]
pub async fn handle_message(
    msg: Message,
    me: Me,
    service: Arc<DigestService>,
    sender: Arc<dyn Bot>,
) -> ResponseResult<()> {
    let wrapper = TelegramMessageWrapper(&msg);
    let channel_id = wrapper.channel_id();
    let bot_username = me.username();

    if let Some(text) = msg.text() {
        if let Ok(cmd) = Command::parse(text, bot_username) {
            info!(command = ?cmd, user = ?wrapper.username(), "Command received");
            let reply = command_reply(&service, &channel_id, wrapper.username(), cmd, bot_username).await;
            deliver(sender.as_ref(), msg.chat.id.0, &[reply]).await;
            return Ok(());
        }
    }

    let pending = service
        .accept_message(&channel_id, wrapper.to_buffered(), bot_username)
        .await;
    if let Some(pending) = pending {
        spawn_reply(service, sender, msg.chat.id.0, pending);
    }
    Ok(())
}

/// Runs the model step and delivery on its own task. Updates of one chat are handled in
/// order, so the chat's next messages are buffered while the model is still answering.
pub fn spawn_reply(
    service: Arc<DigestService>,
    sender: Arc<dyn Bot>,
    chat_id: i64,
    pending: PendingReply,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let replies = service.render(pending).await;
        deliver(sender.as_ref(), chat_id, &replies).await;
    })
}

/// Broadcast channel posts are only buffered.
#[instrument(skip_all, fields(chat_id = msg.chat.id.0))]
pub async fn handle_channel_post(msg: Message, service: Arc<DigestService>) -> ResponseResult<()> {
    let wrapper = TelegramMessageWrapper(&msg);
    service
        .on_channel_post(&wrapper.channel_id(), wrapper.to_buffered())
        .await;
    Ok(())
}

pub fn schema() -> UpdateHandler<RequestError> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_channel_post().endpoint(handle_channel_post))
}
