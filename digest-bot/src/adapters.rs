use digest_core::BufferedMessage;
use teloxide::types::{Chat, Message, MessageOrigin};

/// Converts a Telegram message into the history entry the core buffers.
pub struct TelegramMessageWrapper<'a>(pub &'a Message);

impl<'a> TelegramMessageWrapper<'a> {
    pub fn to_buffered(&self) -> BufferedMessage {
        let (sender_handle, sender_name) = self.sender();
        BufferedMessage {
            sender_handle,
            sender_name,
            text: message_text(self.0),
            reply_to: self.0.reply_to_message().and_then(message_text),
            forwarded_from: self.0.forward_origin().map(origin_label),
        }
    }

    /// Chat id as the channel key used by the core.
    pub fn channel_id(&self) -> String {
        self.0.chat.id.0.to_string()
    }

    /// Sender handle without `@`, if the sender is a user with a username.
    pub fn username(&self) -> Option<&str> {
        self.0.from.as_ref().and_then(|u| u.username.as_deref())
    }

    fn sender(&self) -> (Option<String>, Option<String>) {
        if let Some(user) = self.0.from.as_ref() {
            return (user.username.clone(), Some(user.full_name()));
        }
        match self.0.sender_chat.as_ref() {
            Some(chat) => (chat.username().map(str::to_string), chat.title().map(str::to_string)),
            None => (None, None),
        }
    }
}

fn message_text(msg: &Message) -> Option<String> {
    msg.text().or_else(|| msg.caption()).map(str::to_string)
}

fn chat_label(chat: &Chat) -> String {
    match (chat.username(), chat.title()) {
        (Some(username), _) => format!("@{}", username),
        (None, Some(title)) => title.to_string(),
        (None, None) => chat.id.0.to_string(),
    }
}

fn origin_label(origin: &MessageOrigin) -> String {
    #[allow(unreachable_patterns)]
    match origin {
        MessageOrigin::User { sender_user, .. } => match sender_user.username.as_deref() {
            Some(username) => format!("@{}", username),
            None => sender_user.full_name(),
        },
        MessageOrigin::HiddenUser { sender_user_name, .. } => sender_user_name.clone(),
        MessageOrigin::Chat { sender_chat, .. } => chat_label(sender_chat),
        MessageOrigin::Channel { chat, .. } => chat_label(chat),
        _ => "unknown".to_string(),
    }
}
