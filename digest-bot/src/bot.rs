//! Outbound side: the [`Bot`] trait and the teloxide-backed [`TelegramBotAdapter`].
//! Handlers only talk to `dyn Bot`, so tests substitute a recording mock.

use async_trait::async_trait;
use digest_core::{Reply, ReplyFormat};
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::Requester;
use teloxide::types::{ChatId, ParseMode};
use thiserror::Error;
use tracing::warn;

/// Telegram rejects messages longer than this.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

#[derive(Error, Debug)]
pub enum BotError {
    #[error("Telegram request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("Bot error: {0}")]
    Other(String),
}

/// Sends replies to a chat.
#[async_trait]
pub trait Bot: Send + Sync {
    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<(), BotError>;
}

/// Thin wrapper around teloxide::Bot that implements [`Bot`].
pub struct TelegramBotAdapter {
    bot: teloxide::Bot,
}

impl TelegramBotAdapter {
    pub fn new(bot: teloxide::Bot) -> Self {
        Self { bot }
    }

    async fn send_chunk(&self, chat_id: i64, text: &str, format: ReplyFormat) -> Result<(), BotError> {
        match format {
            ReplyFormat::Html => {
                let sent = self
                    .bot
                    .send_message(ChatId(chat_id), text.to_string())
                    .parse_mode(ParseMode::Html)
                    .await;
                if let Err(e) = sent {
                    // Model output occasionally slips past the sanitizer as malformed markup.
                    warn!(chat_id = chat_id, error = %e, "HTML send failed, retrying as plain text");
                    self.bot.send_message(ChatId(chat_id), text.to_string()).await?;
                }
            }
            ReplyFormat::Plain => {
                self.bot.send_message(ChatId(chat_id), text.to_string()).await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Bot for TelegramBotAdapter {
    async fn send_reply(&self, chat_id: i64, reply: &Reply) -> Result<(), BotError> {
        let chunks = match reply.format {
            ReplyFormat::Html => split_html(&reply.text, TELEGRAM_MESSAGE_LIMIT),
            ReplyFormat::Plain => split_message(&reply.text, TELEGRAM_MESSAGE_LIMIT),
        };
        for chunk in chunks {
            self.send_chunk(chat_id, &chunk, reply.format).await?;
        }
        Ok(())
    }
}

/// Splits `text` into pieces of at most `limit` chars, preferring newline boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;
    for line in text.split_inclusive('\n') {
        let line_len = line.chars().count();
        if current_len + line_len > limit && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        if line_len > limit {
            // A single line longer than the limit is cut hard.
            let chars: Vec<char> = line.chars().collect();
            for piece in chars.chunks(limit) {
                chunks.push(piece.iter().collect());
            }
            continue;
        }
        current.push_str(line);
        current_len += line_len;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[derive(Debug, Clone)]
struct OpenTag {
    name: String,
    opening: String,
}

enum Tag {
    Open(OpenTag),
    Close(String),
}

/// Splits Telegram HTML like [`split_message`], but every chunk stays well-formed: tags
/// open at a cut are closed at the end of the chunk and reopened at the start of the
/// next. Tags and entities are never cut.
pub fn split_html(text: &str, limit: usize) -> Vec<String> {
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }
    let mut chunks = Vec::new();
    let mut prefix = String::new();
    let mut prefix_len = 0usize;
    let mut body = String::new();
    let mut body_len = 0usize;
    let mut open: Vec<OpenTag> = Vec::new();
    // Byte offset in `body` just past the last newline, with the tags open there.
    let mut last_break: Option<(usize, Vec<OpenTag>)> = None;

    for token in html_tokens(text) {
        let tag = parse_tag(token);
        let token_len = token.chars().count();
        let own_closer = match &tag {
            Some(Tag::Open(t)) => t.name.len() + 3,
            _ => 0,
        };
        while !body.is_empty()
            && prefix_len + body_len + token_len + closers(&open).len() + own_closer > limit
        {
            let (at, stack) = last_break
                .take()
                .unwrap_or_else(|| (body.len(), open.clone()));
            let rest = body.split_off(at);
            chunks.push(format!("{}{}{}", prefix, body, closers(&stack)));
            prefix = openers(&stack);
            prefix_len = prefix.chars().count();
            body_len = rest.chars().count();
            body = rest;
        }

        match tag {
            Some(Tag::Open(t)) => open.push(t),
            Some(Tag::Close(name)) => {
                if let Some(i) = open.iter().rposition(|t| t.name == name) {
                    open.truncate(i);
                }
            }
            None => {}
        }
        body.push_str(token);
        body_len += token_len;
        if token == "\n" {
            last_break = Some((body.len(), open.clone()));
        }
    }
    if !body.is_empty() {
        chunks.push(format!("{}{}", prefix, body));
    }
    chunks
}

/// Cuts `text` into tags, entities and single characters.
fn html_tokens(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some(c) = rest.chars().next() {
        let end = match c {
            '<' => rest.find('>').map(|i| i + 1),
            '&' => rest
                .char_indices()
                .skip(1)
                .take(10)
                .find(|&(_, ch)| !(ch.is_ascii_alphanumeric() || ch == '#'))
                .filter(|&(_, ch)| ch == ';')
                .map(|(i, _)| i + 1),
            _ => None,
        }
        .unwrap_or(c.len_utf8());
        tokens.push(&rest[..end]);
        rest = &rest[end..];
    }
    tokens
}

fn parse_tag(token: &str) -> Option<Tag> {
    let inner = token.strip_prefix('<')?.strip_suffix('>')?;
    if let Some(name) = inner.strip_prefix('/') {
        return Some(Tag::Close(tag_name(name)));
    }
    if inner.ends_with('/') {
        return None;
    }
    let name = tag_name(inner);
    if name.is_empty() {
        return None;
    }
    Some(Tag::Open(OpenTag {
        name,
        opening: token.to_string(),
    }))
}

fn tag_name(s: &str) -> String {
    s.trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

fn openers(stack: &[OpenTag]) -> String {
    stack.iter().map(|t| t.opening.as_str()).collect()
}

fn closers(stack: &[OpenTag]) -> String {
    stack.iter().rev().map(|t| format!("</{}>", t.name)).collect()
}
