//! Core types: buffered message, reply format.

/// Longest reply-target excerpt carried into a transcript line.
const REPLY_EXCERPT_CHARS: usize = 80;

/// An inbound message as kept in a channel's history. Absent parts are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferedMessage {
    /// Sender handle without the leading `@`.
    pub sender_handle: Option<String>,
    /// Sender display name (full name or chat title).
    pub sender_name: Option<String>,
    /// Message text, or the caption for media.
    pub text: Option<String>,
    /// Text of the message this one replies to.
    pub reply_to: Option<String>,
    /// Who the message was forwarded from.
    pub forwarded_from: Option<String>,
}

impl BufferedMessage {
    /// Plain text message from a handle; used by tests and by the debug echo.
    pub fn from_handle(handle: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            sender_handle: Some(handle.into()),
            text: Some(text.into()),
            ..Default::default()
        }
    }

    /// Text if present and not blank.
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// `@handle`, else display name, plus reply and forward suffixes. `None` when no sender is known.
    pub fn sender_label(&self) -> Option<String> {
        let mut label = match (&self.sender_handle, &self.sender_name) {
            (Some(handle), _) if !handle.is_empty() => format!("@{}", handle),
            (_, Some(name)) if !name.is_empty() => name.clone(),
            _ => return None,
        };
        if let Some(reply) = self.reply_to.as_deref().filter(|r| !r.trim().is_empty()) {
            label.push_str(&format!(" (in reply to \"{}\")", excerpt(reply)));
        }
        if let Some(origin) = self.forwarded_from.as_deref().filter(|f| !f.is_empty()) {
            label.push_str(&format!(" (forwarded from {})", origin));
        }
        Some(label)
    }

    /// One transcript line `"{label}: {text}"`, or `None` for messages without text.
    pub fn render(&self) -> Option<String> {
        let body = self.body()?;
        Some(match self.sender_label() {
            Some(label) => format!("{}: {}", label, body),
            None => body.to_string(),
        })
    }
}

fn excerpt(text: &str) -> String {
    let text = text.trim();
    if text.chars().count() <= REPLY_EXCERPT_CHARS {
        return text.to_string();
    }
    let cut: String = text.chars().take(REPLY_EXCERPT_CHARS).collect();
    format!("{}…", cut)
}

/// How a reply must be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyFormat {
    /// Telegram HTML parse mode.
    Html,
    Plain,
}

/// One outbound message produced by the core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub format: ReplyFormat,
}

impl Reply {
    pub fn html(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Html,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format: ReplyFormat::Plain,
        }
    }
}
