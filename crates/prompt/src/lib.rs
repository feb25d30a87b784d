//! # Prompt
//!
//! Chat message model and the fixed instruction texts used when talking to the model.
//!
//! ## Requests
//!
//! Every request is an ordered list of [`ChatMessage`]: zero or more **system** turns
//! (instructions, persona) followed by exactly one **user** turn (transcript, question,
//! or error payload). [`build_messages`] assembles that list.
//!
//! ## External interactions
//!
//! - **AI models**: the messages are sent to an OpenAI-compatible chat completion API.

/// Role of a message, one-to-one with OpenAI Chat Completions API `role` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageRole {
    /// System instruction (API `role: "system"`).
    System,
    /// User message (API `role: "user"`).
    User,
    /// Assistant message (API `role: "assistant"`).
    Assistant,
}

/// A single chat message, one-to-one with one element of OpenAI `messages` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

/// Restricts the summary markup to the inline tags Telegram HTML renders and the sanitizer keeps.
pub const MARKUP_INSTRUCTION: &str = "Format the answer for Telegram HTML. You may only use these tags: \
<b>bold</b>, <i>italic</i>, <u>underline</u>, <s>strikethrough</s>, <a href=\"URL\">link</a> and \
<blockquote>quote</blockquote>. Do not use Markdown, headings, lists markup or any other HTML tag.";

/// Fixed persona for direct questions; not configurable per channel.
pub const ASK_INSTRUCTION: &str = "You are a helpful assistant. Give a clean answer in Russian. \
Format it for Telegram HTML: <b>bold</b> for titles, <i>italic</i> for emphasis, plain text for everything else.";

/// Phrase the error model must use when it cannot comply.
pub const ERROR_VOICE_EMPTY_PHRASE: &str = "Не знаю что ответить";

/// Contract for the error model: input is `{"context": persona, "error": text}`, output is `{"response": phrase}`.
pub const ERROR_VOICE_INSTRUCTION: &str = "The input is a JSON object. The field \"context\" describes the \
style in which you must react to the error given in the field \"error\". Answer with a JSON object that has \
exactly one field, \"response\", holding your reply, for example \
{\"response\": \"Oh dear, the number has to be positive\"}. Write nothing outside the JSON object. \
If you do not know what to answer, reply with {\"response\": \"Не знаю что ответить\"} and no other phrase.";

/// Built-in summarization prompt of the default record.
pub const DEFAULT_MAIN_PROMPT: &str = "A conversation is going on in the chat. Write a short summary of it in \
Russian: the main messages that kept the discussion going and the participants grouped by topic. \
Do not copy the messages, ignore spam.";

/// Built-in error persona of the default record.
pub const DEFAULT_ERROR_PROMPT: &str = "You are a grumpy, sarcastic character in a game who reacts to every \
mistake of the player with a short witty remark in Russian.";

/// Builds the message list for one request: every system turn in order, then the user turn.
pub fn build_messages<I, S>(system_turns: I, user_turn: impl Into<String>) -> Vec<ChatMessage>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut messages: Vec<ChatMessage> = system_turns
        .into_iter()
        .map(|s| ChatMessage::system(s))
        .collect();
    messages.push(ChatMessage::user(user_turn));
    messages
}
