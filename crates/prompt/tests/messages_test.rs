//! Unit tests for the prompt message model and [`prompt::build_messages`].
//!
//! Verifies role constructors, system-then-user ordering, and the instruction texts.
//! External interactions: none (pure function tests).

use prompt::{
    build_messages, ChatMessage, MessageRole, ASK_INSTRUCTION, ERROR_VOICE_EMPTY_PHRASE,
    ERROR_VOICE_INSTRUCTION, MARKUP_INSTRUCTION,
};

/// **Test: ChatMessage::system/user/assistant set role and content correctly.**
#[test]
fn chat_message_constructors() {
    let s = ChatMessage::system("sys");
    assert!(matches!(s.role, MessageRole::System));
    assert_eq!(s.content, "sys");
    let u = ChatMessage::user("usr");
    assert!(matches!(u.role, MessageRole::User));
    assert_eq!(u.content, "usr");
    let a = ChatMessage::assistant("ast");
    assert!(matches!(a.role, MessageRole::Assistant));
    assert_eq!(a.content, "ast");
}

/// **Test: System turns keep their order and the user turn is always last.**
#[test]
fn build_messages_orders_system_then_user() {
    let msgs = build_messages([MARKUP_INSTRUCTION, "Summarize briefly."], "@alice: hi\n");
    assert_eq!(msgs.len(), 3);
    assert!(matches!(msgs[0].role, MessageRole::System));
    assert_eq!(msgs[0].content, MARKUP_INSTRUCTION);
    assert!(matches!(msgs[1].role, MessageRole::System));
    assert_eq!(msgs[1].content, "Summarize briefly.");
    assert!(matches!(msgs[2].role, MessageRole::User));
    assert_eq!(msgs[2].content, "@alice: hi\n");
}

/// **Test: With no system turns the result is a single user message.**
#[test]
fn build_messages_without_system_turns() {
    let msgs = build_messages(Vec::<String>::new(), "What is Rust?");
    assert_eq!(msgs, vec![ChatMessage::user("What is Rust?")]);
}

/// **Test: The markup instruction names every allowed inline tag.**
#[test]
fn markup_instruction_lists_allowed_tags() {
    for tag in ["<b>", "<i>", "<u>", "<s>", "<a href", "<blockquote>"] {
        assert!(MARKUP_INSTRUCTION.contains(tag), "missing {tag}");
    }
}

/// **Test: The error-voice contract names the response field and the fallback phrase.**
#[test]
fn error_voice_instruction_describes_contract() {
    assert!(ERROR_VOICE_INSTRUCTION.contains("\"response\""));
    assert!(ERROR_VOICE_INSTRUCTION.contains("\"context\""));
    assert!(ERROR_VOICE_INSTRUCTION.contains(ERROR_VOICE_EMPTY_PHRASE));
    assert!(ASK_INSTRUCTION.contains("Russian"));
}
