//! Integration tests for [`digest_core::DigestService`] message handling.
//!
//! Covers: buffering, trigger parsing, summary header, error voicing, debug mode and
//! registry persistence. Uses a scripted model client and temp files; no network.

mod common;

use common::{defaults, service, MockLlm, ADMIN, BOT, ERROR_MODEL, MAIN_MODEL};
use digest_core::{
    BotMode, BufferedMessage, ChannelRegistry, ConfigStore, DigestService, ModelCatalog,
    PendingReply, ReplyFormat, ServiceOptions, UserInputError,
};
use llm_client::ModelOutcome;
use prompt::MARKUP_INSTRUCTION;
use std::sync::Arc;

fn msg(handle: &str, text: &str) -> BufferedMessage {
    BufferedMessage::from_handle(handle, text)
}

/// **Test: Plain messages are buffered silently; the trigger is not.**
#[tokio::test]
async fn test_messages_buffered_trigger_excluded() {
    let llm = MockLlm::standard("<b>Topics</b>: cats");
    let (svc, _dir) = service(llm.clone(), BotMode::Info).await;

    assert!(svc.on_message("-1", msg("alice", "hi"), BOT).await.is_empty());
    assert!(svc.on_message("-1", msg("bob", "hello"), BOT).await.is_empty());
    let replies = svc.on_message("-1", msg("carol", "@digest_bot 5"), BOT).await;

    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].format, ReplyFormat::Html);
    assert_eq!(
        replies[0].text,
        format!("<b>Summary of the last 2 messages by {}:</b>\n\n<b>Topics</b>: cats", MAIN_MODEL)
    );
    assert_eq!(svc.history().len("-1").await, 2);

    let reqs = llm.requests_for(MAIN_MODEL);
    assert_eq!(reqs.len(), 1);
    assert_eq!(reqs[0].system_turns, vec![MARKUP_INSTRUCTION.to_string(), "Summarize.".to_string()]);
    assert_eq!(reqs[0].user_turn, "@alice: hi\n@bob: hello\n");
    assert_eq!(reqs[0].max_tokens, 1500);
    assert_eq!(svc.stats().snapshot().await.total, 1);
}

/// **Test: Default count is 1 and only the newest message is summarized.**
#[tokio::test]
async fn test_default_count_is_one() {
    let llm = MockLlm::standard("ok");
    let (svc, _dir) = service(llm.clone(), BotMode::Info).await;
    svc.on_message("-1", msg("a", "old"), BOT).await;
    svc.on_message("-1", msg("b", "new"), BOT).await;
    svc.on_message("-1", msg("c", "@Digest_Bot"), BOT).await;
    assert_eq!(llm.requests_for(MAIN_MODEL)[0].user_turn, "@b: new\n");
}

/// **Test: Invalid counts are voiced by the error model, the main model is never called.**
#[tokio::test]
async fn test_invalid_counts_voiced() {
    let llm = MockLlm::standard("unused");
    let (svc, _dir) = service(llm.clone(), BotMode::Info).await;
    svc.on_message("-1", msg("a", "text"), BOT).await;

    let cases = [
        ("@digest_bot 0", "voiced: Number must be positive"),
        ("@digest_bot 501", "voiced: User is too greedy, must be less than 500"),
        ("@digest_bot abc", "voiced: Invalid number format"),
    ];
    for (text, expected) in cases {
        let replies = svc.on_message("-1", msg("x", text), BOT).await;
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].text, expected);
        assert_eq!(replies[0].format, ReplyFormat::Plain);
    }
    assert!(llm.requests_for(MAIN_MODEL).is_empty());
    assert_eq!(llm.requests_for(ERROR_MODEL).len(), 3);
    assert_eq!(svc.stats().snapshot().await.total, 0);
}

/// **Test: Error-voice request carries the persona and error as JSON.**
#[tokio::test]
async fn test_error_voice_payload() {
    let llm = MockLlm::standard("unused");
    let (svc, _dir) = service(llm.clone(), BotMode::Info).await;
    svc.on_message("-1", msg("x", "@digest_bot 0"), BOT).await;
    let req = &llm.requests_for(ERROR_MODEL)[0];
    let payload: serde_json::Value = serde_json::from_str(&req.user_turn).unwrap();
    assert_eq!(payload["context"], "Grumpy dwarf.");
    assert_eq!(payload["error"], "Number must be positive");
    assert_eq!(req.max_tokens, 10000);
}

/// **Test: A trigger on an empty chat reports that there is nothing to summarize.**
#[tokio::test]
async fn test_no_previous_messages() {
    let llm = MockLlm::standard("unused");
    let (svc, _dir) = service(llm, BotMode::Info).await;
    let replies = svc.on_message("-1", msg("x", "@digest_bot 3"), BOT).await;
    assert_eq!(replies[0].text, "voiced: No previous messages found");
}

/// **Test: Disallowed markup from the model is stripped before replying.**
#[tokio::test]
async fn test_summary_sanitized() {
    let llm = MockLlm::standard("<b>ok</b><script>bad</script><i>hi</i>");
    let (svc, _dir) = service(llm, BotMode::Info).await;
    svc.on_message("-1", msg("a", "x"), BOT).await;
    let replies = svc.on_message("-1", msg("b", "@digest_bot"), BOT).await;
    assert!(replies[0].text.ends_with("\n\n<b>ok</b><i>hi</i>"));
}

/// **Test: A model-reported error is shown verbatim, not voiced.**
#[tokio::test]
async fn test_model_error_shown_raw() {
    let llm = MockLlm::new(|_| ModelOutcome::ModelError {
        code: "429".into(),
        message: "Rate limit exceeded".into(),
    });
    let (svc, _dir) = service(llm.clone(), BotMode::Info).await;
    svc.on_message("-1", msg("a", "x"), BOT).await;
    let replies = svc.on_message("-1", msg("b", "@digest_bot"), BOT).await;
    assert!(replies[0].text.ends_with("Error code 429, Rate limit exceeded"));
    assert!(llm.requests_for(ERROR_MODEL).is_empty());
}

/// **Test: Transport failure becomes the generic apology.**
#[tokio::test]
async fn test_transport_failure() {
    let llm = MockLlm::new(|_| ModelOutcome::TransportFailure("timeout".into()));
    let (svc, _dir) = service(llm, BotMode::Info).await;
    svc.on_message("-1", msg("a", "x"), BOT).await;
    let replies = svc.on_message("-1", msg("b", "@digest_bot"), BOT).await;
    assert!(replies[0].text.ends_with("Sorry, I couldn't generate a summary at this time."));
}

/// **Test: Messages without text never reach the model.**
#[tokio::test]
async fn test_only_empty_messages() {
    let llm = MockLlm::standard("unused");
    let (svc, _dir) = service(llm.clone(), BotMode::Info).await;
    svc.on_message("-1", BufferedMessage::default(), BOT).await;
    let replies = svc.on_message("-1", msg("b", "@digest_bot"), BOT).await;
    assert!(replies[0].text.ends_with("No text messages found to summarize."));
    assert!(llm.requests_for(MAIN_MODEL).is_empty());
    assert_eq!(svc.stats().snapshot().await.total, 0);
}

/// **Test: Channels keep separate histories.**
#[tokio::test]
async fn test_channel_isolation() {
    let llm = MockLlm::standard("ok");
    let (svc, _dir) = service(llm.clone(), BotMode::Info).await;
    svc.on_message("-1", msg("a", "in one"), BOT).await;
    svc.on_message("-2", msg("b", "in two"), BOT).await;
    svc.on_message("-2", msg("c", "@digest_bot 10"), BOT).await;
    assert_eq!(llm.requests_for(MAIN_MODEL)[0].user_turn, "@b: in two\n");
}

/// **Test: Debug mode ignores unknown chats but serves registered ones with an echo.**
#[tokio::test]
async fn test_debug_mode() {
    let llm = MockLlm::standard("summary");
    let (svc, dir) = service(llm, BotMode::Debug).await;

    assert!(svc.on_message("-1", msg("a", "x"), BOT).await.is_empty());
    assert_eq!(svc.history().len("-1").await, 0);
    assert!(!svc.registry().contains("-1").await);

    svc.on_channel_post("-1", msg("chan", "post one")).await;
    svc.on_message("-1", msg("a", "reply two"), BOT).await;
    let replies = svc.on_message("-1", msg("b", "@digest_bot 2"), BOT).await;
    assert_eq!(replies.len(), 2);
    assert_eq!(
        replies[1].text,
        "<b>Last 2 messages:</b>\n\n1. <code>reply two</code>\n\n2. <code>post one</code>\n\n"
    );

    let reloaded = ChannelRegistry::load(dir.path().join("channels.yaml")).await;
    assert!(reloaded.contains("-1").await);
}

/// **Test: New chats are registered and the snapshot is rewritten on shutdown.**
#[tokio::test]
async fn test_registry_persisted() {
    let llm = MockLlm::standard("ok");
    let (svc, dir) = service(llm, BotMode::Info).await;
    svc.on_message("-7", msg("a", "x"), BOT).await;
    let path = dir.path().join("channels.yaml");
    assert!(ChannelRegistry::load(&path).await.contains("-7").await);
    std::fs::remove_file(&path).unwrap();
    svc.shutdown().await.unwrap();
    assert!(ChannelRegistry::load(&path).await.contains("-7").await);
}

/// **Test: Per-channel overrides drive the summary model, prompt and header.**
#[tokio::test]
async fn test_channel_override_used() {
    let llm = MockLlm::standard("ok");
    let (svc, _dir) = service(llm.clone(), BotMode::Info).await;
    svc.config().update("-1", "main_model", "meta-llama/llama-3.2-3b-instruct").await;
    svc.config().update("-1", "main_prompt", "Be terse.").await;
    svc.on_message("-1", msg("a", "x"), BOT).await;
    let replies = svc.on_message("-1", msg("b", "@digest_bot"), BOT).await;
    assert!(replies[0].text.contains("by meta-llama/llama-3.2-3b-instruct:"));
    let req = &llm.requests_for("meta-llama/llama-3.2-3b-instruct")[0];
    assert_eq!(req.system_turns[1], "Be terse.");
}

/// **Test: A failed configuration save does not stop the registry save on shutdown.**
#[tokio::test]
async fn test_shutdown_saves_registry_when_config_fails() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let config = Arc::new(ConfigStore::new(blocker.join("channel_config.json"), defaults()));
    let registry_path = dir.path().join("channels.yaml");
    let svc = DigestService::new(
        MockLlm::standard("ok"),
        config,
        ChannelRegistry::new(&registry_path),
        ModelCatalog::default(),
        ServiceOptions {
            mode: BotMode::Info,
            admin_username: Some(ADMIN.to_string()),
        },
    );
    svc.on_channel_post("-9", msg("chan", "post")).await;
    std::fs::remove_file(&registry_path).unwrap();

    assert!(svc.shutdown().await.is_err());
    assert!(ChannelRegistry::load(&registry_path).await.contains("-9").await);
}

/// **Test: Intake snapshots the history for a trigger without calling any model.**
#[tokio::test]
async fn test_accept_message_snapshots_without_model_call() {
    let llm = MockLlm::standard("ok");
    let (svc, _dir) = service(llm.clone(), BotMode::Info).await;
    assert!(svc.accept_message("-1", msg("a", "one"), BOT).await.is_none());

    let pending = svc.accept_message("-1", msg("b", "@digest_bot 5"), BOT).await;
    assert_eq!(
        pending,
        Some(PendingReply::Summary {
            channel_id: "-1".to_string(),
            messages: vec![msg("a", "one")],
        })
    );
    let rejected = svc.accept_message("-2", msg("b", "@digest_bot 0"), BOT).await;
    assert_eq!(
        rejected,
        Some(PendingReply::InputError {
            channel_id: "-2".to_string(),
            error: UserInputError::NotPositive,
        })
    );
    assert!(llm.requests().is_empty());

    let replies = svc.render(pending.unwrap()).await;
    assert!(replies[0].text.ends_with("ok"));
}
