use std::sync::Arc;

use super::helpers::{HarnessBuilder, active_harness};
use super::stubs::{StubChatSource, sse_frame};
use crate::core::avatar::errors::AvatarError;
use crate::core::interview::ChatContext;

fn frames(parts: &[&str]) -> Vec<Vec<u8>> {
    let mut chunks: Vec<Vec<u8>> = parts.iter().map(|p| sse_frame(p).into_bytes()).collect();
    chunks.push(b"data: [DONE]\n\n".to_vec());
    chunks
}

fn context(message: &str) -> ChatContext {
    ChatContext::default().with_user_message(Some(message.to_string()))
}

#[tokio::test]
async fn test_reply_is_spoken_sentence_by_sentence() {
    let chat =
        StubChatSource::with_chunks(frames(&["Hello", " there", ".", " How are", " you", "?"]));
    let h = active_harness(HarnessBuilder::new().chat(chat)).await;

    let reply = h.session.send_chat_message(&context("Hi")).await.unwrap();
    h.session.wait_until_idle().await;

    assert_eq!(reply, "Hello there. How are you?");
    assert_eq!(h.engine.spoken_texts(), vec!["Hello there.", " How are you?"]);

    let events = h.log.events();
    let updates: Vec<_> = events
        .iter()
        .filter_map(|e| e.strip_prefix("update:"))
        .collect();
    assert_eq!(
        updates,
        vec![
            "Hello",
            "Hello there",
            "Hello there.",
            "Hello there. How are",
            "Hello there. How are you",
            "Hello there. How are you?",
        ]
    );
    assert_eq!(h.log.count("complete:Hello there. How are you?"), 1);
}

#[tokio::test]
async fn test_trailing_text_without_terminator_is_flushed() {
    let chat = StubChatSource::with_chunks(frames(&["First point", ".", " And one more"]));
    let h = active_harness(HarnessBuilder::new().chat(chat)).await;

    let reply = h.session.send_chat_message(&context("Go on")).await.unwrap();
    h.session.wait_until_idle().await;

    assert_eq!(reply, "First point. And one more");
    assert_eq!(h.engine.spoken_texts(), vec!["First point.", " And one more"]);
}

#[tokio::test]
async fn test_frame_split_across_chunks_is_reassembled() {
    let frame = sse_frame("Why Rust?").into_bytes();
    let (head, tail) = frame.split_at(frame.len() / 2);
    let chat = StubChatSource::with_chunks(vec![
        head.to_vec(),
        tail.to_vec(),
        b"data: [DONE]\n\n".to_vec(),
    ]);
    let h = active_harness(HarnessBuilder::new().chat(chat)).await;

    let reply = h.session.send_chat_message(&context("Ask me")).await.unwrap();
    h.session.wait_until_idle().await;

    assert_eq!(reply, "Why Rust?");
    assert_eq!(h.engine.spoken_texts(), vec!["Why Rust?"]);
}

#[tokio::test]
async fn test_malformed_frame_is_skipped() {
    let mut chunks = vec![b"data: {not json}\n\n".to_vec()];
    chunks.extend(frames(&["Still here."]));
    let chat = StubChatSource::with_chunks(chunks);
    let h = active_harness(HarnessBuilder::new().chat(chat)).await;

    let reply = h.session.send_chat_message(&context("Hi")).await.unwrap();
    h.session.wait_until_idle().await;

    assert_eq!(reply, "Still here.");
    assert!(h.log.errors().is_empty());
}

#[tokio::test]
async fn test_stream_error_keeps_flushed_sentences_and_reports() {
    let chat = StubChatSource::with_chunks(frames(&["First sentence", ".", " Second"]));
    *chat.break_after.lock() = Some(2);
    let h = active_harness(HarnessBuilder::new().chat(chat)).await;

    let err = h.session.send_chat_message(&context("Hi")).await.unwrap_err();
    h.session.wait_until_idle().await;

    assert!(matches!(err, AvatarError::ChatApi(_)));
    assert_eq!(h.engine.spoken_texts(), vec!["First sentence."]);
    let errors = h.log.errors();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Chat failed:"));
    assert!(!h.log.events().iter().any(|e| e.starts_with("complete:")));
}

#[tokio::test]
async fn test_upstream_failure_is_reported() {
    let chat = Arc::new(StubChatSource::default());
    *chat.fail_with.lock() = Some("Chat API failed: 500 - Azure OpenAI not configured".to_string());
    let h = active_harness(HarnessBuilder::new().chat(chat)).await;

    let err = h.session.send_chat_message(&context("Hi")).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "Chat API error: Chat API failed: 500 - Azure OpenAI not configured"
    );
    assert_eq!(
        h.log.errors(),
        vec!["Chat failed: Chat API error: Chat API failed: 500 - Azure OpenAI not configured"]
    );
}

#[tokio::test]
async fn test_chat_requires_ready_session() {
    let chat = StubChatSource::with_chunks(frames(&["Hello."]));
    let h = HarnessBuilder::new().chat(chat.clone()).build();
    h.session.initialize().await.unwrap();

    let err = h.session.send_chat_message(&context("Hi")).await.unwrap_err();

    assert!(matches!(err, AvatarError::NotReady(_)));
    assert!(chat.requests.lock().is_empty());
}

#[tokio::test]
async fn test_text_only_chat_streams_without_speech() {
    let chat = StubChatSource::with_chunks(frames(&["Tell me", " about Rust."]));
    let h = HarnessBuilder::new().chat(chat.clone()).build();
    h.session.enable_text_only_mode().unwrap();

    let reply = h.session.send_chat_message(&context("Hi")).await.unwrap();

    assert_eq!(reply, "Tell me about Rust.");
    assert!(h.engine.spoken.lock().is_empty());
    assert_eq!(h.log.count("complete:Tell me about Rust."), 1);
    assert_eq!(chat.requests.lock()[0].user_message.as_deref(), Some("Hi"));
}

#[tokio::test]
async fn test_completion_message_is_spoken() {
    let h = active_harness(HarnessBuilder::new()).await;

    h.session
        .speak_completion_message("Thanks for your time today.")
        .await
        .unwrap();

    assert_eq!(h.engine.spoken_texts(), vec!["Thanks for your time today."]);
    let update = h.log.position("update:Thanks for your time today.").unwrap();
    let complete = h.log.position("complete:Thanks for your time today.").unwrap();
    assert!(update < complete);
}

#[tokio::test]
async fn test_completion_message_rejects_blank_text() {
    let h = active_harness(HarnessBuilder::new()).await;

    let err = h.session.speak_completion_message("  ").await.unwrap_err();

    assert!(matches!(err, AvatarError::InvalidInput(_)));
}
