//! Streaming chat turns spoken sentence by sentence.
//!
//! [`ChatCompletionSource`] opens the completion stream for a
//! [`ChatContext`]; [`ResponseStreamer`] reads it, publishes the growing
//! reply through the message callbacks and hands each finished sentence to
//! the speech dispatcher as soon as it is complete.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::callbacks::AvatarCallbacks;
use super::dispatcher::SpeechDispatcher;
use super::errors::{AvatarError, AvatarResult};
use super::stream::{FrameBuffer, StreamAccumulator, parse_frames};
use crate::core::interview::ChatContext;

/// Raw bytes of a completion stream.
pub type ByteStream = BoxStream<'static, AvatarResult<Bytes>>;

/// Opens completion streams.
#[async_trait]
pub trait ChatCompletionSource: Send + Sync {
    async fn open_stream(&self, context: &ChatContext) -> AvatarResult<ByteStream>;
}

/// [`ChatCompletionSource`] backed by the `/api/azure-chat` endpoint.
#[derive(Debug, Clone)]
pub struct HttpChatSource {
    client: Client,
    endpoint_url: String,
}

impl HttpChatSource {
    pub const PATH: &'static str = "/api/azure-chat";

    /// Create a chat source for the server at `base_url`.
    ///
    /// `timeout` bounds connecting only; a streamed reply may take longer.
    pub fn new(base_url: &str, timeout: Duration) -> AvatarResult<Self> {
        let client = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint_url: format!("{}{}", base_url.trim_end_matches('/'), Self::PATH),
        }
    }
}

#[async_trait]
impl ChatCompletionSource for HttpChatSource {
    async fn open_stream(&self, context: &ChatContext) -> AvatarResult<ByteStream> {
        let response = self
            .client
            .post(&self.endpoint_url)
            .json(context)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AvatarError::ChatApi(format!(
                "Chat API failed: {} - {}",
                status.as_u16(),
                body.chars().take(500).collect::<String>()
            )));
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map_err(AvatarError::from))
            .boxed())
    }
}

/// Reads completion streams and feeds the speech dispatcher.
pub struct ResponseStreamer {
    source: Arc<dyn ChatCompletionSource>,
    dispatcher: SpeechDispatcher,
    callbacks: Arc<AvatarCallbacks>,
}

impl ResponseStreamer {
    pub fn new(
        source: Arc<dyn ChatCompletionSource>,
        dispatcher: SpeechDispatcher,
        callbacks: Arc<AvatarCallbacks>,
    ) -> Self {
        Self {
            source,
            dispatcher,
            callbacks,
        }
    }

    /// Send a chat turn and stream the reply. Returns the full reply text.
    ///
    /// Sentences are queued for speech while the stream is still being
    /// read; the call does not wait for them to be spoken.
    pub async fn send_chat_message(&self, context: &ChatContext) -> AvatarResult<String> {
        debug!(
            history = context.interview_history.len(),
            has_message = context.user_message.is_some(),
            "Sending chat message"
        );
        let stream = self.source.open_stream(context).await?;
        self.consume(stream).await
    }

    /// Consume a completion stream.
    ///
    /// On a read error the sentences flushed so far stay queued, no
    /// completion event is emitted and the error is returned.
    pub async fn consume(&self, mut stream: ByteStream) -> AvatarResult<String> {
        let mut frames = FrameBuffer::new();
        let mut accumulator = StreamAccumulator::new();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if let Some(block) = frames.push(&chunk) {
                self.apply_block(&block, &mut accumulator);
            }
        }

        if frames.pending() > 0 {
            warn!(
                bytes = frames.pending(),
                "Chat stream ended inside a frame, discarding partial data"
            );
        }

        if let Some(rest) = accumulator.finish() {
            self.dispatch_sentence(&rest);
        }

        let full_text = accumulator.full_text().to_string();
        self.callbacks.message_complete(&full_text);
        info!(chars = full_text.len(), "Chat response complete");

        Ok(full_text)
    }

    /// Publish and speak a fixed message without calling the chat endpoint.
    ///
    /// The transcript sees one update and the completion, then the whole
    /// text is spoken as a single utterance.
    pub async fn speak_completion_message(&self, text: &str) -> AvatarResult<()> {
        self.callbacks.message_update(text);
        self.callbacks.message_complete(text);
        self.dispatcher.speak(text).await
    }

    fn apply_block(&self, block: &str, accumulator: &mut StreamAccumulator) {
        for delta in parse_frames(block) {
            let sentence = accumulator.push(&delta);
            self.callbacks.message_update(accumulator.full_text());
            if let Some(sentence) = sentence {
                self.dispatch_sentence(&sentence);
            }
        }
    }

    fn dispatch_sentence(&self, sentence: &str) {
        if sentence.trim().is_empty() {
            return;
        }
        debug!(sentence = %sentence, "Sentence ready");
        self.dispatcher.enqueue(sentence);
    }
}
