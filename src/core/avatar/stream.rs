//! Incremental parsing of the chat completion stream.
//!
//! The chat endpoint relays server-sent events from the completion service.
//! Network reads do not respect event boundaries, so [`FrameBuffer`] holds
//! back partial data until a read ends on a frame terminator. Complete
//! frames are decoded into content deltas by [`parse_frames`], and
//! [`StreamAccumulator`] groups deltas into speakable sentences.

use serde::Deserialize;
use tracing::warn;

/// Punctuation that ends a sentence when it arrives as a short token.
const SENTENCE_PUNCTUATION: &[char] = &['.', '?', '!', ':', ';', '。', '？', '！', '：', '；'];

/// Buffers raw stream bytes until they end on a complete frame.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    carryover: Vec<u8>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a network chunk. Returns the buffered text once it ends with
    /// `}\n\n` or `[DONE]\n\n`; otherwise keeps it for the next chunk.
    pub fn push(&mut self, chunk: &[u8]) -> Option<String> {
        self.carryover.extend_from_slice(chunk);

        let complete =
            self.carryover.ends_with(b"}\n\n") || self.carryover.ends_with(b"[DONE]\n\n");
        if !complete {
            return None;
        }

        // Complete frames end in ASCII, so no character is split here.
        let data = std::mem::take(&mut self.carryover);
        Some(String::from_utf8_lossy(&data).into_owned())
    }

    /// Bytes still waiting for a terminator.
    pub fn pending(&self) -> usize {
        self.carryover.len()
    }
}

#[derive(Debug, Deserialize)]
struct CompletionChunk {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    #[serde(default)]
    delta: Option<CompletionDelta>,
}

#[derive(Debug, Deserialize)]
struct CompletionDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Extract the content deltas from a block of complete frames.
///
/// Frames are separated by a blank line. Only `data:` frames are read; the
/// `[DONE]` sentinel and frames without content are skipped. Frames that
/// fail to parse are logged and skipped, the rest of the block still counts.
pub fn parse_frames(block: &str) -> Vec<String> {
    let mut deltas = Vec::new();

    for frame in block.split("\n\n") {
        let Some(payload) = frame.strip_prefix("data:") else {
            continue;
        };
        if frame.ends_with("[DONE]") {
            continue;
        }

        match serde_json::from_str::<CompletionChunk>(payload.trim()) {
            Ok(chunk) => {
                if let Some(content) = chunk
                    .choices
                    .into_iter()
                    .next()
                    .and_then(|c| c.delta)
                    .and_then(|d| d.content)
                    && !content.is_empty()
                {
                    deltas.push(content);
                }
            }
            Err(e) => {
                warn!(error = %e, frame = %frame, "Skipping unparseable stream frame");
            }
        }
    }

    deltas
}

/// Whether a delta token ends the current sentence.
///
/// A bare newline (`\n` or `\n\n`) always does. Otherwise the token, with
/// newlines removed, must be at most two characters long and contain
/// sentence punctuation. Long tokens that merely contain a period (URLs,
/// decimals) do not end a sentence.
pub fn is_sentence_boundary(token: &str) -> bool {
    if token == "\n" || token == "\n\n" {
        return true;
    }

    let cleaned: String = token.chars().filter(|&c| c != '\n').collect();
    cleaned.chars().count() <= 2 && cleaned.contains(SENTENCE_PUNCTUATION)
}

/// Accumulates streamed deltas into the full reply and speakable sentences.
#[derive(Debug, Default)]
pub struct StreamAccumulator {
    full_text: String,
    pending_sentence: String,
}

impl StreamAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a delta. Returns the completed sentence when the delta ends one.
    ///
    /// Flushed sentences are returned verbatim, including any whitespace, so
    /// that concatenating every flush plus [`finish`](Self::finish)
    /// reproduces [`full_text`](Self::full_text).
    pub fn push(&mut self, delta: &str) -> Option<String> {
        self.full_text.push_str(delta);
        self.pending_sentence.push_str(delta);

        if is_sentence_boundary(delta) {
            Some(std::mem::take(&mut self.pending_sentence))
        } else {
            None
        }
    }

    /// End of stream. Returns the unfinished trailing sentence, if it holds
    /// anything besides whitespace.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending_sentence);
        (!rest.trim().is_empty()).then_some(rest)
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn pending_sentence(&self) -> &str {
        &self.pending_sentence
    }
}
