//! Error types for avatar session operations

use std::time::Duration;

use super::transport::IceConnectionState;

/// Failures of a single media transport negotiation attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("WebRTC connection timeout after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("WebRTC connection {0}")]
    ConnectionFailed(IceConnectionState),
    #[error("Avatar failed to start: {0}")]
    StartFailed(String),
    #[error("No ICE servers available in relay token")]
    NoIceServers,
    #[error("Transport setup failed: {0}")]
    Setup(String),
    #[error("Transport closed before the connection was confirmed")]
    Closed,
}

/// Error types for avatar session operations
#[derive(Debug, thiserror::Error)]
pub enum AvatarError {
    #[error("Initialization error: {0}")]
    Initialization(String),
    #[error("Session start error: {0}")]
    SessionStart(String),
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("Chat API error: {0}")]
    ChatApi(String),
    #[error("Speech synthesis error: {0}")]
    SpeechSynthesis(String),
    #[error("Avatar not ready: {0}")]
    NotReady(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type for avatar session operations
pub type AvatarResult<T> = Result<T, AvatarError>;
