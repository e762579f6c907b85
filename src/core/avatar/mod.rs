//! # Avatar Session
//!
//! Chat-driven talking-avatar sessions for AI mock interviews. The
//! interviewer's reply is streamed from the chat endpoint, split into
//! sentences and spoken by an avatar delivered over a relayed peer
//! connection.
//!
//! - [`AvatarSession`]: lifecycle (initialize, start with retries, stop) and
//!   the public speak/chat operations
//! - [`MediaNegotiator`]: one transport negotiation attempt and its elements
//! - [`SpeechDispatcher`]: strictly ordered, one-at-a-time utterances
//! - [`ResponseStreamer`]: chat stream parsing and sentence flushing
//! - [`DegradationController`]: text-only mode, local narration and the
//!   error auto-reset
//!
//! The engine, transport, credential and chat collaborators sit behind
//! traits so hosts can plug in their own media stack.
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//! use intervue::core::avatar::{
//!     AvatarCallbacks, AvatarSession, AvatarSessionConfig, ElementContainer,
//!     EngineProvider, SessionDependencies, TransportFactory,
//! };
//!
//! async fn run(
//!     engines: Arc<dyn EngineProvider>,
//!     transports: Arc<dyn TransportFactory>,
//! ) -> Result<(), Box<dyn std::error::Error>> {
//!     let deps = SessionDependencies::http(
//!         "http://localhost:3001",
//!         Duration::from_secs(30),
//!         engines,
//!         transports,
//!     )?;
//!     let callbacks = AvatarCallbacks::default()
//!         .on_error(|message| eprintln!("avatar error: {message}"));
//!
//!     let session = AvatarSession::new(AvatarSessionConfig::default(), deps, callbacks);
//!     session.initialize().await?;
//!     session.start_session(Arc::new(ElementContainer::new())).await?;
//!     session.speak("Welcome to your interview.").await?;
//!     session.stop_session().await?;
//!     Ok(())
//! }
//! ```

pub mod callbacks;
pub mod chat;
pub mod config;
pub mod credentials;
pub mod degradation;
pub mod dispatcher;
pub mod engine;
pub mod errors;
pub mod handle;
pub mod session;
pub mod ssml;
pub mod state;
pub mod stream;
pub mod transport;

#[cfg(test)]
mod tests;

pub use callbacks::AvatarCallbacks;
pub use chat::{ByteStream, ChatCompletionSource, HttpChatSource, ResponseStreamer};
pub use config::{AvatarSessionConfig, AvatarTimings, DegradationPolicy};
pub use credentials::{
    AuthToken, CredentialError, CredentialSource, HttpCredentialSource, RelayToken,
};
pub use degradation::{DegradationController, LocalSpeech, TextOnlyMode, TracingNarrator};
pub use dispatcher::SpeechDispatcher;
pub use engine::{
    AvatarEngine, AvatarEvent, AvatarEventSink, CropRange, EngineProvider, EngineSetup,
    SpeechEndpoint, SynthesisOutcome, SynthesisReason,
};
pub use errors::{AvatarError, AvatarResult, TransportError};
pub use handle::AvatarHandle;
pub use session::{AvatarSession, SessionDependencies};
pub use ssml::{build_avatar_ssml, escape_ssml_text};
pub use state::{SessionPhase, SessionState, SessionStatus};
pub use stream::{FrameBuffer, StreamAccumulator, is_sentence_boundary, parse_frames};
pub use transport::{
    ElementContainer, IceConnectionState, IceServer, InboundTrack, MediaContainer, MediaElement,
    MediaKind, MediaNegotiator, PeerTransport, TransportConfig, TransportEvent, TransportFactory,
};
