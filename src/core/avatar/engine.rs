//! Avatar synthesis engine abstraction.
//!
//! The engine renders speech onto the avatar and publishes it over the peer
//! transport. It is created once per initialized session from an
//! [`EngineSetup`] and driven by the session controller and speech
//! dispatcher.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use super::config::AvatarSessionConfig;
use super::credentials::{AuthToken, RelayToken};
use super::errors::{AvatarError, AvatarResult};
use super::transport::{IceServer, PeerTransport};
use crate::core::providers::azure::build_private_endpoint_websocket_url;

/// Why a synthesis request finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SynthesisReason {
    SynthesizingAudioCompleted,
    Canceled,
}

/// Result of a synthesis request (avatar start or utterance).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOutcome {
    pub reason: SynthesisReason,
    pub error_details: Option<String>,
}

impl SynthesisOutcome {
    pub fn completed() -> Self {
        Self {
            reason: SynthesisReason::SynthesizingAudioCompleted,
            error_details: None,
        }
    }

    pub fn canceled(details: impl Into<String>) -> Self {
        Self {
            reason: SynthesisReason::Canceled,
            error_details: Some(details.into()),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.reason == SynthesisReason::SynthesizingAudioCompleted
    }

    /// Error details, or a generic message when the engine gave none.
    pub fn failure_message(&self) -> String {
        self.error_details
            .clone()
            .filter(|d| !d.is_empty())
            .unwrap_or_else(|| format!("{:?}", self.reason))
    }
}

/// How the engine reaches the speech service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEndpoint {
    AuthorizationToken { token: String, region: String },
    /// Private endpoint websocket URL; authenticates without a token.
    PrivateEndpoint { url: String },
}

/// Rectangle of the source video kept when cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRange {
    pub top_left: (u32, u32),
    pub bottom_right: (u32, u32),
}

impl CropRange {
    /// Centered 720x1080 portrait crop of the 1920x1080 avatar stream.
    pub const PORTRAIT: Self = Self {
        top_left: (600, 0),
        bottom_right: (1320, 1080),
    };
}

/// Everything an engine needs to be constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSetup {
    pub endpoint: SpeechEndpoint,
    pub character: String,
    pub style: String,
    pub voice: String,
    pub background_color: String,
    pub transparent_background: bool,
    pub crop: Option<CropRange>,
    pub relay_servers: Vec<IceServer>,
}

impl EngineSetup {
    /// Build the setup from session configuration and fetched credentials.
    ///
    /// Only the first relay URL is handed to the engine.
    ///
    /// # Errors
    /// * `Initialization` - the relay token carries no URLs
    pub fn new(
        config: &AvatarSessionConfig,
        auth: &AuthToken,
        relay: &RelayToken,
    ) -> AvatarResult<Self> {
        let relay_url = relay.urls.first().ok_or_else(|| {
            AvatarError::Initialization("ICE server token contains no relay URLs".to_string())
        })?;

        let endpoint = match &config.private_endpoint {
            Some(pe) => SpeechEndpoint::PrivateEndpoint {
                url: build_private_endpoint_websocket_url(pe),
            },
            None => SpeechEndpoint::AuthorizationToken {
                token: auth.token.clone(),
                region: auth.region.clone(),
            },
        };

        Ok(Self {
            endpoint,
            character: config.character.clone(),
            style: config.style.clone(),
            voice: config.voice.clone(),
            background_color: config.background_color.clone(),
            transparent_background: config.transparent_background,
            crop: config.video_crop.then_some(CropRange::PORTRAIT),
            relay_servers: vec![IceServer {
                urls: vec![relay_url.clone()],
                username: relay.username.clone(),
                credential: relay.password.clone(),
            }],
        })
    }
}

/// Diagnostic event emitted by the engine (bookmarks, visemes, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AvatarEvent {
    pub description: String,
    /// Offset in 100-nanosecond ticks.
    pub offset_ticks: u64,
}

/// Sink for [`AvatarEvent`]s.
pub type AvatarEventSink = Arc<dyn Fn(AvatarEvent) + Send + Sync>;

/// A live avatar synthesis engine.
#[async_trait]
pub trait AvatarEngine: Send + Sync {
    /// Start the avatar over the given transport. Only a
    /// `SynthesizingAudioCompleted` outcome counts as success.
    async fn start_avatar(&self, transport: Arc<dyn PeerTransport>)
    -> AvatarResult<SynthesisOutcome>;

    /// Speak one SSML document. Resolves when the utterance has finished.
    async fn speak_ssml(&self, ssml: &str) -> AvatarResult<SynthesisOutcome>;

    /// Cancel the current utterance.
    async fn stop_speaking(&self) -> AvatarResult<()>;

    /// Release the engine. Must be idempotent.
    async fn close(&self) -> AvatarResult<()>;
}

/// Constructs avatar engines.
#[async_trait]
pub trait EngineProvider: Send + Sync {
    /// Resolves once the engine runtime is loaded and usable.
    async fn ready(&self) -> AvatarResult<()>;

    /// Create an engine. Events are forwarded to `events`.
    async fn create_engine(
        &self,
        setup: EngineSetup,
        events: AvatarEventSink,
    ) -> AvatarResult<Arc<dyn AvatarEngine>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> AuthToken {
        AuthToken {
            token: "tok".to_string(),
            region: "eastus2".to_string(),
        }
    }

    fn relay() -> RelayToken {
        RelayToken {
            urls: vec!["turn:relay.example.com:3478".to_string()],
            username: "u".to_string(),
            password: "p".to_string(),
        }
    }

    #[test]
    fn test_setup_uses_auth_token_by_default() {
        let setup = EngineSetup::new(&AvatarSessionConfig::default(), &auth(), &relay()).unwrap();
        assert_eq!(
            setup.endpoint,
            SpeechEndpoint::AuthorizationToken {
                token: "tok".to_string(),
                region: "eastus2".to_string()
            }
        );
        assert_eq!(setup.character, "lisa");
        assert_eq!(setup.crop, None);
        assert_eq!(setup.relay_servers[0].username, "u");
    }

    #[test]
    fn test_setup_private_endpoint_and_crop() {
        let config = AvatarSessionConfig {
            private_endpoint: Some("pe.example.com".to_string()),
            video_crop: true,
            ..Default::default()
        };
        let setup = EngineSetup::new(&config, &auth(), &relay()).unwrap();
        assert_eq!(
            setup.endpoint,
            SpeechEndpoint::PrivateEndpoint {
                url: "wss://pe.example.com/tts/cognitiveservices/websocket/v1?enableTalkingAvatar=true"
                    .to_string()
            }
        );
        assert_eq!(setup.crop, Some(CropRange::PORTRAIT));
    }

    #[test]
    fn test_setup_keeps_only_first_relay_url() {
        let relay = RelayToken {
            urls: vec![
                "turn:relay-a.example.com:3478".to_string(),
                "turn:relay-b.example.com:443?transport=tcp".to_string(),
            ],
            username: "u".to_string(),
            password: "p".to_string(),
        };
        let setup = EngineSetup::new(&AvatarSessionConfig::default(), &auth(), &relay).unwrap();
        assert_eq!(setup.relay_servers.len(), 1);
        assert_eq!(
            setup.relay_servers[0].urls,
            vec!["turn:relay-a.example.com:3478".to_string()]
        );
        assert_eq!(setup.relay_servers[0].credential, "p");
    }

    #[test]
    fn test_setup_rejects_empty_relay_urls() {
        let relay = RelayToken {
            urls: vec![],
            username: "u".to_string(),
            password: "p".to_string(),
        };
        let err = EngineSetup::new(&AvatarSessionConfig::default(), &auth(), &relay).unwrap_err();
        assert!(matches!(err, AvatarError::Initialization(_)));
        assert!(err.to_string().contains("no relay URLs"));
    }

    #[test]
    fn test_outcome_failure_message() {
        assert!(SynthesisOutcome::completed().is_completed());
        let canceled = SynthesisOutcome::canceled("quota exceeded");
        assert!(!canceled.is_completed());
        assert_eq!(canceled.failure_message(), "quota exceeded");

        let bare = SynthesisOutcome {
            reason: SynthesisReason::Canceled,
            error_details: None,
        };
        assert_eq!(bare.failure_message(), "Canceled");
    }
}
