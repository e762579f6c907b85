//! Configuration for avatar sessions.
//!
//! [`AvatarSessionConfig`] carries the persona (character, style, voice) and the
//! connection parameters used by the session controller. Timings and the
//! degradation policy are grouped separately so tests can shrink them without
//! touching the persona.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default Azure region for speech and avatar relay services.
pub const DEFAULT_REGION: &str = "eastus2";
/// Default avatar character.
pub const DEFAULT_CHARACTER: &str = "lisa";
/// Default avatar style.
pub const DEFAULT_STYLE: &str = "casual-sitting";
/// Default neural voice used for avatar speech.
pub const DEFAULT_VOICE: &str = "en-US-AvaMultilingualNeural";
/// Default avatar background (opaque white, RGBA).
pub const DEFAULT_BACKGROUND_COLOR: &str = "#FFFFFFFF";
/// Default SSML language tag.
pub const DEFAULT_LANGUAGE: &str = "en-US";

/// Retry and timeout parameters for session start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvatarTimings {
    /// Number of transport negotiation attempts before giving up.
    pub max_start_attempts: u32,
    /// Pause between failed attempts.
    #[serde(with = "duration_ms")]
    pub retry_delay: Duration,
    /// Watchdog for a single negotiation attempt.
    #[serde(with = "duration_ms")]
    pub connection_timeout: Duration,
    /// Delay before a pre-session error is cleared for another start attempt.
    #[serde(with = "duration_ms")]
    pub auto_retry_delay: Duration,
}

impl Default for AvatarTimings {
    fn default() -> Self {
        Self {
            max_start_attempts: 3,
            retry_delay: Duration::from_secs(2),
            connection_timeout: Duration::from_secs(20),
            auto_retry_delay: Duration::from_secs(5),
        }
    }
}

impl AvatarTimings {
    /// Timings used by deployments that expect a faster failure (15 second watchdog).
    pub fn legacy() -> Self {
        Self {
            connection_timeout: Duration::from_secs(15),
            ..Self::default()
        }
    }
}

/// How the session behaves when the avatar cannot be brought up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradationPolicy {
    /// Whether the chat can continue in text-only mode when the avatar fails.
    pub allow_text_only: bool,
    /// Whether a pre-session error is cleared automatically after
    /// [`AvatarTimings::auto_retry_delay`].
    pub auto_retry: bool,
}

impl Default for DegradationPolicy {
    fn default() -> Self {
        Self {
            allow_text_only: true,
            auto_retry: true,
        }
    }
}

/// Configuration for a single avatar session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AvatarSessionConfig {
    pub region: String,
    pub character: String,
    pub style: String,
    pub voice: String,
    pub language: String,
    /// RGBA hex color, e.g. `#FFFFFFFF`.
    pub background_color: String,
    /// Optional background image URL applied by the media presentation.
    pub background_image: Option<String>,
    /// Crop the avatar video to the centered portrait region.
    pub video_crop: bool,
    /// Render the avatar with a transparent background.
    pub transparent_background: bool,
    /// Host name of a private speech endpoint. When set, the engine connects
    /// through it instead of using an authorization token.
    pub private_endpoint: Option<String>,
    pub timings: AvatarTimings,
    pub degradation: DegradationPolicy,
}

impl Default for AvatarSessionConfig {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            character: DEFAULT_CHARACTER.to_string(),
            style: DEFAULT_STYLE.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            background_color: DEFAULT_BACKGROUND_COLOR.to_string(),
            background_image: None,
            video_crop: false,
            transparent_background: false,
            private_endpoint: None,
            timings: AvatarTimings::default(),
            degradation: DegradationPolicy::default(),
        }
    }
}

impl AvatarSessionConfig {
    /// Build a config from `AVATAR_*` environment variables, falling back to the
    /// defaults for anything unset or empty.
    ///
    /// Recognized variables: `AZURE_SPEECH_REGION`, `AVATAR_CHARACTER`,
    /// `AVATAR_STYLE`, `AVATAR_VOICE`, `AVATAR_LANGUAGE`,
    /// `AVATAR_BACKGROUND_COLOR`, `AVATAR_BACKGROUND_IMAGE`, `AVATAR_VIDEO_CROP`,
    /// `AVATAR_TRANSPARENT_BACKGROUND`, `AZURE_SPEECH_PRIVATE_ENDPOINT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            region: env_or("AZURE_SPEECH_REGION", defaults.region),
            character: env_or("AVATAR_CHARACTER", defaults.character),
            style: env_or("AVATAR_STYLE", defaults.style),
            voice: env_or("AVATAR_VOICE", defaults.voice),
            language: env_or("AVATAR_LANGUAGE", defaults.language),
            background_color: env_or("AVATAR_BACKGROUND_COLOR", defaults.background_color),
            background_image: env_opt("AVATAR_BACKGROUND_IMAGE"),
            video_crop: env_flag("AVATAR_VIDEO_CROP"),
            transparent_background: env_flag("AVATAR_TRANSPARENT_BACKGROUND"),
            private_endpoint: env_opt("AZURE_SPEECH_PRIVATE_ENDPOINT"),
            timings: defaults.timings,
            degradation: defaults.degradation,
        }
    }

    /// Validate the persona and timing values.
    pub fn validate(&self) -> Result<(), String> {
        for (name, value) in [
            ("region", &self.region),
            ("character", &self.character),
            ("style", &self.style),
            ("voice", &self.voice),
            ("language", &self.language),
        ] {
            if value.trim().is_empty() {
                return Err(format!("Avatar {name} must not be empty"));
            }
        }

        if !is_rgba_hex(&self.background_color) {
            return Err(format!(
                "Invalid background color '{}': expected #RRGGBBAA",
                self.background_color
            ));
        }

        if self.timings.max_start_attempts == 0 {
            return Err("max_start_attempts must be at least 1".to_string());
        }

        if self.timings.connection_timeout.is_zero() {
            return Err("connection_timeout must be greater than zero".to_string());
        }

        if let Some(endpoint) = &self.private_endpoint
            && (endpoint.is_empty() || endpoint.contains("://") || endpoint.contains('/'))
        {
            return Err(format!(
                "Private endpoint must be a bare host name, got '{endpoint}'"
            ));
        }

        Ok(())
    }
}

fn is_rgba_hex(value: &str) -> bool {
    value
        .strip_prefix('#')
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_or(key: &str, default: String) -> String {
    env_opt(key).unwrap_or(default)
}

fn env_flag(key: &str) -> bool {
    env_opt(key).is_some_and(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
