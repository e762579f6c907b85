//! Microsoft Azure Speech Service region configuration.
//!
//! Regions are free-form identifiers (`eastus2`, `westeurope`, ...). They are
//! normalized to lowercase and used to derive the regional token, TTS and
//! avatar relay endpoints.
//!
//! # Example
//!
//! ```rust
//! use intervue::core::providers::azure::AzureRegion;
//!
//! let region: AzureRegion = "WestEurope".parse().unwrap();
//! assert_eq!(region.as_str(), "westeurope");
//! assert_eq!(region.tts_hostname(), "westeurope.tts.speech.microsoft.com");
//! ```
//!
//! See: <https://learn.microsoft.com/en-us/azure/ai-services/speech-service/regions>

use std::fmt;

/// Regions where the talking avatar service is available at the time of writing.
pub const AVATAR_REGIONS: &[&str] = &[
    "eastus2",
    "southeastasia",
    "northeurope",
    "swedencentral",
    "westeurope",
    "westus2",
    "southcentralus",
];

/// Azure Speech Service region identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AzureRegion(String);

impl Default for AzureRegion {
    fn default() -> Self {
        Self("eastus2".to_string())
    }
}

impl AzureRegion {
    /// Get the region identifier string used in Azure URLs.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the talking avatar is offered in this region.
    pub fn supports_avatar(&self) -> bool {
        AVATAR_REGIONS.contains(&self.as_str())
    }

    /// Get the TTS hostname for this region.
    ///
    /// Format: `<region>.tts.speech.microsoft.com`
    #[inline]
    pub fn tts_hostname(&self) -> String {
        format!("{}.tts.speech.microsoft.com", self.0)
    }

    /// Get the token endpoint for exchanging a subscription key for a
    /// short-lived authorization token.
    ///
    /// # Example
    ///
    /// ```rust
    /// use intervue::core::providers::azure::AzureRegion;
    ///
    /// let region: AzureRegion = "eastus2".parse().unwrap();
    /// assert_eq!(
    ///     region.token_endpoint(),
    ///     "https://eastus2.api.cognitive.microsoft.com/sts/v1.0/issuetoken"
    /// );
    /// ```
    #[inline]
    pub fn token_endpoint(&self) -> String {
        format!(
            "https://{}.api.cognitive.microsoft.com/sts/v1.0/issuetoken",
            self.0
        )
    }

    /// Get the avatar relay (TURN) token endpoint for this region.
    #[inline]
    pub fn avatar_relay_token_url(&self) -> String {
        format!(
            "https://{}/cognitiveservices/avatar/relay/token/v1",
            self.tts_hostname()
        )
    }
}

impl std::str::FromStr for AzureRegion {
    type Err = String;

    /// Parse a region identifier. Whitespace is trimmed and the result is
    /// lowercased; empty identifiers and identifiers containing anything but
    /// ASCII alphanumerics are rejected since they end up in host names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let region = s.trim().to_lowercase();
        if region.is_empty() {
            return Err("Azure region must not be empty".to_string());
        }
        if !region.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("Invalid Azure region '{s}'"));
        }
        Ok(Self(region))
    }
}

impl fmt::Display for AzureRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
