//! Azure Speech Services authentication and endpoint helpers.
//!
//! The server exchanges its subscription key for short-lived credentials so
//! the key never reaches the avatar client:
//!
//! 1. An authorization token from the regional `issuetoken` endpoint, used by
//!    the avatar engine for speech synthesis.
//! 2. A relay (TURN) token from the avatar relay endpoint, used to negotiate
//!    the media transport.
//!
//! Deployments with a private speech endpoint skip the authorization token and
//! connect the engine through the endpoint's websocket URL instead.

use super::AzureRegion;

/// The HTTP header name for Azure subscription key authentication.
///
/// # Example
///
/// ```rust
/// use intervue::core::providers::azure::AZURE_SUBSCRIPTION_KEY_HEADER;
///
/// assert_eq!(AZURE_SUBSCRIPTION_KEY_HEADER, "Ocp-Apim-Subscription-Key");
/// ```
pub const AZURE_SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// The HTTP header name for Azure OpenAI key authentication.
pub const AZURE_OPENAI_KEY_HEADER: &str = "api-key";

/// Build the token request URL for a given region.
///
/// # Example
///
/// ```rust
/// use intervue::core::providers::azure::{AzureRegion, build_token_request_url};
///
/// let region: AzureRegion = "eastus2".parse().unwrap();
/// let url = build_token_request_url(&region);
/// assert!(url.contains("eastus2"));
/// assert!(url.ends_with("issuetoken"));
/// ```
#[inline]
pub fn build_token_request_url(region: &AzureRegion) -> String {
    region.token_endpoint()
}

/// Build the avatar relay token URL.
///
/// Uses the private endpoint host when given, the regional TTS host otherwise.
///
/// # Arguments
///
/// * `region` - The Azure region
/// * `private_endpoint` - Optional private endpoint host name (no scheme)
///
/// # Example
///
/// ```rust
/// use intervue::core::providers::azure::{AzureRegion, build_relay_token_url};
///
/// let region = AzureRegion::default();
/// assert_eq!(
///     build_relay_token_url(&region, Some("pe.example.com")),
///     "https://pe.example.com/tts/cognitiveservices/avatar/relay/token/v1"
/// );
/// ```
pub fn build_relay_token_url(region: &AzureRegion, private_endpoint: Option<&str>) -> String {
    match private_endpoint.filter(|pe| !pe.is_empty()) {
        Some(pe) => format!("https://{pe}/tts/cognitiveservices/avatar/relay/token/v1"),
        None => region.avatar_relay_token_url(),
    }
}

/// Build the synthesis websocket URL for a private endpoint with the talking
/// avatar enabled.
///
/// # Example
///
/// ```rust
/// use intervue::core::providers::azure::build_private_endpoint_websocket_url;
///
/// assert_eq!(
///     build_private_endpoint_websocket_url("pe.example.com"),
///     "wss://pe.example.com/tts/cognitiveservices/websocket/v1?enableTalkingAvatar=true"
/// );
/// ```
pub fn build_private_endpoint_websocket_url(private_endpoint: &str) -> String {
    format!("wss://{private_endpoint}/tts/cognitiveservices/websocket/v1?enableTalkingAvatar=true")
}
