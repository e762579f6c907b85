//! Microsoft Azure Speech Services provider infrastructure.
//!
//! Shared endpoint and authentication helpers used by the credential
//! endpoints on the server side and by the avatar engine setup.
//!
//! - **region**: Region identifiers and the regional endpoints derived from them
//! - **auth**: Header names plus token, relay and private endpoint URL builders
//!
//! See: <https://learn.microsoft.com/en-us/azure/ai-services/speech-service/text-to-speech-avatar/what-is-text-to-speech-avatar>

pub mod auth;
pub mod region;

// Re-export commonly used types
pub use auth::{
    AZURE_OPENAI_KEY_HEADER, AZURE_SUBSCRIPTION_KEY_HEADER, build_private_endpoint_websocket_url,
    build_relay_token_url, build_token_request_url,
};
pub use region::{AVATAR_REGIONS, AzureRegion};
