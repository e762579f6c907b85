//! Provider infrastructure for external cloud services.
//!
//! # Available Providers
//!
//! - **azure**: Azure Speech regions, credential endpoints and header names

pub mod azure;

// Re-export Azure types for convenience
pub use azure::{AzureRegion, build_relay_token_url, build_token_request_url};
