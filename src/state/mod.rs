use std::sync::Arc;

use reqwest::Client;

use crate::config::ServerConfig;
use crate::core::providers::azure::{AzureRegion, build_relay_token_url, build_token_request_url};

/// Where speech credential requests are sent.
///
/// `Azure` derives the URLs from the configured region. `Fixed` points both
/// requests at explicit URLs, which is how tests route them to a mock server.
#[derive(Debug, Clone, Default)]
pub enum SpeechUpstream {
    #[default]
    Azure,
    Fixed { token_url: String, relay_url: String },
}

impl SpeechUpstream {
    pub fn token_url(&self, region: &AzureRegion) -> String {
        match self {
            SpeechUpstream::Azure => build_token_request_url(region),
            SpeechUpstream::Fixed { token_url, .. } => token_url.clone(),
        }
    }

    pub fn relay_url(&self, region: &AzureRegion, private_endpoint: Option<&str>) -> String {
        match self {
            SpeechUpstream::Azure => build_relay_token_url(region, private_endpoint),
            SpeechUpstream::Fixed { relay_url, .. } => relay_url.clone(),
        }
    }
}

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Shared client for all upstream Azure calls
    pub http: Client,
    /// Parsed speech region, present when Azure Speech is configured
    pub speech_region: Option<AzureRegion>,
    pub speech_upstream: SpeechUpstream,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Arc<Self>, reqwest::Error> {
        Self::with_speech_upstream(config, SpeechUpstream::Azure)
    }

    pub fn with_speech_upstream(
        config: ServerConfig,
        speech_upstream: SpeechUpstream,
    ) -> Result<Arc<Self>, reqwest::Error> {
        // Connect timeout only: the chat proxy streams for as long as the
        // completion runs. Credential calls set a per-request timeout.
        let http = Client::builder()
            .connect_timeout(config.http_timeout())
            .build()?;

        let speech_region = if config.has_speech() {
            config
                .azure_speech_region
                .as_deref()
                .and_then(|r| r.parse::<AzureRegion>().ok())
        } else {
            None
        };

        if let Some(region) = &speech_region
            && !region.supports_avatar()
        {
            tracing::warn!(%region, "Azure Speech region does not offer the talking avatar");
        }

        Ok(Arc::new(Self {
            config,
            http,
            speech_region,
            speech_upstream,
        }))
    }
}
