//! Short-lived credentials for the avatar engine and media transport.
//!
//! The session never sees the speech subscription key. It asks the
//! credential endpoint (`POST /api/azure-speech`) for an authorization token
//! and for relay (TURN) credentials, which expire quickly and are therefore
//! fetched again for every transport negotiation attempt.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Authorization token for the speech service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    pub token: String,
    pub region: String,
}

/// Relay (TURN) credentials for the media transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayToken {
    pub urls: Vec<String>,
    pub username: String,
    pub password: String,
}

/// Errors returned by a credential source.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("credential endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("malformed credential response: {0}")]
    Malformed(String),
}

/// Source of short-lived speech and relay credentials.
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Fetch an authorization token for the speech engine.
    async fn auth_token(&self) -> Result<AuthToken, CredentialError>;

    /// Fetch relay credentials, optionally through a private endpoint.
    async fn relay_token(&self, private_endpoint: Option<&str>)
    -> Result<RelayToken, CredentialError>;
}

/// [`CredentialSource`] backed by the `/api/azure-speech` endpoint.
#[derive(Debug, Clone)]
pub struct HttpCredentialSource {
    client: Client,
    endpoint_url: String,
}

impl HttpCredentialSource {
    /// Path of the credential endpoint relative to the server base URL.
    pub const PATH: &'static str = "/api/azure-speech";

    /// Create a credential source for the server at `base_url`.
    ///
    /// # Arguments
    /// * `base_url` - Server base URL, e.g. `http://localhost:3001`
    /// * `timeout` - Per-request timeout
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, CredentialError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a credential source that reuses an existing HTTP client.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint_url: format!("{}{}", base_url.trim_end_matches('/'), Self::PATH),
        }
    }

    async fn post_action<T: for<'de> Deserialize<'de>>(
        &self,
        body: serde_json::Value,
    ) -> Result<T, CredentialError> {
        let response = self.client.post(&self.endpoint_url).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(CredentialError::Status {
                status: status.as_u16(),
                body: body.chars().take(500).collect(),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| CredentialError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl CredentialSource for HttpCredentialSource {
    async fn auth_token(&self) -> Result<AuthToken, CredentialError> {
        let token: AuthToken = self.post_action(json!({ "action": "getAuthToken" })).await?;
        if token.token.is_empty() {
            return Err(CredentialError::Malformed("empty authorization token".to_string()));
        }
        tracing::debug!(region = %token.region, "Fetched speech authorization token");
        Ok(token)
    }

    async fn relay_token(
        &self,
        private_endpoint: Option<&str>,
    ) -> Result<RelayToken, CredentialError> {
        let mut body = json!({ "action": "getIceServerToken" });
        if let Some(pe) = private_endpoint {
            body["privateEndpoint"] = json!(pe);
        }

        let token: RelayToken = self.post_action(body).await?;
        tracing::debug!(servers = token.urls.len(), "Fetched relay token");
        Ok(token)
    }
}
