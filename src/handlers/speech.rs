//! Azure Speech credential endpoint.
//!
//! Exchanges the server's subscription key for short-lived credentials so
//! the key never reaches the avatar client.

use std::sync::Arc;

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::truncate_url;
use crate::core::avatar::{AuthToken, RelayToken};
use crate::core::providers::azure::{AZURE_SUBSCRIPTION_KEY_HEADER, AzureRegion};
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Request body for `POST /api/azure-speech`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechRequest {
    /// `getAuthToken`, `getIceServerToken` or `getSpeechConfig`
    pub action: String,
    /// Private endpoint host for relay tokens, without scheme
    #[serde(default)]
    pub private_endpoint: Option<String>,
}

/// Relay token as returned by Azure.
#[derive(Debug, Deserialize)]
struct AzureRelayToken {
    #[serde(rename = "Urls")]
    urls: Vec<String>,
    #[serde(rename = "Username")]
    username: String,
    #[serde(rename = "Password")]
    password: String,
}

impl From<AzureRelayToken> for RelayToken {
    fn from(token: AzureRelayToken) -> Self {
        Self {
            urls: token.urls,
            username: token.username,
            password: token.password,
        }
    }
}

/// Handler for `POST /api/azure-speech`
pub async fn azure_speech_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SpeechRequest>,
) -> AppResult<Response> {
    let (Some(key), Some(region)) = (
        state.config.azure_speech_key.as_deref(),
        state.speech_region.as_ref(),
    ) else {
        return Err(AppError::InternalServerError(
            "Azure Speech Service not configured".to_string(),
        ));
    };

    match request.action.as_str() {
        "getAuthToken" => {
            let token = fetch_auth_token(&state, key, region).await?;
            Ok(Json(token).into_response())
        }
        "getIceServerToken" => {
            let private_endpoint = request
                .private_endpoint
                .as_deref()
                .map(str::trim)
                .filter(|pe| !pe.is_empty());
            if let Some(pe) = private_endpoint
                && !is_host_name(pe)
            {
                return Err(AppError::BadRequest("Invalid private endpoint".to_string()));
            }
            let token = fetch_relay_token(&state, key, region, private_endpoint).await?;
            Ok(Json(token).into_response())
        }
        "getSpeechConfig" => Ok(Json(json!({
            "region": region.as_str(),
            "endpoint": state.config.azure_speech_endpoint,
        }))
        .into_response()),
        other => {
            debug!(action = other, "Unknown speech action");
            Err(AppError::BadRequest("Invalid action".to_string()))
        }
    }
}

async fn fetch_auth_token(
    state: &AppState,
    key: &str,
    region: &AzureRegion,
) -> AppResult<AuthToken> {
    let url = state.speech_upstream.token_url(region);
    debug!(url = %truncate_url(&url), "Requesting speech authorization token");

    let response = state
        .http
        .post(&url)
        .header(AZURE_SUBSCRIPTION_KEY_HEADER, key)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .timeout(state.config.http_timeout())
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::BadGateway(format!(
            "Failed to get token: {}",
            status.as_u16()
        )));
    }

    let token = response.text().await?;
    if token.trim().is_empty() {
        return Err(AppError::BadGateway(
            "Failed to get token: empty response".to_string(),
        ));
    }

    info!(%region, "Issued speech authorization token");
    Ok(AuthToken {
        token,
        region: region.to_string(),
    })
}

async fn fetch_relay_token(
    state: &AppState,
    key: &str,
    region: &AzureRegion,
    private_endpoint: Option<&str>,
) -> AppResult<RelayToken> {
    let url = state.speech_upstream.relay_url(region, private_endpoint);
    debug!(url = %truncate_url(&url), "Requesting relay token");

    let response = state
        .http
        .get(&url)
        .header(AZURE_SUBSCRIPTION_KEY_HEADER, key)
        .timeout(state.config.http_timeout())
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::BadGateway(format!(
            "Failed to get ICE server token: {}",
            status.as_u16()
        )));
    }

    let token: AzureRelayToken = response
        .json()
        .await
        .map_err(|e| AppError::BadGateway(format!("Malformed ICE server token: {e}")))?;

    info!(servers = token.urls.len(), "Issued relay token");
    Ok(token.into())
}

/// Host names only: the value is spliced into an https URL that receives
/// the subscription key.
fn is_host_name(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}
