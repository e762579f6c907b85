//! Azure OpenAI chat proxy.
//!
//! Builds the interviewer conversation from the request context and streams
//! the upstream completion body back unchanged.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use tracing::{debug, info};

use super::truncate_url;
use crate::core::interview::{ChatContext, ChatMessage, build_chat_messages};
use crate::core::providers::azure::AZURE_OPENAI_KEY_HEADER;
use crate::errors::{AppError, AppResult};
use crate::state::AppState;

/// Body sent to the Azure OpenAI chat completions endpoint.
#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    messages: &'a [ChatMessage],
    stream: bool,
    temperature: f32,
    max_tokens: u32,
}

/// Handler for `POST /api/azure-chat`
pub async fn azure_chat_handler(
    State(state): State<Arc<AppState>>,
    Json(context): Json<ChatContext>,
) -> AppResult<Response> {
    let (Some(url), Some(api_key)) = (
        state.config.chat_completions_url(),
        state.config.azure_openai_api_key.as_deref(),
    ) else {
        return Err(AppError::InternalServerError(
            "Azure OpenAI not configured".to_string(),
        ));
    };

    let messages = build_chat_messages(&context);
    info!(
        turns = context.interview_history.len(),
        has_user_message = context.user_message.is_some(),
        "Chat completion requested"
    );
    debug!(url = %truncate_url(&url), messages = messages.len(), "Calling Azure OpenAI");

    let request = CompletionRequest {
        messages: &messages,
        stream: true,
        temperature: state.config.chat_temperature,
        max_tokens: state.config.chat_max_tokens,
    };

    let upstream = state
        .http
        .post(&url)
        .header(AZURE_OPENAI_KEY_HEADER, api_key)
        .json(&request)
        .send()
        .await?;

    let status = upstream.status();
    if !status.is_success() {
        let body = upstream.text().await.unwrap_or_default();
        return Err(AppError::BadGateway(format!(
            "Azure OpenAI API error: {} - {}",
            status.as_u16(),
            body.chars().take(200).collect::<String>()
        )));
    }

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::CACHE_CONTROL, "no-cache"),
        ],
        Body::from_stream(upstream.bytes_stream()),
    )
        .into_response())
}
