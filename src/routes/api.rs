use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::handlers::{chat, speech};
use crate::state::AppState;
use std::sync::Arc;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/azure-speech", post(speech::azure_speech_handler))
        .route("/api/azure-chat", post(chat::azure_chat_handler))
        .layer(TraceLayer::new_for_http())
}
