pub mod api;

use std::sync::Arc;

use axum::{Router, routing::get};

use crate::handlers;
use crate::state::AppState;

/// Full application router: public health check plus the API routes.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::api::health_check))
        .merge(api::create_api_router())
        .with_state(state)
}
