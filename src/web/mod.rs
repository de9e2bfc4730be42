//! # Web API Module
//!
//! Axum HTTP boundary. Handlers translate requests into orchestrator calls
//! and render [`PlatformError`](crate::error::PlatformError) through
//! [`response_types::ApiError`].

pub mod handlers;
pub mod response_types;
pub mod routes;
pub mod state;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use response_types::{ApiError, ApiResult, CommandAccepted};
pub use state::AppState;

/// Build the application router with middleware
pub fn create_app(app_state: AppState) -> Router {
    let request_timeout = app_state.config.request_timeout();
    let max_upload_bytes = app_state.config.max_upload_bytes;

    Router::new()
        .merge(routes::health_routes())
        .merge(routes::command_routes(max_upload_bytes))
        .merge(routes::process_routes())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
