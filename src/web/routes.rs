//! # Web API Route Definitions

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::web::handlers;
use crate::web::state::AppState;

/// Command submission routes
pub fn command_routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/challenge", post(handlers::commands::create_challenge))
        .route(
            "/image",
            post(handlers::commands::upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/platform/attempt", post(handlers::commands::start_attempt))
}

/// Status log routes
pub fn process_routes() -> Router<AppState> {
    Router::new()
        .route("/process", get(handlers::process::list_all))
        .route("/process/status/:cor_id", get(handlers::process::latest_status))
        .route("/process/creator/:creator_name", get(handlers::process::by_creator))
        .route("/process/image/:image_name", get(handlers::process::by_image))
        .route("/process/:cor_id", get(handlers::process::status_history))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
