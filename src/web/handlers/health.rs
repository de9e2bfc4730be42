//! # Health Check Handler

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::system_context::HealthReport;
use crate::web::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
    checks: HealthReport,
}

/// Dependency health: GET /health
///
/// 200 when broker and document store are reachable, 503 otherwise.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let checks = state.context.health().await;
    let (status_code, status) = if checks.is_healthy() {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unhealthy")
    };

    (
        status_code,
        Json(HealthResponse {
            status,
            timestamp: Utc::now().to_rfc3339(),
            checks,
        }),
    )
}
