//! # Status Log Handlers
//!
//! Read-only views of the `process_engine` log for client polling.

use axum::extract::{Path, State};
use axum::Json;

use crate::models::StatusRecord;
use crate::web::response_types::ApiResult;
use crate::web::state::AppState;

/// Current status for a correlation id: GET /process/status/:cor_id
///
/// 404 until the worker has written its first event.
pub async fn latest_status(
    State(state): State<AppState>,
    Path(cor_id): Path<String>,
) -> ApiResult<Json<StatusRecord>> {
    Ok(Json(state.context.dispatcher.get_latest_status(&cor_id).await?))
}

/// Full history, oldest first: GET /process/:cor_id
pub async fn status_history(
    State(state): State<AppState>,
    Path(cor_id): Path<String>,
) -> ApiResult<Json<Vec<StatusRecord>>> {
    Ok(Json(state.context.dispatcher.get_status_history(&cor_id).await?))
}

/// GET /process/creator/:creator_name
pub async fn by_creator(
    State(state): State<AppState>,
    Path(creator_name): Path<String>,
) -> ApiResult<Json<Vec<StatusRecord>>> {
    Ok(Json(state.context.status_log().by_creator_name(&creator_name).await?))
}

/// GET /process/image/:image_name
pub async fn by_image(
    State(state): State<AppState>,
    Path(image_name): Path<String>,
) -> ApiResult<Json<Vec<StatusRecord>>> {
    Ok(Json(state.context.status_log().by_image_name(&image_name).await?))
}

/// GET /process
pub async fn list_all(State(state): State<AppState>) -> ApiResult<Json<Vec<StatusRecord>>> {
    Ok(Json(state.context.status_log().all().await?))
}
