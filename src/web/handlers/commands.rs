//! # Command Handlers
//!
//! Endpoints that accept a command and answer with its correlation id:
//! - `POST /challenge`
//! - `POST /image` (multipart)
//! - `POST /platform/attempt`

use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::debug;

use crate::orchestration::{CreateChallengeRequest, ImageBuildRequest, StartAttemptRequest};
use crate::web::response_types::{ApiResult, CommandAccepted};
use crate::web::state::AppState;

/// Create challenge: POST /challenge
pub async fn create_challenge(
    State(state): State<AppState>,
    payload: Result<Json<CreateChallengeRequest>, JsonRejection>,
) -> ApiResult<Json<CommandAccepted>> {
    let Json(request) = payload?;
    let cor_id = state.context.challenges.create_challenge(request).await?;
    Ok(Json(cor_id.into()))
}

/// Upload an image archive and build it: POST /image
///
/// Form fields: `imageName`, `imageTag`, `creatorName`, `imageFile`.
pub async fn upload_image(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<CommandAccepted>> {
    let mut multipart = multipart?;
    let mut request = ImageBuildRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("imageName") => request.image_name = field.text().await?,
            Some("imageTag") => request.image_tag = field.text().await?,
            Some("creatorName") => request.creator_name = field.text().await?,
            Some("imageFile") => {
                debug!(file_name = ?field.file_name(), "Receiving image archive");
                request.archive = field.bytes().await?;
            }
            other => debug!(field = ?other, "Ignoring unknown form field"),
        }
    }

    let cor_id = state.context.images.build_image(request).await?;
    Ok(Json(cor_id.into()))
}

/// Start an attempt: POST /platform/attempt
pub async fn start_attempt(
    State(state): State<AppState>,
    payload: Result<Json<StartAttemptRequest>, JsonRejection>,
) -> ApiResult<Json<CommandAccepted>> {
    let Json(request) = payload?;
    let cor_id = state.context.attempts.start_attempt(request).await?;
    Ok(Json(cor_id.into()))
}
