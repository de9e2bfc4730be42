//! # Web API Error Types
//!
//! HTTP rendering of [`PlatformError`]. Every variant maps to exactly one
//! status code; bodies have the shape `{"error": {"code", "message"}}`.

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::error::{PlatformError, PreconditionKind};
use crate::logging::log_error;
use crate::messaging::CorrelationId;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error("Invalid request: {message}")]
    BadRequest { message: String },
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Platform(err) => match err {
                PlatformError::Validation { .. } => StatusCode::BAD_REQUEST,
                PlatformError::PreconditionNotMet {
                    kind: PreconditionKind::NotFound,
                    ..
                } => StatusCode::NOT_FOUND,
                PlatformError::PreconditionNotMet {
                    kind: PreconditionKind::Conflict,
                    ..
                } => StatusCode::BAD_REQUEST,
                PlatformError::BrokerUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
                PlatformError::QueryNotFound { .. } => StatusCode::NOT_FOUND,
                PlatformError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                PlatformError::Upload { .. } => StatusCode::BAD_GATEWAY,
            },
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::BadRequest { .. } => "BAD_REQUEST",
            Self::Platform(err) => err.code(),
        }
    }

    /// Client-facing message; store internals are not exposed
    fn public_message(&self) -> String {
        match self {
            Self::Platform(PlatformError::Store { .. }) => {
                "Document store operation failed".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();
        if status_code.is_server_error() {
            log_error("web", self.code(), &self.to_string(), None);
        }

        let error_response = json!({
            "error": {
                "code": self.code(),
                "message": self.public_message()
            }
        });

        (status_code, Json(error_response)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(format!("Invalid request body json: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::bad_request(format!("Invalid multipart form: {}", err.body_text()))
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// Body returned when a command is accepted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandAccepted {
    pub cor_id: String,
}

impl From<CorrelationId> for CommandAccepted {
    fn from(cor_id: CorrelationId) -> Self {
        Self {
            cor_id: cor_id.into_string(),
        }
    }
}
