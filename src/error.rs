//! # Platform Error Taxonomy
//!
//! Every failure the command-dispatch subsystem can surface to its caller.
//! Each variant maps to exactly one HTTP status at the web boundary
//! (see `web::response_types`); nothing here is retried automatically except
//! the bounded publish retry inside the command publisher.

use thiserror::Error;

use crate::messaging::MessagingError;
use crate::store::StoreError;

/// Why a precondition check rejected a command before any broker interaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreconditionKind {
    /// A referenced resource (image, challenge, attempt token) does not exist
    NotFound,
    /// A uniqueness constraint would be violated
    Conflict,
}

#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Precondition not met: {message}")]
    PreconditionNotMet {
        kind: PreconditionKind,
        message: String,
    },

    /// The command was NOT delivered to the broker
    #[error("Broker unavailable: {source}")]
    BrokerUnavailable {
        #[source]
        source: MessagingError,
    },

    /// No status record exists for the correlation id.
    ///
    /// This is deliberately ambiguous: the id may never have been issued, or
    /// the worker may not have written its first event yet.
    #[error("No status found for correlation id {cor_id}")]
    QueryNotFound { cor_id: String },

    #[error("Document store error: {source}")]
    Store {
        #[source]
        source: StoreError,
    },

    #[error("Object upload failed for {path}: {message}")]
    Upload { path: String, message: String },
}

impl PlatformError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::PreconditionNotMet {
            kind: PreconditionKind::NotFound,
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::PreconditionNotMet {
            kind: PreconditionKind::Conflict,
            message: message.into(),
        }
    }

    pub fn query_not_found(cor_id: impl Into<String>) -> Self {
        Self::QueryNotFound {
            cor_id: cor_id.into(),
        }
    }

    pub fn upload(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Upload {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Short machine-readable code used in logs and API error bodies
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::PreconditionNotMet {
                kind: PreconditionKind::NotFound,
                ..
            } => "NOT_FOUND",
            Self::PreconditionNotMet {
                kind: PreconditionKind::Conflict,
                ..
            } => "CONFLICT",
            Self::BrokerUnavailable { .. } => "BROKER_UNAVAILABLE",
            Self::QueryNotFound { .. } => "STATUS_NOT_FOUND",
            Self::Store { .. } => "STORE_ERROR",
            Self::Upload { .. } => "UPLOAD_FAILED",
        }
    }
}

impl From<MessagingError> for PlatformError {
    fn from(source: MessagingError) -> Self {
        Self::BrokerUnavailable { source }
    }
}

impl From<StoreError> for PlatformError {
    fn from(source: StoreError) -> Self {
        Self::Store { source }
    }
}

pub type Result<T> = std::result::Result<T, PlatformError>;
