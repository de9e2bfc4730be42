//! # Document Store Error Types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Document store connection error: {message}")]
    Connection { message: String },

    #[error("Document store query failed on {collection}: {message}")]
    Query { collection: String, message: String },

    #[error("Document store timeout: {operation} exceeded {timeout_ms}ms")]
    Timeout { operation: String, timeout_ms: u64 },

    #[error("Document (de)serialization error: {message}")]
    Serialization { message: String },

    #[error("Document store schema error: {message}")]
    Schema { message: String },

    #[error("Document store configuration error: {message}")]
    Configuration { message: String },
}

impl StoreError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(collection: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            collection: collection.into(),
            message: message.into(),
        }
    }

    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::connection(err.to_string())
            }
            _ => StoreError::query("unknown", err.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::serialization(err.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
