//! # Correlation Identifiers
//!
//! The only join key between a published command and the status records the
//! external worker writes for it. Identifiers are random UUIDv4 values rendered
//! as hyphenated strings and carry no meaning of their own.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque correlation identifier, minted once per command
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CorrelationId(String);

impl CorrelationId {
    /// Mint a fresh identifier (128-bit random)
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CorrelationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Allocate a new correlation identifier
pub fn new_correlation_id() -> CorrelationId {
    CorrelationId::generate()
}
