//! # Status Records
//!
//! Entries of the append-only `process_engine` log written by the external
//! worker. This service only reads them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messaging::{EventOutcome, EventStatus};
use crate::store::StoreError;

/// One lifecycle event for a correlation id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecord {
    pub cor_id: String,
    /// Assigned by the writer; orders records within one correlation id
    pub timestamp: DateTime<Utc>,
    pub event: EventStatus,
    /// Outcome as written by the worker; see [`StatusRecord::outcome`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_status: Option<EventOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub challenge_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<String>>,
}

impl StatusRecord {
    /// Minimal record, as a worker would write for a bare transition
    pub fn new(cor_id: impl Into<String>, event: EventStatus, timestamp: DateTime<Utc>) -> Self {
        Self {
            cor_id: cor_id.into(),
            timestamp,
            event,
            event_status: None,
            creator_name: None,
            challenge_name: None,
            image_name: None,
            image_tag: None,
            participant: None,
            participants: None,
        }
    }

    /// Written outcome, or the one implied by the event
    pub fn outcome(&self) -> EventOutcome {
        self.event_status.unwrap_or_else(|| self.event.outcome())
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome() != EventOutcome::InProgress
    }

    /// Decode a stored document; unknown event names are rejected
    pub fn from_document(document: Value) -> Result<Self, StoreError> {
        serde_json::from_value(document)
            .map_err(|e| StoreError::serialization(format!("invalid status record: {}", e)))
    }

    pub fn to_document(&self) -> Result<Value, StoreError> {
        Ok(serde_json::to_value(self)?)
    }
}
