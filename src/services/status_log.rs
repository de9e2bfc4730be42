//! # Status Log Query
//!
//! Read side of the dispatch path. Clients poll with the correlation id they
//! received when their command was accepted; the current status is the
//! record with the greatest writer-assigned timestamp.
//!
//! A missing record is reported as [`PlatformError::QueryNotFound`]. That
//! covers both "accepted but the worker has not written yet" and "unknown
//! id": the log has no way to tell them apart.
//!
//! Records whose `timestamp` is not an RFC3339 string cannot be ordered.
//! They are skipped with a warning and never become the latest status.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::constants::{collections, fields};
use crate::error::{PlatformError, Result};
use crate::models::StatusRecord;
use crate::store::{document_timestamp, DocumentFilter, DocumentSort, DocumentStore};

#[derive(Debug, Clone)]
pub struct StatusLog {
    store: Arc<dyn DocumentStore>,
}

impl StatusLog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Record with the maximum timestamp for `cor_id`
    pub async fn latest_status(&self, cor_id: &str) -> Result<StatusRecord> {
        let filter = Self::cor_id_filter(cor_id)?;
        let document = self
            .store
            .find_one(
                collections::PROCESS_ENGINE,
                &filter,
                Some(DocumentSort::TimestampDescending),
            )
            .await?
            .filter(is_orderable)
            .ok_or_else(|| PlatformError::query_not_found(cor_id))?;

        let record = StatusRecord::from_document(document)?;
        debug!(cor_id, event = %record.event, "Latest status resolved");
        Ok(record)
    }

    /// Every record for `cor_id`, oldest first; empty when none exist yet
    pub async fn history(&self, cor_id: &str) -> Result<Vec<StatusRecord>> {
        let filter = Self::cor_id_filter(cor_id)?;
        self.query(filter, Some(DocumentSort::TimestampAscending)).await
    }

    pub async fn by_creator_name(&self, creator_name: &str) -> Result<Vec<StatusRecord>> {
        let filter = Self::required_filter(fields::CREATOR_NAME, creator_name)?;
        self.query(filter, None).await
    }

    pub async fn by_image_name(&self, image_name: &str) -> Result<Vec<StatusRecord>> {
        let filter = Self::required_filter(fields::IMAGE_NAME, image_name)?;
        self.query(filter, None).await
    }

    /// The whole log in store order
    pub async fn all(&self) -> Result<Vec<StatusRecord>> {
        self.query(DocumentFilter::new(), None).await
    }

    async fn query(
        &self,
        filter: DocumentFilter,
        sort: Option<DocumentSort>,
    ) -> Result<Vec<StatusRecord>> {
        let documents = self
            .store
            .find(collections::PROCESS_ENGINE, &filter, sort)
            .await?;
        documents
            .into_iter()
            .filter(is_orderable)
            .map(|doc| StatusRecord::from_document(doc).map_err(PlatformError::from))
            .collect()
    }

    fn cor_id_filter(cor_id: &str) -> Result<DocumentFilter> {
        Self::required_filter(fields::COR_ID, cor_id)
    }

    fn required_filter(field: &str, value: &str) -> Result<DocumentFilter> {
        if value.trim().is_empty() {
            return Err(PlatformError::validation(format!("{field} cannot be empty")));
        }
        Ok(DocumentFilter::new().eq(field, value))
    }
}

/// Unorderable records sort after all others, so the descending lookup only
/// returns one when the id has no orderable record at all
fn is_orderable(document: &Value) -> bool {
    if document_timestamp(document).is_some() {
        return true;
    }
    warn!(
        cor_id = document.get(fields::COR_ID).and_then(serde_json::Value::as_str).unwrap_or_default(),
        timestamp = %document.get(fields::TIMESTAMP).unwrap_or(&serde_json::Value::Null),
        "⚠️ Skipping status record without an RFC3339 timestamp"
    );
    false
}
