//! # Document Store Abstraction
//!
//! The external document store as seen by this service: a set of named
//! collections of JSON documents, read with field-equality filters and an
//! optional sort on the writer-assigned `timestamp` field.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::errors::{StoreError, StoreResult};
use crate::constants::fields;

/// Field-equality filter; an empty filter matches every document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    fields: Map<String, Value>,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field == value`
    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(field.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn matches(&self, document: &Value) -> bool {
        self.fields
            .iter()
            .all(|(field, expected)| document.get(field) == Some(expected))
    }

    /// JSON object form, suitable for containment queries
    pub fn to_json(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

/// Sort on the `timestamp` field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSort {
    TimestampAscending,
    TimestampDescending,
}

impl DocumentSort {
    /// Compare two documents by timestamp; `first_seq`/`second_seq` break ties
    /// by insertion order. Documents without a parseable timestamp sort after
    /// all others in either direction.
    pub(crate) fn compare(
        &self,
        first: (&Value, u64),
        second: (&Value, u64),
    ) -> Ordering {
        let (first_doc, first_seq) = first;
        let (second_doc, second_seq) = second;
        match (document_timestamp(first_doc), document_timestamp(second_doc)) {
            (Some(a), Some(b)) => {
                let ascending = (a, first_seq).cmp(&(b, second_seq));
                match self {
                    Self::TimestampAscending => ascending,
                    Self::TimestampDescending => ascending.reverse(),
                }
            }
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => first_seq.cmp(&second_seq),
        }
    }
}

/// Parse a document's RFC3339 `timestamp` field
pub fn document_timestamp(document: &Value) -> Option<DateTime<Utc>> {
    document
        .get(fields::TIMESTAMP)
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|ts| ts.with_timezone(&Utc))
}

/// Read/append access to the document store
///
/// Implementations are read-mostly and must tolerate unlimited concurrent
/// callers. Every call completes or fails within the store's query deadline.
#[async_trait]
pub trait DocumentStore: Send + Sync + Debug + 'static {
    /// First matching document under `sort`, or `None`
    async fn find_one(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        sort: Option<DocumentSort>,
    ) -> StoreResult<Option<Value>>;

    /// All matching documents; insertion order when `sort` is `None`
    async fn find(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        sort: Option<DocumentSort>,
    ) -> StoreResult<Vec<Value>>;

    /// Append a document
    async fn insert_one(&self, collection: &str, document: Value) -> StoreResult<()>;

    async fn health_check(&self) -> StoreResult<bool>;

    fn backend_name(&self) -> &'static str;
}

/// Run a store operation under a deadline
pub(crate) async fn bounded<T, F>(operation: &str, deadline: Duration, future: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(deadline, future).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::timeout(
            operation,
            u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}
