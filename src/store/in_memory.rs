//! # In-Memory Document Store
//!
//! Same filter and sort semantics as the Postgres store, kept in process
//! memory. Used by tests, local development, and as the fallback when no
//! database URL is configured.

use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::errors::{StoreError, StoreResult};
use super::traits::{DocumentFilter, DocumentSort, DocumentStore};

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    collections: DashMap<String, Vec<(u64, Value)>>,
    next_seq: AtomicU64,
    fail_next_queries: AtomicU32,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` reads with a connection error
    pub fn fail_next_queries(&self, count: u32) {
        self.fail_next_queries.store(count, Ordering::SeqCst);
    }

    /// Number of documents in a collection
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    fn check_fault(&self) -> StoreResult<()> {
        let fired = self
            .fail_next_queries
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if fired {
            Err(StoreError::connection("injected document store failure"))
        } else {
            Ok(())
        }
    }

    fn matching(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        sort: Option<DocumentSort>,
    ) -> Vec<Value> {
        let mut docs: Vec<(u64, Value)> = match self.collections.get(collection) {
            Some(entries) => entries
                .iter()
                .filter(|(_, doc)| filter.matches(doc))
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        if let Some(sort) = sort {
            docs.sort_by(|(a_seq, a), (b_seq, b)| sort.compare((a, *a_seq), (b, *b_seq)));
        }
        docs.into_iter().map(|(_, doc)| doc).collect()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_one(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        sort: Option<DocumentSort>,
    ) -> StoreResult<Option<Value>> {
        self.check_fault()?;
        Ok(self.matching(collection, filter, sort).into_iter().next())
    }

    async fn find(
        &self,
        collection: &str,
        filter: &DocumentFilter,
        sort: Option<DocumentSort>,
    ) -> StoreResult<Vec<Value>> {
        self.check_fault()?;
        Ok(self.matching(collection, filter, sort))
    }

    async fn insert_one(&self, collection: &str, document: Value) -> StoreResult<()> {
        if !document.is_object() {
            return Err(StoreError::serialization("documents must be JSON objects"));
        }
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push((seq, document));
        Ok(())
    }

    async fn health_check(&self) -> StoreResult<bool> {
        Ok(true)
    }

    fn backend_name(&self) -> &'static str {
        "in_memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_find_one_respects_sort() {
        let store = InMemoryDocumentStore::new();
        for ts in ["2024-01-01T00:00:02Z", "2024-01-01T00:00:03Z", "2024-01-01T00:00:01Z"] {
            store
                .insert_one("process_engine", json!({"corId": "c", "timestamp": ts}))
                .await
                .unwrap();
        }
        let filter = DocumentFilter::new().eq("corId", "c");

        let latest = store
            .find_one("process_engine", &filter, Some(DocumentSort::TimestampDescending))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(latest["timestamp"], "2024-01-01T00:00:03Z");

        let unsorted = store.find("process_engine", &filter, None).await.unwrap();
        assert_eq!(unsorted[0]["timestamp"], "2024-01-01T00:00:02Z");
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() {
        let store = InMemoryDocumentStore::new();
        let found = store
            .find_one("missing", &DocumentFilter::new(), None)
            .await
            .unwrap();
        assert!(found.is_none());
        assert_eq!(store.count("missing"), 0);
    }

    #[tokio::test]
    async fn test_injected_failure_surfaces_once() {
        let store = InMemoryDocumentStore::new();
        store.fail_next_queries(1);
        assert!(store.find("image", &DocumentFilter::new(), None).await.is_err());
        assert!(store.find("image", &DocumentFilter::new(), None).await.is_ok());
    }

    #[tokio::test]
    async fn test_rejects_non_object_documents() {
        let store = InMemoryDocumentStore::new();
        assert!(store.insert_one("image", json!([1, 2])).await.is_err());
    }
}
