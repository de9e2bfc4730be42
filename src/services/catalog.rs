//! # Resource Catalog
//!
//! Precondition lookups for the orchestrators. Checks are read-then-act and
//! not transactional: two concurrent requests can both pass a uniqueness
//! check. Keeping them behind [`ResourceCatalog`] lets a store with
//! conditional writes replace the lookup without touching orchestration.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::constants::{collections, fields};
use crate::models::{AttemptRecord, ChallengeRecord, ImageRecord};
use crate::store::{DocumentFilter, DocumentStore, StoreError, StoreResult};

#[async_trait]
pub trait ResourceCatalog: Send + Sync + Debug + 'static {
    async fn find_image(
        &self,
        image_name: &str,
        image_tag: &str,
        creator_name: &str,
    ) -> StoreResult<Option<ImageRecord>>;

    async fn find_challenge(
        &self,
        challenge_name: &str,
        creator_name: &str,
    ) -> StoreResult<Option<ChallengeRecord>>;

    async fn find_attempt(&self, token: &str) -> StoreResult<Option<AttemptRecord>>;
}

/// Catalog reading the worker-owned resource collections
#[derive(Debug, Clone)]
pub struct DocumentCatalog {
    store: Arc<dyn DocumentStore>,
}

impl DocumentCatalog {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn find_typed<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter: DocumentFilter,
    ) -> StoreResult<Option<T>> {
        match self.store.find_one(collection, &filter, None).await? {
            Some(document) => serde_json::from_value(document).map(Some).map_err(|e| {
                StoreError::serialization(format!("invalid {collection} document: {e}"))
            }),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ResourceCatalog for DocumentCatalog {
    async fn find_image(
        &self,
        image_name: &str,
        image_tag: &str,
        creator_name: &str,
    ) -> StoreResult<Option<ImageRecord>> {
        let filter = DocumentFilter::new()
            .eq(fields::IMAGE_NAME, image_name)
            .eq(fields::IMAGE_TAG, image_tag)
            .eq(fields::CREATOR_NAME, creator_name);
        self.find_typed(collections::IMAGE, filter).await
    }

    async fn find_challenge(
        &self,
        challenge_name: &str,
        creator_name: &str,
    ) -> StoreResult<Option<ChallengeRecord>> {
        let filter = DocumentFilter::new()
            .eq(fields::CHALLENGE_NAME, challenge_name)
            .eq(fields::CREATOR_NAME, creator_name);
        self.find_typed(collections::CHALLENGE, filter).await
    }

    async fn find_attempt(&self, token: &str) -> StoreResult<Option<AttemptRecord>> {
        let filter = DocumentFilter::new().eq(fields::TOKEN, token);
        self.find_typed(collections::ATTEMPT, filter).await
    }
}
