//! Shared harness for integration tests: a [`PlatformContext`] wired over the
//! in-memory broker, document store and object store, with handles kept so
//! tests can seed worker documents and inspect published messages.

#![allow(dead_code)]

pub mod fixtures;

use std::sync::Arc;

use challenge_platform::config::{ConfigManager, PlatformConfig};
use challenge_platform::messaging::service::PublishedMessage;
use challenge_platform::messaging::{InMemoryBroker, MessagingProvider};
use challenge_platform::services::{ObjectStoreUploader, ObjectUploader};
use challenge_platform::store::{DocumentStore, InMemoryDocumentStore};
use challenge_platform::web::{create_app, AppState};
use challenge_platform::PlatformContext;

pub use fixtures::*;

/// Configuration with short publish deadlines so failure paths stay fast
pub fn test_config() -> PlatformConfig {
    let mut config = PlatformConfig::default();
    config.environment = "test".to_string();
    config.publish.timeout_ms = 300;
    config.publish.max_retries = 1;
    config.publish.retry_backoff_ms = 10;
    config.store.query_timeout_ms = 500;
    config
}

pub struct TestPlatform {
    pub context: Arc<PlatformContext>,
    pub broker: InMemoryBroker,
    pub store: Arc<InMemoryDocumentStore>,
    pub uploader: Arc<ObjectStoreUploader>,
}

impl TestPlatform {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: PlatformConfig) -> Self {
        let manager = ConfigManager::from_config(config).expect("test config is valid");
        let broker = InMemoryBroker::new();
        let store = Arc::new(InMemoryDocumentStore::new());
        let uploader = Arc::new(
            ObjectStoreUploader::from_config(&manager.config().object_store)
                .expect("memory object store"),
        );

        let document_store: Arc<dyn DocumentStore> = store.clone();
        let object_uploader: Arc<dyn ObjectUploader> = uploader.clone();
        let context = PlatformContext::from_parts(
            manager,
            MessagingProvider::InMemory(broker.clone()),
            document_store,
            object_uploader,
        );

        Self {
            context: Arc::new(context),
            broker,
            store,
            uploader,
        }
    }

    pub fn app(&self) -> axum::Router {
        create_app(AppState::new(Arc::clone(&self.context)))
    }

    /// The only message published so far, parsed as JSON
    pub fn single_published(&self) -> (PublishedMessage, serde_json::Value) {
        let published = self.broker.published();
        assert_eq!(published.len(), 1, "expected exactly one published message");
        let message = published.into_iter().next().expect("one message");
        let body = message.json().expect("published body is JSON");
        (message, body)
    }

    /// Take the broker down for good
    pub fn break_broker(&self) {
        self.broker.refuse_reconnects(true);
        self.broker.drop_connection();
    }
}
