//! # Platform Context
//!
//! Dependency container for the dispatch service. The broker connection is
//! an explicit resource: [`PlatformContext::init`] dials it once (failing
//! fast if the broker is unreachable) and [`PlatformContext::shutdown`]
//! closes it. Components receive what they need from here rather than
//! reaching for globals, so tests can build a context over in-memory
//! collaborators with [`PlatformContext::from_parts`].

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::ConfigManager;
use crate::error::Result;
use crate::messaging::{
    BrokerTopology, CommandPublisher, InMemoryBroker, MessagingProvider, RabbitMqBroker,
};
use crate::orchestration::{
    AttemptOrchestrator, ChallengeOrchestrator, CommandDispatcher, ImageOrchestrator,
};
use crate::services::{
    DocumentCatalog, ObjectStoreUploader, ObjectUploader, ResourceCatalog, StatusLog,
};
use crate::store::{DocumentStore, InMemoryDocumentStore, PgDocumentStore};

/// Dependency health as reported by `/health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub broker: bool,
    pub document_store: bool,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.broker && self.document_store
    }
}

pub struct PlatformContext {
    /// Instance id, for log correlation across restarts
    pub context_id: Uuid,
    pub config_manager: Arc<ConfigManager>,
    pub messaging_provider: Arc<MessagingProvider>,
    pub document_store: Arc<dyn DocumentStore>,
    pub dispatcher: Arc<CommandDispatcher>,
    pub challenges: ChallengeOrchestrator,
    pub images: ImageOrchestrator,
    pub attempts: AttemptOrchestrator,
    /// Kept so shutdown can close the pool
    pg_store: Option<PgDocumentStore>,
}

impl std::fmt::Debug for PlatformContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformContext")
            .field("context_id", &self.context_id)
            .field("environment", &self.config_manager.environment())
            .field("messaging_provider", &self.messaging_provider.provider_name())
            .field("document_store", &self.document_store.backend_name())
            .finish()
    }
}

impl PlatformContext {
    /// Connect every external dependency described by the configuration
    pub async fn init(config_manager: Arc<ConfigManager>) -> Result<Self> {
        let config = config_manager.config();
        info!(
            environment = %config_manager.environment(),
            broker = %config.broker.redacted_url(),
            "🔧 Initializing PlatformContext"
        );

        let broker = RabbitMqBroker::connect(&config.broker).await?;
        let provider = MessagingProvider::RabbitMq(broker);
        provider
            .declare_topology(&BrokerTopology::from_config(&config.broker))
            .await?;

        let (document_store, pg_store): (Arc<dyn DocumentStore>, Option<PgDocumentStore>) =
            if config.store.database_url.is_some() {
                let pg = PgDocumentStore::connect(&config.store).await?;
                pg.ensure_schema().await?;
                (Arc::new(pg.clone()), Some(pg))
            } else {
                warn!("⚠️ store.database_url not set, using in-memory document store");
                (Arc::new(InMemoryDocumentStore::new()), None)
            };

        let uploader: Arc<dyn ObjectUploader> =
            Arc::new(ObjectStoreUploader::from_config(&config.object_store)?);

        let mut context = Self::from_parts(config_manager, provider, document_store, uploader);
        context.pg_store = pg_store;

        info!(context_id = %context.context_id, "✅ PlatformContext initialized");
        Ok(context)
    }

    /// Context over the in-memory broker and store, for tests and local runs
    pub async fn in_memory(config_manager: Arc<ConfigManager>) -> Result<Self> {
        let config = config_manager.config();
        let provider = MessagingProvider::InMemory(InMemoryBroker::new());
        provider
            .declare_topology(&BrokerTopology::from_config(&config.broker))
            .await?;
        let uploader: Arc<dyn ObjectUploader> =
            Arc::new(ObjectStoreUploader::from_config(&config.object_store)?);

        Ok(Self::from_parts(
            config_manager,
            provider,
            Arc::new(InMemoryDocumentStore::new()),
            uploader,
        ))
    }

    /// Wire components over already-constructed collaborators
    pub fn from_parts(
        config_manager: Arc<ConfigManager>,
        provider: MessagingProvider,
        document_store: Arc<dyn DocumentStore>,
        uploader: Arc<dyn ObjectUploader>,
    ) -> Self {
        let config = config_manager.config();
        let messaging_provider = Arc::new(provider);

        let publisher = CommandPublisher::new(
            Arc::clone(&messaging_provider),
            config.broker.exchange.clone(),
            config.publish.clone(),
        );
        let status_log = StatusLog::new(Arc::clone(&document_store));
        let dispatcher = Arc::new(CommandDispatcher::new(publisher, status_log));
        let catalog: Arc<dyn ResourceCatalog> =
            Arc::new(DocumentCatalog::new(Arc::clone(&document_store)));

        Self {
            context_id: Uuid::new_v4(),
            messaging_provider,
            challenges: ChallengeOrchestrator::new(Arc::clone(&catalog), Arc::clone(&dispatcher)),
            images: ImageOrchestrator::new(
                Arc::clone(&catalog),
                uploader,
                Arc::clone(&dispatcher),
            ),
            attempts: AttemptOrchestrator::new(catalog, Arc::clone(&dispatcher)),
            dispatcher,
            document_store,
            config_manager,
            pg_store: None,
        }
    }

    pub fn status_log(&self) -> &StatusLog {
        self.dispatcher.status_log()
    }

    pub async fn health(&self) -> HealthReport {
        let broker = self.messaging_provider.health_check().await.unwrap_or(false);
        let document_store = self.document_store.health_check().await.unwrap_or(false);
        HealthReport {
            broker,
            document_store,
        }
    }

    /// Close the broker connection and the database pool
    pub async fn shutdown(&self) -> Result<()> {
        info!(context_id = %self.context_id, "🛑 Shutting down PlatformContext");
        self.messaging_provider.shutdown().await?;
        if let Some(pg) = &self.pg_store {
            pg.close().await;
        }
        Ok(())
    }
}
