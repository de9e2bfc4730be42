//! # Command Dispatcher
//!
//! The surface other layers use to send commands and poll their outcome:
//! mint a correlation id, publish the envelope, hand the id back. Status
//! queries go straight to the status log.

use tracing::{info, instrument};

use crate::error::Result;
use crate::messaging::{CommandBody, CommandEnvelope, CommandPublisher, CorrelationId};
use crate::models::StatusRecord;
use crate::services::StatusLog;

#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    publisher: CommandPublisher,
    status_log: StatusLog,
}

impl CommandDispatcher {
    pub fn new(publisher: CommandPublisher, status_log: StatusLog) -> Self {
        Self {
            publisher,
            status_log,
        }
    }

    pub fn status_log(&self) -> &StatusLog {
        &self.status_log
    }

    /// Publish a command under a fresh correlation id.
    ///
    /// On success the id is never empty and has not been handed out before.
    /// On failure the command was not delivered and no id is returned.
    pub async fn publish_command(&self, body: impl Into<CommandBody>) -> Result<CorrelationId> {
        self.publish_with_id(CorrelationId::generate(), body).await
    }

    /// Publish under an id the caller minted earlier (image builds need the
    /// id for the archive path before publishing)
    #[instrument(skip(self, cor_id, body), fields(cor_id = %cor_id))]
    pub async fn publish_with_id(
        &self,
        cor_id: CorrelationId,
        body: impl Into<CommandBody>,
    ) -> Result<CorrelationId> {
        let envelope = CommandEnvelope::new(cor_id, body);
        self.publisher.publish_command(&envelope).await?;

        info!(
            kind = %envelope.kind(),
            event_status = %envelope.event_status(),
            "📤 Command accepted"
        );
        Ok(envelope.cor_id().clone())
    }

    pub async fn get_latest_status(&self, cor_id: &str) -> Result<StatusRecord> {
        self.status_log.latest_status(cor_id).await
    }

    pub async fn get_status_history(&self, cor_id: &str) -> Result<Vec<StatusRecord>> {
        self.status_log.history(cor_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PublishConfig;
    use crate::error::PlatformError;
    use crate::messaging::{AttemptStartCommand, InMemoryBroker, MessagingProvider};
    use crate::store::InMemoryDocumentStore;
    use std::sync::Arc;

    fn dispatcher(broker: &InMemoryBroker) -> CommandDispatcher {
        let provider = Arc::new(MessagingProvider::InMemory(broker.clone()));
        let publisher = CommandPublisher::new(
            provider,
            "topic.router",
            PublishConfig {
                timeout_ms: 100,
                max_retries: 0,
                retry_backoff_ms: 0,
            },
        );
        CommandDispatcher::new(
            publisher,
            StatusLog::new(Arc::new(InMemoryDocumentStore::new())),
        )
    }

    fn attempt() -> AttemptStartCommand {
        AttemptStartCommand {
            token: "tok".to_string(),
            challenge_name: "quiz1".to_string(),
            creator_name: "bob".to_string(),
            participant: "a@x.com".to_string(),
            image_registry_link: "registry/bob/nginx:v1".to_string(),
        }
    }

    #[tokio::test]
    async fn test_publish_returns_id_carried_by_envelope() {
        let broker = InMemoryBroker::new();
        let cor_id = dispatcher(&broker).publish_command(attempt()).await.unwrap();

        assert!(!cor_id.as_str().is_empty());
        let published = broker.published_to("platform.fromService.challengeStart");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].json().unwrap()["corId"], cor_id.as_str());
    }

    #[tokio::test]
    async fn test_failed_publish_returns_broker_unavailable() {
        let broker = InMemoryBroker::new();
        broker.drop_connection();
        broker.refuse_reconnects(true);

        let err = dispatcher(&broker).publish_command(attempt()).await.unwrap_err();
        assert!(matches!(err, PlatformError::BrokerUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_polling_before_worker_is_not_found() {
        let broker = InMemoryBroker::new();
        let dispatcher = dispatcher(&broker);
        let cor_id = dispatcher.publish_command(attempt()).await.unwrap();

        assert!(matches!(
            dispatcher.get_latest_status(cor_id.as_str()).await,
            Err(PlatformError::QueryNotFound { .. })
        ));
        assert!(dispatcher
            .get_status_history(cor_id.as_str())
            .await
            .unwrap()
            .is_empty());
    }
}
