//! # Command Publisher
//!
//! Publishes serialized commands to the topic exchange. Each call opens its
//! own channel on the shared connection and closes it before returning,
//! whatever the outcome. The whole call is bounded: every attempt runs under
//! the publish deadline and at most `max_retries` retries follow the first
//! attempt, separated by a fixed backoff. A connection or channel failure
//! re-dials the broker, also after the last attempt, so a later call finds a
//! live connection even with retries disabled.

use std::sync::Arc;

use tokio::time::timeout;
use tracing::{debug, warn};

use super::envelope::CommandEnvelope;
use super::errors::{MessagingError, MessagingResult};
use super::service::MessagingProvider;
use crate::config::PublishConfig;
use crate::logging::log_command_operation;

#[derive(Debug, Clone)]
pub struct CommandPublisher {
    provider: Arc<MessagingProvider>,
    exchange: String,
    config: PublishConfig,
}

impl CommandPublisher {
    pub fn new(provider: Arc<MessagingProvider>, exchange: impl Into<String>, config: PublishConfig) -> Self {
        Self {
            provider,
            exchange: exchange.into(),
            config,
        }
    }

    pub fn exchange(&self) -> &str {
        &self.exchange
    }

    pub fn provider(&self) -> &Arc<MessagingProvider> {
        &self.provider
    }

    /// Publish an envelope on its kind's routing key
    pub async fn publish_command(&self, envelope: &CommandEnvelope) -> MessagingResult<()> {
        let payload = envelope.to_bytes()?;
        let routing_key = envelope.routing_key();
        let result = self.publish(&self.exchange, routing_key, &payload).await;

        let status = if result.is_ok() { "published" } else { "failed" };
        let details = result.as_ref().err().map(|e| e.to_string());
        log_command_operation(
            "publish_command",
            Some(envelope.cor_id().as_str()),
            Some(envelope.kind().as_str()),
            Some(routing_key),
            status,
            details.as_deref(),
        );
        result
    }

    /// Publish raw JSON bytes with persistent delivery and a confirm
    pub async fn publish(&self, exchange: &str, routing_key: &str, body: &[u8]) -> MessagingResult<()> {
        let attempts = self.config.max_retries.saturating_add(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            if attempt > 1 {
                tokio::time::sleep(self.config.retry_backoff()).await;
            }

            let generation = self.provider.connection_generation();
            let err = match self.publish_once(exchange, routing_key, body).await {
                Ok(()) => {
                    debug!(exchange, routing_key, attempt, "Command published");
                    return Ok(());
                }
                Err(err) => err,
            };

            warn!(
                exchange,
                routing_key,
                attempt,
                max_attempts = attempts,
                error = %err,
                "⚠️ Publish attempt failed"
            );

            if !err.is_retryable() {
                return Err(err);
            }
            if err.requires_reconnect() {
                self.reconnect_bounded(generation).await;
            }
            last_error = Some(err);
        }

        Err(match last_error {
            Some(err) => MessagingError::retries_exhausted(attempts, &err),
            None => MessagingError::configuration("publish", "no publish attempt was made"),
        })
    }

    async fn publish_once(&self, exchange: &str, routing_key: &str, body: &[u8]) -> MessagingResult<()> {
        let deadline = self.config.timeout();

        let channel = match timeout(deadline, self.provider.open_channel()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(MessagingError::channel(format!(
                    "opening channel timed out after {}ms",
                    self.config.timeout_ms
                )))
            }
        };

        let result = match timeout(deadline, channel.publish(exchange, routing_key, body)).await {
            Ok(result) => result,
            Err(_) => Err(MessagingError::timeout("publish", self.config.timeout_ms)),
        };

        match timeout(deadline, channel.close()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "Closing publish channel failed"),
            Err(_) => debug!("Closing publish channel timed out"),
        }

        result
    }

    async fn reconnect_bounded(&self, observed_generation: u64) {
        let reconnect = self.provider.reconnect(observed_generation);
        match timeout(self.config.timeout(), reconnect).await {
            Ok(Ok(())) => debug!(provider = self.provider.provider_name(), "Broker reconnected"),
            Ok(Err(e)) => warn!(error = %e, "❌ Broker reconnect failed"),
            Err(_) => warn!(timeout_ms = self.config.timeout_ms, "❌ Broker reconnect timed out"),
        }
    }
}
