//! # RabbitMQ Broker Provider
//!
//! AMQP 0.9.1 implementation of [`MessageBroker`] using the `lapin` crate.
//!
//! ## Connection model
//!
//! One connection per process, dialed at startup. Every publish opens its
//! own channel on that connection and closes it afterwards. The connection
//! handle lives behind a `tokio::sync::RwLock<Arc<Connection>>`: readers
//! clone the `Arc` and release the lock immediately, `reconnect` swaps in a
//! freshly dialed connection under the write lock. Each swap bumps a
//! generation counter; a caller re-dials only for the generation it saw
//! fail, so concurrent failures produce a single replacement.
//!
//! ## Usage
//!
//! ```ignore
//! let broker = RabbitMqBroker::connect(&BrokerConfig::default()).await?;
//! broker.declare_topology(&BrokerTopology::default()).await?;
//!
//! let channel = broker.open_channel().await?;
//! channel.publish("topic.router", "platform.fromService.imageCreate", b"{}").await?;
//! channel.close().await?;
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lapin::options::{
    BasicPublishOptions, ConfirmSelectOptions, ExchangeDeclareOptions, QueueBindOptions,
    QueueDeclareOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties, ExchangeKind};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::BrokerConfig;
use crate::constants::broker::{CONTENT_TYPE_JSON, DELIVERY_MODE_PERSISTENT};
use crate::messaging::service::traits::{BrokerChannel, BrokerTopology, MessageBroker};
use crate::messaging::MessagingError;

/// RabbitMQ broker holding the process-wide connection
pub struct RabbitMqBroker {
    config: BrokerConfig,
    connection: RwLock<Arc<Connection>>,
    /// Bumped on every connection swap
    generation: AtomicU64,
    /// Serializes re-dials
    reconnect_lock: Mutex<()>,
}

impl std::fmt::Debug for RabbitMqBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RabbitMqBroker")
            .field("url", &self.config.redacted_url())
            .finish()
    }
}

impl RabbitMqBroker {
    /// Dial the broker; fails fast when it is unreachable
    pub async fn connect(config: &BrokerConfig) -> Result<Self, MessagingError> {
        let connection = Self::dial(config).await?;

        info!(
            url = %config.redacted_url(),
            connection_name = %config.connection_name,
            "✅ RabbitMQ connection established"
        );

        Ok(Self {
            config: config.clone(),
            connection: RwLock::new(Arc::new(connection)),
            generation: AtomicU64::new(0),
            reconnect_lock: Mutex::new(()),
        })
    }

    async fn dial(config: &BrokerConfig) -> Result<Connection, MessagingError> {
        let url = config.connection_url();
        let timeout = config.connection_timeout();
        let properties = ConnectionProperties::default()
            .with_connection_name(config.connection_name.clone().into());

        match tokio::time::timeout(timeout, Connection::connect(&url, properties)).await {
            Ok(Ok(connection)) => Ok(connection),
            Ok(Err(e)) => Err(MessagingError::connection(format!(
                "RabbitMQ connection to {} failed: {}",
                config.redacted_url(),
                e
            ))),
            Err(_) => Err(MessagingError::connection(format!(
                "RabbitMQ connection to {} timed out after {}s",
                config.redacted_url(),
                config.connection_timeout_seconds
            ))),
        }
    }

    async fn current(&self) -> Arc<Connection> {
        Arc::clone(&*self.connection.read().await)
    }
}

#[async_trait]
impl MessageBroker for RabbitMqBroker {
    type Channel = Channel;

    async fn open_channel(&self) -> Result<Channel, MessagingError> {
        let connection = self.current().await;
        if !connection.status().connected() {
            return Err(MessagingError::connection(
                "RabbitMQ connection is not connected",
            ));
        }

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| MessagingError::channel(format!("RabbitMQ channel creation failed: {}", e)))?;

        channel
            .confirm_select(ConfirmSelectOptions::default())
            .await
            .map_err(|e| MessagingError::channel(format!("Failed to enable publisher confirms: {}", e)))?;

        Ok(channel)
    }

    fn connection_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    async fn reconnect(&self, observed_generation: u64) -> Result<(), MessagingError> {
        let _guard = self.reconnect_lock.lock().await;

        let current_generation = self.connection_generation();
        if current_generation != observed_generation {
            debug!(
                observed_generation,
                current_generation,
                "RabbitMQ connection already replaced, skipping re-dial"
            );
            return Ok(());
        }
        if self.current().await.status().connected() {
            debug!(current_generation, "RabbitMQ connection still connected, skipping re-dial");
            return Ok(());
        }

        warn!(url = %self.config.redacted_url(), "🔄 Re-dialing RabbitMQ connection");
        let fresh = Arc::new(Self::dial(&self.config).await?);

        let previous = {
            let mut slot = self.connection.write().await;
            self.generation.fetch_add(1, Ordering::SeqCst);
            std::mem::replace(&mut *slot, fresh)
        };

        if previous.status().connected() {
            if let Err(e) = previous.close(200, "replaced").await {
                debug!(error = %e, "Closing replaced RabbitMQ connection failed");
            }
        }

        info!(url = %self.config.redacted_url(), "✅ RabbitMQ connection replaced");
        Ok(())
    }

    async fn declare_topology(&self, topology: &BrokerTopology) -> Result<(), MessagingError> {
        let connection = self.current().await;
        let channel = connection.create_channel().await.map_err(|e| {
            MessagingError::channel(format!("RabbitMQ channel creation failed: {}", e))
        })?;

        let result = declare_on_channel(&channel, topology).await;

        if let Err(e) = channel.close(200, "topology declared").await {
            debug!(error = %e, "Closing topology channel failed");
        }
        result?;

        info!(
            exchange = %topology.exchange,
            queue = %topology.queue,
            binding_key = %topology.binding_key,
            "✅ Broker topology declared"
        );
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, MessagingError> {
        Ok(self.current().await.status().connected())
    }

    async fn shutdown(&self) -> Result<(), MessagingError> {
        let connection = self.current().await;
        if connection.status().connected() {
            connection
                .close(200, "shutdown")
                .await
                .map_err(|e| MessagingError::connection(format!("RabbitMQ close failed: {}", e)))?;
        }
        info!("🔌 RabbitMQ connection closed");
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "rabbitmq"
    }
}

async fn declare_on_channel(
    channel: &Channel,
    topology: &BrokerTopology,
) -> Result<(), MessagingError> {
    channel
        .exchange_declare(
            &topology.exchange,
            ExchangeKind::Topic,
            ExchangeDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| MessagingError::topology(&topology.exchange, e.to_string()))?;

    channel
        .queue_declare(
            &topology.queue,
            QueueDeclareOptions {
                durable: true,
                ..Default::default()
            },
            FieldTable::default(),
        )
        .await
        .map_err(|e| MessagingError::topology(&topology.queue, e.to_string()))?;

    channel
        .queue_bind(
            &topology.queue,
            &topology.exchange,
            &topology.binding_key,
            QueueBindOptions::default(),
            FieldTable::default(),
        )
        .await
        .map_err(|e| MessagingError::topology(&topology.binding_key, e.to_string()))?;

    Ok(())
}

#[async_trait]
impl BrokerChannel for Channel {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), MessagingError> {
        let confirm = self
            .basic_publish(
                exchange,
                routing_key,
                BasicPublishOptions::default(),
                payload,
                BasicProperties::default()
                    .with_delivery_mode(DELIVERY_MODE_PERSISTENT)
                    .with_content_type(CONTENT_TYPE_JSON.into()),
            )
            .await
            .map_err(|e| MessagingError::channel(format!("basic.publish failed: {}", e)))?;

        let confirmation = confirm
            .await
            .map_err(|e| MessagingError::publish(exchange, routing_key, format!("confirm failed: {}", e)))?;

        if confirmation.is_nack() {
            return Err(MessagingError::publish(
                exchange,
                routing_key,
                "broker nacked the message",
            ));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), MessagingError> {
        if !self.status().connected() {
            return Ok(());
        }
        Channel::close(self, 200, "OK")
            .await
            .map_err(|e| MessagingError::channel(format!("channel close failed: {}", e)))
    }
}
