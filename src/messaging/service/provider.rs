//! # Messaging Provider Enum
//!
//! Enum dispatch over the broker providers.

use super::providers::{InMemoryBroker, InMemoryChannel, RabbitMqBroker};
use super::traits::{BrokerChannel, BrokerTopology, MessageBroker};
use crate::messaging::MessagingError;

/// Active broker provider.
///
/// `MessageBroker` has an associated channel type, so providers are selected
/// through this enum rather than `Arc<dyn MessageBroker>`.
#[derive(Debug)]
pub enum MessagingProvider {
    /// RabbitMQ via lapin
    RabbitMq(RabbitMqBroker),
    /// In-memory double for tests and local runs
    InMemory(InMemoryBroker),
}

/// Channel opened by a [`MessagingProvider`]
#[derive(Debug)]
pub enum ProviderChannel {
    RabbitMq(lapin::Channel),
    InMemory(InMemoryChannel),
}

impl MessagingProvider {
    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::RabbitMq(b) => b.provider_name(),
            Self::InMemory(b) => b.provider_name(),
        }
    }

    pub async fn open_channel(&self) -> Result<ProviderChannel, MessagingError> {
        match self {
            Self::RabbitMq(b) => b.open_channel().await.map(ProviderChannel::RabbitMq),
            Self::InMemory(b) => b.open_channel().await.map(ProviderChannel::InMemory),
        }
    }

    pub fn connection_generation(&self) -> u64 {
        match self {
            Self::RabbitMq(b) => b.connection_generation(),
            Self::InMemory(b) => b.connection_generation(),
        }
    }

    pub async fn reconnect(&self, observed_generation: u64) -> Result<(), MessagingError> {
        match self {
            Self::RabbitMq(b) => b.reconnect(observed_generation).await,
            Self::InMemory(b) => b.reconnect(observed_generation).await,
        }
    }

    pub async fn declare_topology(&self, topology: &BrokerTopology) -> Result<(), MessagingError> {
        match self {
            Self::RabbitMq(b) => b.declare_topology(topology).await,
            Self::InMemory(b) => b.declare_topology(topology).await,
        }
    }

    pub async fn health_check(&self) -> Result<bool, MessagingError> {
        match self {
            Self::RabbitMq(b) => b.health_check().await,
            Self::InMemory(b) => b.health_check().await,
        }
    }

    pub async fn shutdown(&self) -> Result<(), MessagingError> {
        match self {
            Self::RabbitMq(b) => b.shutdown().await,
            Self::InMemory(b) => b.shutdown().await,
        }
    }

    /// The in-memory broker, when that is the active provider
    pub fn as_in_memory(&self) -> Option<&InMemoryBroker> {
        match self {
            Self::InMemory(b) => Some(b),
            Self::RabbitMq(_) => None,
        }
    }
}

impl From<RabbitMqBroker> for MessagingProvider {
    fn from(broker: RabbitMqBroker) -> Self {
        Self::RabbitMq(broker)
    }
}

impl From<InMemoryBroker> for MessagingProvider {
    fn from(broker: InMemoryBroker) -> Self {
        Self::InMemory(broker)
    }
}

impl ProviderChannel {
    pub async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), MessagingError> {
        match self {
            Self::RabbitMq(c) => BrokerChannel::publish(c, exchange, routing_key, payload).await,
            Self::InMemory(c) => c.publish(exchange, routing_key, payload).await,
        }
    }

    pub async fn close(&self) -> Result<(), MessagingError> {
        match self {
            Self::RabbitMq(c) => BrokerChannel::close(c).await,
            Self::InMemory(c) => c.close().await,
        }
    }
}
