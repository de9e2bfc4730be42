//! # Messaging Service Traits
//!
//! Provider-agnostic broker operations. A provider owns the process-wide
//! connection; channels are opened per publish and closed by the caller.

use async_trait::async_trait;

use crate::config::BrokerConfig;
use crate::messaging::MessagingError;

/// Durable exchange/queue layout declared once at startup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BrokerTopology {
    /// Topic exchange commands are published to
    pub exchange: String,
    /// Durable queue consumed by the external worker
    pub queue: String,
    /// Binding key from `exchange` to `queue`
    pub binding_key: String,
}

impl BrokerTopology {
    pub fn from_config(config: &BrokerConfig) -> Self {
        Self {
            exchange: config.exchange.clone(),
            queue: config.command_queue.clone(),
            binding_key: config.binding_key.clone(),
        }
    }
}

impl Default for BrokerTopology {
    fn default() -> Self {
        Self::from_config(&BrokerConfig::default())
    }
}

/// Connection-owning side of a broker
///
/// Implementations hold exactly one live connection and must swap it
/// atomically on `reconnect`, so concurrent callers observe either the old
/// or the new connection.
#[async_trait]
pub trait MessageBroker: Send + Sync + 'static {
    type Channel: BrokerChannel;

    /// Open a transient channel on the current connection.
    ///
    /// Fails immediately when the connection is dead; never queues.
    async fn open_channel(&self) -> Result<Self::Channel, MessagingError>;

    /// Counter bumped each time `reconnect` swaps in a new connection
    fn connection_generation(&self) -> u64;

    /// Re-dial with the original configuration and replace the shared handle.
    ///
    /// `observed_generation` is the generation the caller saw fail. Nothing is
    /// dialed when that connection was already replaced or is still connected.
    async fn reconnect(&self, observed_generation: u64) -> Result<(), MessagingError>;

    /// Declare the durable exchange, queue and binding (idempotent)
    async fn declare_topology(&self, topology: &BrokerTopology) -> Result<(), MessagingError>;

    /// Whether the current connection is usable
    async fn health_check(&self) -> Result<bool, MessagingError>;

    /// Close the connection at process exit
    async fn shutdown(&self) -> Result<(), MessagingError>;

    /// Provider name for logging
    fn provider_name(&self) -> &'static str;
}

/// A transient channel used for exactly one publish
#[async_trait]
pub trait BrokerChannel: Send + Sync {
    /// Publish a persistent JSON message and wait for the broker's confirm
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), MessagingError>;

    async fn close(&self) -> Result<(), MessagingError>;
}
