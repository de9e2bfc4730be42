//! # In-Memory Broker
//!
//! Thread-safe broker double for tests and local development. It records
//! every confirmed publish and exposes fault controls (dropped connection,
//! refused re-dials, failing or stalled publishes) so retry and reconnect
//! paths can be exercised without a real broker.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::constants::broker::CONTENT_TYPE_JSON;
use crate::messaging::service::traits::{BrokerChannel, BrokerTopology, MessageBroker};
use crate::messaging::MessagingError;

/// A message accepted by the in-memory broker
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub exchange: String,
    pub routing_key: String,
    pub payload: Vec<u8>,
    pub content_type: String,
    pub persistent: bool,
    pub published_at: DateTime<Utc>,
}

impl PublishedMessage {
    /// Decode the payload as JSON
    pub fn json(&self) -> Result<serde_json::Value, MessagingError> {
        Ok(serde_json::from_slice(&self.payload)?)
    }
}

#[derive(Debug)]
struct BrokerState {
    connected: AtomicBool,
    refuse_reconnect: AtomicBool,
    fail_next_publishes: AtomicU32,
    fail_next_channels: AtomicU32,
    publish_delay: Mutex<Option<Duration>>,
    published: Mutex<Vec<PublishedMessage>>,
    declared: Mutex<HashSet<BrokerTopology>>,
    channels_opened: AtomicU64,
    channels_open: AtomicUsize,
    reconnects: AtomicU64,
    generation: AtomicU64,
    reconnect_lock: Mutex<()>,
}

impl Default for BrokerState {
    fn default() -> Self {
        Self {
            connected: AtomicBool::new(true),
            refuse_reconnect: AtomicBool::new(false),
            fail_next_publishes: AtomicU32::new(0),
            fail_next_channels: AtomicU32::new(0),
            publish_delay: Mutex::new(None),
            published: Mutex::new(Vec::new()),
            declared: Mutex::new(HashSet::new()),
            channels_opened: AtomicU64::new(0),
            channels_open: AtomicUsize::new(0),
            reconnects: AtomicU64::new(0),
            generation: AtomicU64::new(0),
            reconnect_lock: Mutex::new(()),
        }
    }
}

/// Decrement a fault counter if positive; true when a fault should fire
fn take_fault(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

/// In-memory broker; clones share state
#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    state: Arc<BrokerState>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate the broker closing the connection
    pub fn drop_connection(&self) {
        self.state.connected.store(false, Ordering::SeqCst);
    }

    /// Make subsequent re-dials fail (broker down)
    pub fn refuse_reconnects(&self, refuse: bool) {
        self.state.refuse_reconnect.store(refuse, Ordering::SeqCst);
    }

    /// Fail the next `count` publishes with a publish error
    pub fn fail_next_publishes(&self, count: u32) {
        self.state.fail_next_publishes.store(count, Ordering::SeqCst);
    }

    /// Fail the next `count` channel opens with a channel error
    pub fn fail_next_channels(&self, count: u32) {
        self.state.fail_next_channels.store(count, Ordering::SeqCst);
    }

    /// Delay every publish (simulates a stalled broker)
    pub fn set_publish_delay(&self, delay: Option<Duration>) {
        *self.state.publish_delay.lock() = delay;
    }

    pub fn is_connected(&self) -> bool {
        self.state.connected.load(Ordering::SeqCst)
    }

    pub fn published(&self) -> Vec<PublishedMessage> {
        self.state.published.lock().clone()
    }

    pub fn published_to(&self, routing_key: &str) -> Vec<PublishedMessage> {
        self.state
            .published
            .lock()
            .iter()
            .filter(|m| m.routing_key == routing_key)
            .cloned()
            .collect()
    }

    pub fn declared_topologies(&self) -> Vec<BrokerTopology> {
        self.state.declared.lock().iter().cloned().collect()
    }

    /// Channels opened over the broker's lifetime
    pub fn channels_opened(&self) -> u64 {
        self.state.channels_opened.load(Ordering::SeqCst)
    }

    /// Channels currently open (opened and not yet closed)
    pub fn open_channel_count(&self) -> usize {
        self.state.channels_open.load(Ordering::SeqCst)
    }

    pub fn reconnect_count(&self) -> u64 {
        self.state.reconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessageBroker for InMemoryBroker {
    type Channel = InMemoryChannel;

    async fn open_channel(&self) -> Result<InMemoryChannel, MessagingError> {
        if !self.is_connected() {
            return Err(MessagingError::connection("in-memory connection is closed"));
        }
        if take_fault(&self.state.fail_next_channels) {
            return Err(MessagingError::channel("injected channel failure"));
        }

        self.state.channels_opened.fetch_add(1, Ordering::SeqCst);
        self.state.channels_open.fetch_add(1, Ordering::SeqCst);
        Ok(InMemoryChannel {
            state: Arc::clone(&self.state),
            closed: AtomicBool::new(false),
        })
    }

    fn connection_generation(&self) -> u64 {
        self.state.generation.load(Ordering::SeqCst)
    }

    async fn reconnect(&self, observed_generation: u64) -> Result<(), MessagingError> {
        let _guard = self.state.reconnect_lock.lock();
        if self.connection_generation() != observed_generation || self.is_connected() {
            return Ok(());
        }
        if self.state.refuse_reconnect.load(Ordering::SeqCst) {
            return Err(MessagingError::connection("in-memory broker refused connection"));
        }
        self.state.connected.store(true, Ordering::SeqCst);
        self.state.generation.fetch_add(1, Ordering::SeqCst);
        self.state.reconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn declare_topology(&self, topology: &BrokerTopology) -> Result<(), MessagingError> {
        if !self.is_connected() {
            return Err(MessagingError::connection("in-memory connection is closed"));
        }
        self.state.declared.lock().insert(topology.clone());
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, MessagingError> {
        Ok(self.is_connected())
    }

    async fn shutdown(&self) -> Result<(), MessagingError> {
        self.drop_connection();
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "in_memory"
    }
}

/// Channel handed out by [`InMemoryBroker`]
#[derive(Debug)]
pub struct InMemoryChannel {
    state: Arc<BrokerState>,
    closed: AtomicBool,
}

#[async_trait]
impl BrokerChannel for InMemoryChannel {
    async fn publish(
        &self,
        exchange: &str,
        routing_key: &str,
        payload: &[u8],
    ) -> Result<(), MessagingError> {
        let delay = *self.state.publish_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.closed.load(Ordering::SeqCst) || !self.state.connected.load(Ordering::SeqCst) {
            return Err(MessagingError::channel("in-memory channel is closed"));
        }
        if take_fault(&self.state.fail_next_publishes) {
            return Err(MessagingError::publish(
                exchange,
                routing_key,
                "injected publish failure",
            ));
        }

        self.state.published.lock().push(PublishedMessage {
            exchange: exchange.to_string(),
            routing_key: routing_key.to_string(),
            payload: payload.to_vec(),
            content_type: CONTENT_TYPE_JSON.to_string(),
            persistent: true,
            published_at: Utc::now(),
        });
        Ok(())
    }

    async fn close(&self) -> Result<(), MessagingError> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.state.channels_open.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_records_message() {
        let broker = InMemoryBroker::new();
        let channel = broker.open_channel().await.unwrap();
        channel
            .publish("topic.router", "platform.fromService.imageCreate", br#"{"a":1}"#)
            .await
            .unwrap();
        channel.close().await.unwrap();

        let published = broker.published_to("platform.fromService.imageCreate");
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].json().unwrap(), serde_json::json!({"a": 1}));
        assert!(published[0].persistent);
        assert_eq!(broker.open_channel_count(), 0);
    }

    #[tokio::test]
    async fn test_dropped_connection_rejects_channels_until_reconnect() {
        let broker = InMemoryBroker::new();
        broker.drop_connection();
        assert!(matches!(
            broker.open_channel().await,
            Err(MessagingError::Connection { .. })
        ));

        broker.reconnect(0).await.unwrap();
        assert!(broker.open_channel().await.is_ok());
        assert_eq!(broker.reconnect_count(), 1);
        assert_eq!(broker.connection_generation(), 1);
    }

    #[tokio::test]
    async fn test_reconnect_for_replaced_connection_does_not_redial() {
        let broker = InMemoryBroker::new();
        broker.drop_connection();
        broker.reconnect(0).await.unwrap();

        // A second caller that saw generation 0 fail finds it already replaced
        broker.reconnect(0).await.unwrap();
        assert_eq!(broker.reconnect_count(), 1);

        // A healthy connection is never re-dialed
        broker.reconnect(1).await.unwrap();
        assert_eq!(broker.reconnect_count(), 1);
        assert_eq!(broker.connection_generation(), 1);
    }

    #[tokio::test]
    async fn test_refused_reconnect_keeps_connection_down() {
        let broker = InMemoryBroker::new();
        broker.drop_connection();
        broker.refuse_reconnects(true);
        assert!(broker.reconnect(0).await.is_err());
        assert_eq!(broker.connection_generation(), 0);
        assert!(!broker.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_injected_failures_are_consumed() {
        let broker = InMemoryBroker::new();
        broker.fail_next_publishes(1);
        let channel = broker.open_channel().await.unwrap();
        assert!(channel.publish("x", "y", b"{}").await.is_err());
        assert!(channel.publish("x", "y", b"{}").await.is_ok());
    }

    #[tokio::test]
    async fn test_close_is_idempotent() {
        let broker = InMemoryBroker::new();
        let channel = broker.open_channel().await.unwrap();
        channel.close().await.unwrap();
        channel.close().await.unwrap();
        assert_eq!(broker.open_channel_count(), 0);
        assert_eq!(broker.channels_opened(), 1);
    }
}
