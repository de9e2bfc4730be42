//! # Broker Service Layer
//!
//! Provider-agnostic broker access: the [`MessageBroker`] trait, concrete
//! providers, and the [`MessagingProvider`] enum used by the rest of the crate.

pub mod provider;
pub mod providers;
pub mod traits;

pub use provider::{MessagingProvider, ProviderChannel};
pub use providers::{InMemoryBroker, InMemoryChannel, PublishedMessage, RabbitMqBroker};
pub use traits::{BrokerChannel, BrokerTopology, MessageBroker};
