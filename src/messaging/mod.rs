//! # Messaging Module
//!
//! Broker-facing half of the dispatch path: correlation identifiers, command
//! envelopes, the broker service layer and the bounded command publisher.

pub mod correlation;
pub mod envelope;
pub mod errors;
pub mod publisher;
pub mod service;

pub use correlation::{new_correlation_id, CorrelationId};
pub use envelope::{
    AttemptStartCommand, ChallengeCreateCommand, CommandBody, CommandEnvelope, CommandKind,
    EventOutcome, EventStatus, ImageBuildCommand,
};
pub use errors::{MessagingError, MessagingResult};
pub use publisher::CommandPublisher;
pub use service::{BrokerTopology, InMemoryBroker, MessagingProvider, RabbitMqBroker};
