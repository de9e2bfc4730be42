#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

//! # Challenge Platform Core
//!
//! Asynchronous command dispatch and correlation-based status tracking for
//! the challenge platform. HTTP handlers validate a request, check
//! preconditions against the document store, publish a command to the
//! RabbitMQ topic exchange and return a correlation id immediately. An
//! external worker consumes the command and appends status events to the
//! `process_engine` collection, which clients poll by correlation id.
//!
//! ## Architecture
//!
//! ```text
//! HTTP (web) ──► orchestration ──► messaging ──► topic.router ──► worker
//!                     │                                              │
//!                     ▼                                              ▼
//!               services/store ◄───────── process_engine ◄──────── events
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Layered TOML + environment configuration
//! - [`messaging`] - Command envelopes, correlation ids, broker providers and the publisher
//! - [`store`] - Document store abstraction with Postgres and in-memory backends
//! - [`models`] - Status log records and catalog resources
//! - [`services`] - Status log reader, resource catalog, object uploader
//! - [`orchestration`] - Challenge-create, image-build and attempt-start flows
//! - [`web`] - Axum routes, handlers and error rendering
//! - [`system_context`] - Dependency container and lifecycle
//!
//! ## Testing
//!
//! Unit tests run against the in-memory broker and document store.
//! Tests that need a live RabbitMQ or Postgres are `#[ignore]`d:
//!
//! ```bash
//! cargo test                  # Unit and in-memory integration tests
//! cargo test -- --ignored     # Broker and database tests
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod orchestration;
pub mod services;
pub mod store;
pub mod system_context;
pub mod web;

pub use config::{ConfigManager, PlatformConfig};
pub use error::{PlatformError, Result};
pub use messaging::{
    CommandBody, CommandEnvelope, CommandKind, CorrelationId, EventOutcome, EventStatus,
    MessagingError,
};
pub use models::StatusRecord;
pub use store::{DocumentStore, StoreError};
pub use system_context::PlatformContext;
