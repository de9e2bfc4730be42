//! # Document Store
//!
//! Read access (plus append, for seeding and worker simulation) to the
//! collections the external worker and other services write.

pub mod errors;
pub mod in_memory;
pub mod postgres;
pub mod traits;

pub use errors::{StoreError, StoreResult};
pub use in_memory::InMemoryDocumentStore;
pub use postgres::PgDocumentStore;
pub use traits::{document_timestamp, DocumentFilter, DocumentSort, DocumentStore};
