//! Collaborators the orchestrators depend on: status log queries, resource
//! precondition lookups and archive uploads.

pub mod catalog;
pub mod status_log;
pub mod uploader;

pub use catalog::{DocumentCatalog, ResourceCatalog};
pub use status_log::StatusLog;
pub use uploader::{ObjectStoreUploader, ObjectUploader};
