//! # Data Models
//!
//! Typed views of documents in the shared document store.

pub mod resources;
pub mod status;

pub use resources::{AttemptRecord, ChallengeRecord, ImageRecord};
pub use status::StatusRecord;
