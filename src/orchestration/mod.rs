//! # Command Orchestration
//!
//! Request-time components that turn a client request into a published
//! command:
//!
//! 1. validate the request
//! 2. check preconditions through the [`ResourceCatalog`](crate::services::ResourceCatalog)
//! 3. mint a correlation id and build the envelope
//! 4. publish through the [`CommandDispatcher`]
//! 5. return the correlation id
//!
//! Preconditions are read-then-act. A failed publish is not compensated: the
//! client retries the whole request and the checks run again.
//!
//! Lifecycle per correlation id, by convention with the external worker:
//! `accepted -> {kind}Creating -> {kind}Created | {kind}Failed`. Only the
//! `…Creating` step originates here, implicitly, through the publish.

pub mod attempt;
pub mod challenge;
pub mod dispatcher;
pub mod image;
mod validation;

pub use attempt::{AttemptOrchestrator, StartAttemptRequest};
pub use challenge::{ChallengeOrchestrator, CreateChallengeRequest};
pub use dispatcher::CommandDispatcher;
pub use image::{archive_path, ImageBuildRequest, ImageOrchestrator};
