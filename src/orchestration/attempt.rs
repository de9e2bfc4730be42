//! # Attempt Start
//!
//! Looks up the attempt by its token and dispatches an `attempt-start`
//! command enriched with the stored attempt's challenge, creator,
//! participant and registry link.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::dispatcher::CommandDispatcher;
use super::validation::required;
use crate::error::{PlatformError, Result};
use crate::messaging::{AttemptStartCommand, CorrelationId};
use crate::services::ResourceCatalog;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartAttemptRequest {
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct AttemptOrchestrator {
    catalog: Arc<dyn ResourceCatalog>,
    dispatcher: Arc<CommandDispatcher>,
}

impl AttemptOrchestrator {
    pub fn new(catalog: Arc<dyn ResourceCatalog>, dispatcher: Arc<CommandDispatcher>) -> Self {
        Self {
            catalog,
            dispatcher,
        }
    }

    #[instrument(skip_all)]
    pub async fn start_attempt(&self, request: StartAttemptRequest) -> Result<CorrelationId> {
        let token = required("token", &request.token)?;

        let attempt = self
            .catalog
            .find_attempt(&token)
            .await?
            .ok_or_else(|| PlatformError::not_found("Invalid token"))?;

        let command = AttemptStartCommand {
            token,
            challenge_name: attempt.challenge_name,
            creator_name: attempt.creator_name,
            participant: attempt.participant,
            image_registry_link: attempt.image_registry_link,
        };
        self.dispatcher.publish_command(command).await
    }
}
