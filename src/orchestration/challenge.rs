//! # Challenge Creation
//!
//! Validates a create-challenge request, checks that the referenced image
//! exists and the creator has no challenge by that name yet, then dispatches
//! a `challenge-create` command.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::dispatcher::CommandDispatcher;
use super::validation::required;
use crate::error::{PlatformError, Result};
use crate::messaging::{ChallengeCreateCommand, CorrelationId};
use crate::services::ResourceCatalog;

/// Client request body; missing fields surface as validation errors
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateChallengeRequest {
    pub image_name: String,
    pub image_tag: String,
    pub challenge_name: String,
    pub creator_name: String,
    /// Minutes
    pub duration: i64,
    pub participants: Vec<String>,
}

impl CreateChallengeRequest {
    pub fn validate(&self) -> Result<ChallengeCreateCommand> {
        let duration = u32::try_from(self.duration)
            .ok()
            .filter(|minutes| *minutes > 0)
            .ok_or_else(|| PlatformError::validation("duration must be a positive number of minutes"))?;

        if self.participants.is_empty() {
            return Err(PlatformError::validation("participants is required"));
        }
        let participants = self
            .participants
            .iter()
            .map(|p| required("participants", p))
            .collect::<Result<Vec<_>>>()?;

        Ok(ChallengeCreateCommand {
            image_name: required("imageName", &self.image_name)?,
            image_tag: required("imageTag", &self.image_tag)?,
            challenge_name: required("challengeName", &self.challenge_name)?,
            creator_name: required("creatorName", &self.creator_name)?,
            duration,
            participants,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ChallengeOrchestrator {
    catalog: Arc<dyn ResourceCatalog>,
    dispatcher: Arc<CommandDispatcher>,
}

impl ChallengeOrchestrator {
    pub fn new(catalog: Arc<dyn ResourceCatalog>, dispatcher: Arc<CommandDispatcher>) -> Self {
        Self {
            catalog,
            dispatcher,
        }
    }

    #[instrument(skip(self, request), fields(challenge = %request.challenge_name, creator = %request.creator_name))]
    pub async fn create_challenge(&self, request: CreateChallengeRequest) -> Result<CorrelationId> {
        let command = request.validate()?;

        let image = self
            .catalog
            .find_image(&command.image_name, &command.image_tag, &command.creator_name)
            .await?;
        if image.is_none() {
            return Err(PlatformError::not_found(format!(
                "No such image {}:{} for creator {}",
                command.image_name, command.image_tag, command.creator_name
            )));
        }

        let existing = self
            .catalog
            .find_challenge(&command.challenge_name, &command.creator_name)
            .await?;
        if existing.is_some() {
            return Err(PlatformError::conflict(format!(
                "Challenge name {} already exists",
                command.challenge_name
            )));
        }

        debug!("Preconditions passed, dispatching challenge-create");
        self.dispatcher.publish_command(command).await
    }
}
