//! # Command Envelope Types
//!
//! Message structures published to the topic exchange for the external
//! worker. The JSON field names are the contract with that worker: every
//! envelope carries `corId` and `eventStatus` alongside the flattened
//! kind-specific body.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::correlation::CorrelationId;
use super::errors::MessagingError;
use crate::constants::broker;

/// The three commands this service dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    ChallengeCreate,
    ImageBuild,
    AttemptStart,
}

impl CommandKind {
    /// Routing key on the topic exchange
    pub fn routing_key(&self) -> &'static str {
        match self {
            Self::ChallengeCreate => broker::ROUTE_CHALLENGE_CREATE,
            Self::ImageBuild => broker::ROUTE_IMAGE_BUILD,
            Self::AttemptStart => broker::ROUTE_CHALLENGE_START,
        }
    }

    /// Transition the command announces when it is published
    pub fn initial_status(&self) -> EventStatus {
        match self {
            Self::ChallengeCreate => EventStatus::ChallengeCreating,
            Self::ImageBuild => EventStatus::ImageCreating,
            Self::AttemptStart => EventStatus::ChallengeStarting,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChallengeCreate => "challenge-create",
            Self::ImageBuild => "image-build",
            Self::AttemptStart => "attempt-start",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle events shared with the external worker.
///
/// Per correlation id the convention is
/// `{kind}Creating -> {kind}Created | {kind}Failed`; for attempts
/// `challengeStarting -> challengeStarted | challengeStartFailed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventStatus {
    ChallengeCreating,
    ChallengeCreated,
    ChallengeFailed,
    ImageCreating,
    ImageCreated,
    ImageFailed,
    ChallengeStarting,
    ChallengeStarted,
    ChallengeStartFailed,
}

impl EventStatus {
    pub const ALL: [EventStatus; 9] = [
        Self::ChallengeCreating,
        Self::ChallengeCreated,
        Self::ChallengeFailed,
        Self::ImageCreating,
        Self::ImageCreated,
        Self::ImageFailed,
        Self::ChallengeStarting,
        Self::ChallengeStarted,
        Self::ChallengeStartFailed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChallengeCreating => "challengeCreating",
            Self::ChallengeCreated => "challengeCreated",
            Self::ChallengeFailed => "challengeFailed",
            Self::ImageCreating => "imageCreating",
            Self::ImageCreated => "imageCreated",
            Self::ImageFailed => "imageFailed",
            Self::ChallengeStarting => "challengeStarting",
            Self::ChallengeStarted => "challengeStarted",
            Self::ChallengeStartFailed => "challengeStartFailed",
        }
    }

    pub fn kind(&self) -> CommandKind {
        match self {
            Self::ChallengeCreating | Self::ChallengeCreated | Self::ChallengeFailed => {
                CommandKind::ChallengeCreate
            }
            Self::ImageCreating | Self::ImageCreated | Self::ImageFailed => CommandKind::ImageBuild,
            Self::ChallengeStarting | Self::ChallengeStarted | Self::ChallengeStartFailed => {
                CommandKind::AttemptStart
            }
        }
    }

    pub fn outcome(&self) -> EventOutcome {
        match self {
            Self::ChallengeCreating | Self::ImageCreating | Self::ChallengeStarting => {
                EventOutcome::InProgress
            }
            Self::ChallengeCreated | Self::ImageCreated | Self::ChallengeStarted => {
                EventOutcome::Success
            }
            Self::ChallengeFailed | Self::ImageFailed | Self::ChallengeStartFailed => {
                EventOutcome::Failure
            }
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self.outcome(), EventOutcome::InProgress)
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventStatus {
    type Err = MessagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                MessagingError::message_deserialization(format!("unrecognized event status: {s}"))
            })
    }
}

/// Outcome class of a lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventOutcome {
    Success,
    Failure,
    InProgress,
}

/// Body of a challenge-create command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeCreateCommand {
    pub image_name: String,
    pub image_tag: String,
    pub challenge_name: String,
    pub creator_name: String,
    /// Challenge duration in minutes
    pub duration: u32,
    pub participants: Vec<String>,
}

/// Body of an image-build command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageBuildCommand {
    pub image_name: String,
    pub image_tag: String,
    pub creator_name: String,
    /// Object store key of the uploaded build archive
    pub s3_path: String,
}

/// Body of an attempt-start command
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptStartCommand {
    pub token: String,
    #[serde(default)]
    pub challenge_name: String,
    #[serde(default)]
    pub creator_name: String,
    #[serde(default)]
    pub participant: String,
    #[serde(default)]
    pub image_registry_link: String,
}

/// Kind-specific command body, flattened into the envelope on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandBody {
    ChallengeCreate(ChallengeCreateCommand),
    ImageBuild(ImageBuildCommand),
    AttemptStart(AttemptStartCommand),
}

impl CommandBody {
    pub fn kind(&self) -> CommandKind {
        match self {
            Self::ChallengeCreate(_) => CommandKind::ChallengeCreate,
            Self::ImageBuild(_) => CommandKind::ImageBuild,
            Self::AttemptStart(_) => CommandKind::AttemptStart,
        }
    }
}

impl From<ChallengeCreateCommand> for CommandBody {
    fn from(body: ChallengeCreateCommand) -> Self {
        Self::ChallengeCreate(body)
    }
}

impl From<ImageBuildCommand> for CommandBody {
    fn from(body: ImageBuildCommand) -> Self {
        Self::ImageBuild(body)
    }
}

impl From<AttemptStartCommand> for CommandBody {
    fn from(body: AttemptStartCommand) -> Self {
        Self::AttemptStart(body)
    }
}

/// The message published to the broker.
///
/// Immutable once built: the correlation id and event status are fixed at
/// construction and the event status always matches the body's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandEnvelope {
    cor_id: CorrelationId,
    event_status: EventStatus,
    #[serde(flatten)]
    body: CommandBody,
}

impl CommandEnvelope {
    pub fn new(cor_id: CorrelationId, body: impl Into<CommandBody>) -> Self {
        let body = body.into();
        Self {
            cor_id,
            event_status: body.kind().initial_status(),
            body,
        }
    }

    pub fn cor_id(&self) -> &CorrelationId {
        &self.cor_id
    }

    pub fn event_status(&self) -> EventStatus {
        self.event_status
    }

    pub fn body(&self) -> &CommandBody {
        &self.body
    }

    pub fn kind(&self) -> CommandKind {
        self.body.kind()
    }

    pub fn routing_key(&self) -> &'static str {
        self.kind().routing_key()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, MessagingError> {
        serde_json::to_vec(self).map_err(|e| MessagingError::message_serialization(e.to_string()))
    }
}
