//! Platform resources created by the external worker, read here only to
//! check command preconditions.

use serde::{Deserialize, Serialize};

/// A built container image (`image` collection)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageRecord {
    pub cor_id: String,
    pub creator_name: String,
    pub image_name: String,
    pub image_tag: String,
    pub image_registry_link: String,
    pub s3_path: String,
}

/// A provisioned challenge (`challenge` collection)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChallengeRecord {
    pub cor_id: String,
    pub challenge_name: String,
    pub creator_name: String,
    pub image_name: String,
    pub image_tag: String,
    pub image_registry_link: String,
    pub duration: u32,
    pub participants: Vec<String>,
}

/// A participant's attempt, looked up by its token (`attempt` collection)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttemptRecord {
    pub token: String,
    pub challenge_name: String,
    pub creator_name: String,
    pub participant: String,
    pub image_registry_link: String,
}
