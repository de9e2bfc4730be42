//! # Image Build
//!
//! Rejects a build when the creator already has an image with the same name
//! and tag, uploads the build archive under `challenge-zips/`, and then
//! dispatches an `image-build` command carrying the archive path. The
//! correlation id is minted before the upload because it is part of the
//! object key.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, instrument};

use super::dispatcher::CommandDispatcher;
use super::validation::{path_safe, required};
use crate::constants::IMAGE_ARCHIVE_PREFIX;
use crate::error::{PlatformError, Result};
use crate::messaging::{CorrelationId, ImageBuildCommand};
use crate::services::{ObjectUploader, ResourceCatalog};

#[derive(Debug, Clone, Default)]
pub struct ImageBuildRequest {
    pub image_name: String,
    pub image_tag: String,
    pub creator_name: String,
    /// Zip archive with the image build context
    pub archive: Bytes,
}

/// Object key for a build archive
pub fn archive_path(creator_name: &str, cor_id: &CorrelationId) -> String {
    format!("{IMAGE_ARCHIVE_PREFIX}/{creator_name}-{cor_id}.zip")
}

#[derive(Debug, Clone)]
pub struct ImageOrchestrator {
    catalog: Arc<dyn ResourceCatalog>,
    uploader: Arc<dyn ObjectUploader>,
    dispatcher: Arc<CommandDispatcher>,
}

impl ImageOrchestrator {
    pub fn new(
        catalog: Arc<dyn ResourceCatalog>,
        uploader: Arc<dyn ObjectUploader>,
        dispatcher: Arc<CommandDispatcher>,
    ) -> Self {
        Self {
            catalog,
            uploader,
            dispatcher,
        }
    }

    #[instrument(skip(self, request), fields(image = %request.image_name, tag = %request.image_tag))]
    pub async fn build_image(&self, request: ImageBuildRequest) -> Result<CorrelationId> {
        let image_name = required("imageName", &request.image_name)?;
        let image_tag = required("imageTag", &request.image_tag)?;
        let creator_name = path_safe("creatorName", &request.creator_name)?;
        if request.archive.is_empty() {
            return Err(PlatformError::validation("imageFile is required"));
        }

        if self
            .catalog
            .find_image(&image_name, &image_tag, &creator_name)
            .await?
            .is_some()
        {
            return Err(PlatformError::conflict(format!(
                "Image {image_name}:{image_tag} already exists"
            )));
        }

        let cor_id = CorrelationId::generate();
        let s3_path = archive_path(&creator_name, &cor_id);
        let archive_bytes = request.archive.len();
        self.uploader.upload_file(request.archive, &s3_path).await?;
        info!(cor_id = %cor_id, s3_path = %s3_path, archive_bytes, "📦 Build archive stored");

        let command = ImageBuildCommand {
            image_name,
            image_tag,
            creator_name,
            s3_path,
        };
        self.dispatcher.publish_with_id(cor_id, command).await
    }
}
