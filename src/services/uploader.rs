//! # Object Uploader
//!
//! Stores image build archives before the image-build command is published.
//! Backed by `object_store`, so the target is chosen by URL: `s3://bucket`,
//! `file:///path` or `memory:///`.

use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use object_store::path::Path;
use object_store::{parse_url, parse_url_opts, ObjectStore, ObjectStoreScheme, PutPayload};
use tracing::{debug, info};
use url::Url;

use crate::config::ObjectStoreConfig;
use crate::error::{PlatformError, Result};

#[async_trait]
pub trait ObjectUploader: Send + Sync + Debug + 'static {
    /// Store `bytes` at `path`, replacing any existing object
    async fn upload_file(&self, bytes: Bytes, path: &str) -> Result<()>;
}

pub struct ObjectStoreUploader {
    store: Arc<dyn ObjectStore>,
    prefix: Path,
    upload_timeout: Duration,
}

impl Debug for ObjectStoreUploader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreUploader")
            .field("store", &self.store.to_string())
            .field("prefix", &self.prefix.as_ref())
            .finish()
    }
}

impl ObjectStoreUploader {
    pub fn from_config(config: &ObjectStoreConfig) -> Result<Self> {
        let url = config
            .url
            .parse::<Url>()
            .map_err(|e| PlatformError::upload(&config.url, format!("invalid object store url: {e}")))?;

        let (store, prefix) = Self::build_object_store(&url)
            .map_err(|e| PlatformError::upload(&config.url, e.to_string()))?;

        info!(url = %config.url, "✅ Object store configured");
        Ok(Self {
            store: Arc::from(store),
            prefix,
            upload_timeout: config.upload_timeout(),
        })
    }

    fn build_object_store(url: &Url) -> object_store::Result<(Box<dyn ObjectStore>, Path)> {
        let (scheme, _) = ObjectStoreScheme::parse(url)?;
        match scheme {
            ObjectStoreScheme::AmazonS3 => {
                // Credentials from AWS_* variables take priority over instance metadata
                let opts: Vec<(String, String)> = std::env::vars()
                    .filter(|(key, _)| key.starts_with("AWS_"))
                    .map(|(key, value)| (key.to_ascii_lowercase(), value))
                    .collect();
                parse_url_opts(url, opts)
            }
            _ => parse_url(url),
        }
    }

    /// Full object path for a key under the configured prefix
    pub fn object_path(&self, key: &str) -> Path {
        key.split('/')
            .filter(|part| !part.is_empty())
            .fold(self.prefix.clone(), |path, part| path.child(part))
    }

    /// Read an uploaded object back
    pub async fn read(&self, key: &str) -> Result<Bytes> {
        let path = self.object_path(key);
        let fetched = self
            .store
            .get(&path)
            .await
            .map_err(|e| PlatformError::upload(key, e.to_string()))?;
        fetched
            .bytes()
            .await
            .map_err(|e| PlatformError::upload(key, e.to_string()))
    }
}

#[async_trait]
impl ObjectUploader for ObjectStoreUploader {
    async fn upload_file(&self, bytes: Bytes, path: &str) -> Result<()> {
        let location = self.object_path(path);
        let size_bytes = bytes.len();

        match tokio::time::timeout(
            self.upload_timeout,
            self.store.put(&location, PutPayload::from(bytes)),
        )
        .await
        {
            Ok(Ok(_)) => {
                debug!(path, size_bytes, "Archive uploaded");
                Ok(())
            }
            Ok(Err(e)) => Err(PlatformError::upload(path, e.to_string())),
            Err(_) => Err(PlatformError::upload(
                path,
                format!("upload timed out after {}ms", self.upload_timeout.as_millis()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_uploader() -> ObjectStoreUploader {
        ObjectStoreUploader::from_config(&ObjectStoreConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_upload_then_read_back() {
        let uploader = memory_uploader();
        uploader
            .upload_file(Bytes::from_static(b"PK\x03\x04"), "challenge-zips/bob-c1.zip")
            .await
            .unwrap();
        let read = uploader.read("challenge-zips/bob-c1.zip").await.unwrap();
        assert_eq!(read.as_ref(), b"PK\x03\x04");
    }

    #[tokio::test]
    async fn test_local_directory_target() {
        let dir = tempfile::tempdir().unwrap();
        let config = ObjectStoreConfig {
            url: format!("file://{}", dir.path().display()),
            ..ObjectStoreConfig::default()
        };
        let uploader = ObjectStoreUploader::from_config(&config).unwrap();
        uploader
            .upload_file(Bytes::from_static(b"zip"), "challenge-zips/a.zip")
            .await
            .unwrap();
        assert!(dir.path().join("challenge-zips/a.zip").exists());
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let config = ObjectStoreConfig {
            url: "not a url".to_string(),
            ..ObjectStoreConfig::default()
        };
        assert!(matches!(
            ObjectStoreUploader::from_config(&config),
            Err(PlatformError::Upload { .. })
        ));
    }
}
