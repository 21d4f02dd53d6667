//! Local directory artifact store.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use super::config::LocalStoreConfig;
use super::error::StorageError;
use super::traits::ArtifactStore;
use super::types::{ArtifactKey, StoredArtifact};
use crate::metrics::{UPLOADS_TOTAL, UPLOAD_BYTES};

/// Stores artifacts as files in a single directory.
///
/// Files are created with `create_new`, so an existing object is never
/// overwritten.
pub struct FsStore {
    dir: PathBuf,
    public_base_url: String,
}

impl FsStore {
    pub fn new(config: LocalStoreConfig) -> Self {
        Self {
            dir: config.dir,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Directory holding the stored files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn url_for(&self, key: &ArtifactKey) -> String {
        format!("{}/{}", self.public_base_url, key)
    }

    async fn write_new(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        Ok(())
    }
}

#[async_trait]
impl ArtifactStore for FsStore {
    fn name(&self) -> &str {
        "local"
    }

    async fn put(
        &self,
        bytes: Bytes,
        key: &ArtifactKey,
        content_type: &str,
    ) -> Result<StoredArtifact, StorageError> {
        let path = self.dir.join(key.as_str());

        if let Err(e) = self.write_new(&path, &bytes).await {
            UPLOADS_TOTAL.with_label_values(&["local", "failed"]).inc();
            let reason = if e.kind() == std::io::ErrorKind::AlreadyExists {
                format!("object {} already exists", key)
            } else {
                e.to_string()
            };
            return Err(StorageError::upload_failed(key.as_str(), reason));
        }

        UPLOADS_TOTAL.with_label_values(&["local", "success"]).inc();
        UPLOAD_BYTES.inc_by(bytes.len() as u64);
        debug!("Stored {} ({} bytes) at {:?}", key, bytes.len(), path);

        Ok(StoredArtifact {
            key: key.clone(),
            url: self.url_for(key),
            size_bytes: bytes.len() as u64,
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, key: &ArtifactKey) -> Result<(), StorageError> {
        let path = self.dir.join(key.as_str());
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound {
                key: key.to_string(),
            }),
            Err(e) => Err(StorageError::delete_failed(key.as_str(), e.to_string())),
        }
    }
}
