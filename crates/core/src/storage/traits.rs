//! Trait definitions for the storage module.

use async_trait::async_trait;
use bytes::Bytes;

use super::error::StorageError;
use super::types::{ArtifactKey, StoredArtifact};

/// A blob store that issues URLs for uploaded artifacts.
///
/// Implementations must be safe for unsynchronized concurrent use: one store
/// instance is shared by every in-flight request.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Returns the name of this backend.
    fn name(&self) -> &str;

    /// Uploads `bytes` under `key` and returns where it can be fetched.
    async fn put(
        &self,
        bytes: Bytes,
        key: &ArtifactKey,
        content_type: &str,
    ) -> Result<StoredArtifact, StorageError>;

    /// Removes the object stored under `key`.
    async fn delete(&self, key: &ArtifactKey) -> Result<(), StorageError>;
}
