//! In-memory artifact store for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{ArtifactKey, ArtifactStore, StorageError, StoredArtifact};

/// A stored object.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bytes: Bytes,
    pub content_type: String,
}

/// Mock implementation of the ArtifactStore trait.
///
/// Objects live in memory. Like the real backends it refuses to overwrite
/// an existing key.
#[derive(Debug)]
pub struct MockArtifactStore {
    base_url: String,
    /// Stored objects by key.
    objects: Arc<RwLock<HashMap<String, StoredObject>>>,
    /// Keys in upload order.
    order: Arc<RwLock<Vec<String>>>,
    /// If set, the next operation will fail with this error.
    next_error: Arc<RwLock<Option<StorageError>>>,
}

impl Default for MockArtifactStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MockArtifactStore {
    /// Create an empty store with URLs under `https://store.mock`.
    pub fn new() -> Self {
        Self::with_base_url("https://store.mock")
    }

    /// Create an empty store with URLs under `base_url`.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            objects: Arc::new(RwLock::new(HashMap::new())),
            order: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Bytes stored under `key`.
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        self.objects.read().await.get(key).map(|o| o.bytes.clone())
    }

    /// Object stored under `key`.
    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// Keys currently stored, in upload order.
    pub async fn keys(&self) -> Vec<String> {
        let objects = self.objects.read().await;
        self.order
            .read()
            .await
            .iter()
            .filter(|k| objects.contains_key(*k))
            .cloned()
            .collect()
    }

    /// Configure the next operation to fail with the given error.
    pub async fn set_next_error(&self, error: StorageError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl ArtifactStore for MockArtifactStore {
    fn name(&self) -> &str {
        "mock"
    }

    async fn put(
        &self,
        bytes: Bytes,
        key: &ArtifactKey,
        content_type: &str,
    ) -> Result<StoredArtifact, StorageError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let mut objects = self.objects.write().await;
        if objects.contains_key(key.as_str()) {
            return Err(StorageError::upload_failed(
                key.as_str(),
                "object already exists",
            ));
        }

        let size_bytes = bytes.len() as u64;
        objects.insert(
            key.to_string(),
            StoredObject {
                bytes,
                content_type: content_type.to_string(),
            },
        );
        self.order.write().await.push(key.to_string());

        Ok(StoredArtifact {
            key: key.clone(),
            url: format!("{}/{}", self.base_url.trim_end_matches('/'), key),
            size_bytes,
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, key: &ArtifactKey) -> Result<(), StorageError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        match self.objects.write().await.remove(key.as_str()) {
            Some(_) => Ok(()),
            None => Err(StorageError::NotFound {
                key: key.to_string(),
            }),
        }
    }
}
