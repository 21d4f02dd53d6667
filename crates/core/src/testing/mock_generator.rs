//! Mock video generator for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::storage::{ArtifactKey, ArtifactStore, VIDEO_CONTENT_TYPE};
use crate::video::{GeneratedVideo, GenerationError, VideoGenerator};

/// Mock implementation of the VideoGenerator trait.
///
/// Without a store the returned URL points at a fake CDN. With a store the
/// placeholder video is uploaded like a real generator would.
pub struct MockVideoGenerator {
    /// Store the placeholder video is uploaded to.
    store: Option<Arc<dyn ArtifactStore>>,
    /// Number of generate calls.
    calls: Arc<RwLock<usize>>,
    /// If set, the next generation will fail with this error.
    next_error: Arc<RwLock<Option<GenerationError>>>,
}

impl Default for MockVideoGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVideoGenerator {
    /// Contents of every video produced by the mock.
    pub const VIDEO_BYTES: &'static [u8] = b"MOCK-MP4";

    /// Create a new mock generator.
    pub fn new() -> Self {
        Self {
            store: None,
            calls: Arc::new(RwLock::new(0)),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Upload generated videos to `store`.
    pub fn with_store(mut self, store: Arc<dyn ArtifactStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Number of generations requested.
    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }

    /// Configure the next generation to fail with the given error.
    pub async fn set_next_error(&self, error: GenerationError) {
        *self.next_error.write().await = Some(error);
    }
}

#[async_trait]
impl VideoGenerator for MockVideoGenerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(&self, _image: Bytes) -> Result<GeneratedVideo, GenerationError> {
        let attempt = {
            let mut calls = self.calls.write().await;
            *calls += 1;
            *calls
        };

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let task_id = format!("mock-task-{}", attempt);
        let source_url = format!("https://cdn.mock/{}.mp4", task_id);
        let key = ArtifactKey::fresh("video", "mp4");

        let (url, key) = match &self.store {
            Some(store) => {
                let stored = store
                    .put(Bytes::from_static(Self::VIDEO_BYTES), &key, VIDEO_CONTENT_TYPE)
                    .await?;
                (stored.url, stored.key)
            }
            None => (source_url.clone(), key),
        };

        Ok(GeneratedVideo {
            task_id,
            source_url,
            url,
            key,
            size_bytes: Self::VIDEO_BYTES.len() as u64,
            attempts: 1,
        })
    }
}
