//! Trait definitions for the video module.

use async_trait::async_trait;
use bytes::Bytes;

use super::error::GenerationError;
use super::types::GeneratedVideo;

/// Turns a still image into a short video and stores the result.
#[async_trait]
pub trait VideoGenerator: Send + Sync {
    /// Returns the name of this generator.
    fn name(&self) -> &str;

    /// Generates a video from `image` and uploads it to the artifact store.
    async fn generate(&self, image: Bytes) -> Result<GeneratedVideo, GenerationError>;
}
