//! Artifact storage.
//!
//! Produced artifacts (compiled markers, generated videos, AR pages) are handed
//! off to an [`ArtifactStore`] which returns the URL callers can fetch them from.
//!
//! Two backends are available:
//!
//! - [`S3Store`]: an S3 bucket (or any S3-compatible service via a custom endpoint)
//! - [`FsStore`]: a local directory, served by the HTTP server under `/outputs`
//!
//! Keys are never reused: [`ArtifactKey::fresh`] combines a millisecond timestamp
//! with a random suffix, so uploading the same bytes twice yields two objects.

mod config;
mod error;
mod fs_store;
mod s3;
mod traits;
mod types;

use std::sync::Arc;

use tracing::info;

pub use config::{LocalStoreConfig, S3Config, StorageBackend, StorageConfig};
pub use error::StorageError;
pub use fs_store::FsStore;
pub use s3::S3Store;
pub use traits::ArtifactStore;
pub use types::{ArtifactKey, StoredArtifact};

/// Content type used for compiled marker files.
pub const MARKER_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type used for generated videos.
pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// Content type used for AR pages.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

/// Builds the artifact store selected by the configuration.
pub async fn create_store(config: &StorageConfig) -> Result<Arc<dyn ArtifactStore>, StorageError> {
    match config.backend {
        StorageBackend::S3 => {
            info!(
                "Initializing S3 artifact store (bucket: {}, region: {})",
                config.s3.bucket, config.s3.region
            );
            Ok(Arc::new(S3Store::new(&config.s3).await?))
        }
        StorageBackend::Local => {
            info!(
                "Initializing local artifact store at {:?}",
                config.local.dir
            );
            Ok(Arc::new(FsStore::new(config.local.clone())))
        }
    }
}
