//! The NFT sequencer.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::error::NftError;
use super::types::NftArtifacts;
use crate::marker::{CompileError, CompileProgress, CompiledMarker, MarkerCompiler};
use crate::metrics::{NFTS_CREATED, STAGE_DURATION, STAGE_TOTAL};
use crate::storage::{ArtifactKey, ArtifactStore, StoredArtifact, MARKER_CONTENT_TYPE};
use crate::video::VideoGenerator;

/// Runs marker compilation and video generation for uploaded images.
///
/// Services are shared between requests; one instance is built at startup.
pub struct NftService {
    compiler: Arc<dyn MarkerCompiler>,
    generator: Arc<dyn VideoGenerator>,
    store: Arc<dyn ArtifactStore>,
}

impl NftService {
    pub fn new(
        compiler: Arc<dyn MarkerCompiler>,
        generator: Arc<dyn VideoGenerator>,
        store: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            compiler,
            generator,
            store,
        }
    }

    /// The store artifacts are uploaded to.
    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    /// Creates the marker and the video for `image`.
    pub async fn create_nft(&self, image: Bytes) -> Result<NftArtifacts, NftError> {
        if image.is_empty() {
            return Err(NftError::Validation("No image file provided".to_string()));
        }

        info!("Creating NFT assets from {} byte image", image.len());

        let marker = run_stage("marker", self.compile_marker(image.clone())).await?;
        let stored_marker = run_stage("marker_upload", self.upload_marker(&marker)).await?;
        let video = run_stage("video", async {
            self.generator.generate(image).await.map_err(NftError::from)
        })
        .await?;

        NFTS_CREATED.inc();
        info!(
            marker_key = %stored_marker.key,
            video_key = %video.key,
            "NFT assets created"
        );

        Ok(NftArtifacts {
            marker_url: stored_marker.url,
            video_url: video.url,
            marker_key: stored_marker.key,
            video_key: video.key,
        })
    }

    async fn compile_marker(&self, image: Bytes) -> Result<CompiledMarker, NftError> {
        let (progress_tx, mut progress_rx) = mpsc::channel::<CompileProgress>(100);

        let drain = tokio::spawn(async move {
            while let Some(progress) = progress_rx.recv().await {
                debug!(job_id = %progress.job_id, "Processing: {:.0}%", progress.percent);
            }
        });

        let result = self.compiler.compile_with_progress(image, progress_tx).await;
        // Sender is gone once compilation returns, so the drain ends on its own.
        let _ = drain.await;

        Ok(result?)
    }

    async fn upload_marker(&self, marker: &CompiledMarker) -> Result<StoredArtifact, NftError> {
        let bytes = tokio::fs::read(&marker.path)
            .await
            .map_err(CompileError::Io)?;

        let key = ArtifactKey::parse(marker.file_name.clone())
            .unwrap_or_else(|_| ArtifactKey::fresh("target", "mind"));

        let stored = self
            .store
            .put(Bytes::from(bytes), &key, MARKER_CONTENT_TYPE)
            .await;

        // The local copy is never needed again, uploaded or not.
        if let Err(e) = tokio::fs::remove_file(&marker.path).await {
            debug!("Could not remove compiled marker {:?}: {}", marker.path, e);
        }

        Ok(stored?)
    }
}

/// Runs one stage and records its outcome.
async fn run_stage<T, F>(stage: &'static str, fut: F) -> Result<T, NftError>
where
    F: Future<Output = Result<T, NftError>>,
{
    let start = Instant::now();
    let result = fut.await;

    STAGE_DURATION
        .with_label_values(&[stage])
        .observe(start.elapsed().as_secs_f64());

    match &result {
        Ok(_) => {
            STAGE_TOTAL.with_label_values(&[stage, "success"]).inc();
            debug!("Stage {} finished in {:?}", stage, start.elapsed());
        }
        Err(e) => {
            STAGE_TOTAL.with_label_values(&[stage, "failed"]).inc();
            warn!("Stage {} failed: {}", stage, e);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageError;
    use crate::testing::{MockArtifactStore, MockMarkerCompiler, MockVideoGenerator};
    use crate::video::GenerationError;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        compiler: Arc<MockMarkerCompiler>,
        generator: Arc<MockVideoGenerator>,
        store: Arc<MockArtifactStore>,
        service: NftService,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let compiler = Arc::new(MockMarkerCompiler::new(dir.path()));
        let store = Arc::new(MockArtifactStore::new());
        let generator = Arc::new(MockVideoGenerator::new().with_store(store.clone()));
        let service = NftService::new(compiler.clone(), generator.clone(), store.clone());
        Fixture {
            _dir: dir,
            compiler,
            generator,
            store,
            service,
        }
    }

    #[tokio::test]
    async fn test_success_returns_both_urls() {
        let f = fixture();

        let artifacts = f
            .service
            .create_nft(Bytes::from_static(b"image"))
            .await
            .unwrap();

        assert!(artifacts.marker_url.ends_with(".mind"));
        assert!(artifacts.video_url.ends_with(".mp4"));
        assert_ne!(artifacts.marker_key, artifacts.video_key);
        assert_eq!(
            f.store.get(artifacts.marker_key.as_str()).await.unwrap(),
            Bytes::from_static(MockMarkerCompiler::MARKER_BYTES)
        );
        assert_eq!(f.compiler.compile_count().await, 1);
        assert_eq!(f.generator.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_empty_image_is_rejected_before_any_stage() {
        let f = fixture();

        let err = f.service.create_nft(Bytes::new()).await.unwrap_err();

        assert!(err.is_client_error());
        assert_eq!(err.to_string(), "No image file provided");
        assert_eq!(f.compiler.compile_count().await, 0);
        assert_eq!(f.generator.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_compile_failure_skips_video() {
        let f = fixture();
        f.compiler
            .set_next_error(CompileError::compilation_failed("Image is too small (10x10)"))
            .await;

        let err = f
            .service
            .create_nft(Bytes::from_static(b"image"))
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "marker");
        assert_eq!(err.to_string(), "Image is too small (10x10)");
        assert_eq!(f.generator.call_count().await, 0);
        assert!(f.store.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_marker_upload_failure_skips_video() {
        let f = fixture();
        f.store
            .set_next_error(StorageError::upload_failed("target.mind", "access denied"))
            .await;

        let err = f
            .service
            .create_nft(Bytes::from_static(b"image"))
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "marker_upload");
        assert_eq!(f.generator.call_count().await, 0);
    }

    #[tokio::test]
    async fn test_compiled_marker_is_removed_when_upload_fails() {
        let f = fixture();
        f.store
            .set_next_error(StorageError::upload_failed("target.mind", "access denied"))
            .await;

        f.service
            .create_nft(Bytes::from_static(b"image"))
            .await
            .unwrap_err();

        let compiled = f.compiler.last_output().await.unwrap();
        assert!(!compiled.exists());
    }

    #[tokio::test]
    async fn test_video_failure_keeps_uploaded_marker() {
        let f = fixture();
        f.generator
            .set_next_error(GenerationError::generation_failed("NSFW content"))
            .await;

        let err = f
            .service
            .create_nft(Bytes::from_static(b"image"))
            .await
            .unwrap_err();

        assert_eq!(err.stage(), "video");
        assert_eq!(err.to_string(), "Video generation failed: NSFW content");
        let keys = f.store.keys().await;
        assert_eq!(keys.len(), 1);
        assert!(keys[0].starts_with("target_"));
    }

    #[tokio::test]
    async fn test_compiled_marker_is_removed_after_upload() {
        let f = fixture();

        f.service
            .create_nft(Bytes::from_static(b"image"))
            .await
            .unwrap();

        let compiled = f.compiler.last_output().await.unwrap();
        assert!(!compiled.exists());
    }
}
