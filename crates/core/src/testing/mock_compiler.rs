//! Mock marker compiler for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::marker::{CompileError, CompileProgress, CompiledMarker, MarkerCompiler};
use crate::storage::ArtifactKey;

/// Mock implementation of the MarkerCompiler trait.
///
/// Writes a small placeholder marker file into its directory so downstream
/// stages can read a real file.
///
/// # Example
///
/// ```rust,ignore
/// use arnft_core::testing::MockMarkerCompiler;
///
/// let compiler = MockMarkerCompiler::new(temp_dir.path());
/// compiler.set_next_error(CompileError::compilation_failed("bad image")).await;
/// assert!(compiler.compile(image).await.is_err());
/// ```
#[derive(Debug)]
pub struct MockMarkerCompiler {
    /// Where marker files are written.
    dir: PathBuf,
    /// Images received, in call order.
    calls: Arc<RwLock<Vec<Bytes>>>,
    /// Path of the most recently written marker.
    last_output: Arc<RwLock<Option<PathBuf>>>,
    /// If set, the next compilation will fail with this error.
    next_error: Arc<RwLock<Option<CompileError>>>,
    /// Progress values reported during compilation.
    progress_steps: Arc<RwLock<Vec<f64>>>,
}

impl MockMarkerCompiler {
    /// Contents of every marker written by the mock.
    pub const MARKER_BYTES: &'static [u8] = b"MOCK-MIND";

    /// Create a mock compiler writing markers into `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            calls: Arc::new(RwLock::new(Vec::new())),
            last_output: Arc::new(RwLock::new(None)),
            next_error: Arc::new(RwLock::new(None)),
            progress_steps: Arc::new(RwLock::new(vec![25.0, 50.0, 100.0])),
        }
    }

    /// Number of compilations requested.
    pub async fn compile_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Images received, in call order.
    pub async fn recorded_images(&self) -> Vec<Bytes> {
        self.calls.read().await.clone()
    }

    /// Path of the most recently written marker.
    pub async fn last_output(&self) -> Option<PathBuf> {
        self.last_output.read().await.clone()
    }

    /// Configure the next compilation to fail with the given error.
    pub async fn set_next_error(&self, error: CompileError) {
        *self.next_error.write().await = Some(error);
    }

    /// Set the progress values reported during compilation.
    pub async fn set_progress_steps(&self, steps: Vec<f64>) {
        *self.progress_steps.write().await = steps;
    }

    async fn run(
        &self,
        image: Bytes,
        progress_tx: Option<mpsc::Sender<CompileProgress>>,
    ) -> Result<CompiledMarker, CompileError> {
        self.calls.write().await.push(image);

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        let job_id = uuid::Uuid::new_v4().to_string();
        if let Some(tx) = progress_tx {
            for percent in self.progress_steps.read().await.iter() {
                let _ = tx
                    .send(CompileProgress {
                        job_id: job_id.clone(),
                        percent: *percent,
                    })
                    .await;
            }
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = ArtifactKey::fresh("target", "mind").into_string();
        let path = self.dir.join(&file_name);
        tokio::fs::write(&path, Self::MARKER_BYTES).await?;
        *self.last_output.write().await = Some(path.clone());

        Ok(CompiledMarker {
            job_id,
            path,
            file_name,
            size_bytes: Self::MARKER_BYTES.len() as u64,
            duration_ms: 1,
        })
    }
}

#[async_trait]
impl MarkerCompiler for MockMarkerCompiler {
    fn name(&self) -> &str {
        "mock"
    }

    async fn compile(&self, image: Bytes) -> Result<CompiledMarker, CompileError> {
        self.run(image, None).await
    }

    async fn compile_with_progress(
        &self,
        image: Bytes,
        progress_tx: mpsc::Sender<CompileProgress>,
    ) -> Result<CompiledMarker, CompileError> {
        self.run(image, Some(progress_tx)).await
    }
}
