//! Trait definitions for the marker module.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use super::error::CompileError;
use super::types::{CompileProgress, CompiledMarker};

/// Compiles an image into an AR tracking marker.
#[async_trait]
pub trait MarkerCompiler: Send + Sync {
    /// Returns the name of this compiler implementation.
    fn name(&self) -> &str;

    /// Compiles `image` into a marker file.
    async fn compile(&self, image: Bytes) -> Result<CompiledMarker, CompileError>;

    /// Compiles `image`, reporting progress while the job runs.
    ///
    /// Reported percentages are non-decreasing. If the receiver is dropped,
    /// compilation continues without progress reporting.
    async fn compile_with_progress(
        &self,
        image: Bytes,
        progress_tx: mpsc::Sender<CompileProgress>,
    ) -> Result<CompiledMarker, CompileError>;
}
