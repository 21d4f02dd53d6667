//! Error types for the video module.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur while generating a video.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The source image could not be prepared.
    #[error("Failed to prepare image: {0}")]
    Preprocess(String),

    /// The service rejected the generation request.
    #[error("Video generation request failed (HTTP {status}): {message}")]
    SubmissionFailed { status: u16, message: String },

    /// The service reported the task as failed.
    #[error("Video generation failed: {reason}")]
    GenerationFailed { reason: String },

    /// The task did not finish within the polling budget.
    #[error("Video generation timed out after {attempts} status checks ({elapsed_secs:.1}s)")]
    GenerationTimedOut { attempts: u32, elapsed_secs: f64 },

    /// A status check returned a non-success HTTP status.
    #[error("Video status check failed (HTTP {status})")]
    StatusCheckFailed { status: u16 },

    /// The generated video could not be downloaded.
    #[error("Failed to download generated video (HTTP {status})")]
    DownloadFailed { status: u16 },

    /// The downloaded video could not be stored.
    #[error("Failed to store generated video: {0}")]
    UploadFailed(#[from] StorageError),

    /// Transport error talking to the service.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl GenerationError {
    /// Creates a generation failed error.
    pub fn generation_failed(reason: impl Into<String>) -> Self {
        Self::GenerationFailed {
            reason: reason.into(),
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Preprocess(_) => "preprocess",
            Self::SubmissionFailed { .. } => "submission_failed",
            Self::GenerationFailed { .. } => "failed",
            Self::GenerationTimedOut { .. } => "timed_out",
            Self::StatusCheckFailed { .. } => "status_check_failed",
            Self::DownloadFailed { .. } => "download_failed",
            Self::UploadFailed(_) => "upload_failed",
            Self::Http(_) => "http",
        }
    }
}
