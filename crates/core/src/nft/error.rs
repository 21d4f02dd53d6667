//! Error types for the nft module.

use thiserror::Error;

use crate::marker::CompileError;
use crate::storage::StorageError;
use crate::video::GenerationError;

/// Errors that can occur while creating an NFT asset pair.
#[derive(Debug, Error)]
pub enum NftError {
    /// The request was unusable.
    #[error("{0}")]
    Validation(String),

    /// Marker compilation failed.
    #[error(transparent)]
    Compilation(#[from] CompileError),

    /// Video generation failed.
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// The compiled marker could not be stored.
    #[error(transparent)]
    Upload(#[from] StorageError),
}

impl NftError {
    /// Whether the caller is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// The stage that produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Compilation(_) => "marker",
            Self::Upload(_) => "marker_upload",
            Self::Generation(_) => "video",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_errors_keep_their_message() {
        let err: NftError = CompileError::ProcessingTimeout { timeout_secs: 300 }.into();
        assert_eq!(err.to_string(), "Processing timed out after 300 seconds");
        assert_eq!(err.stage(), "marker");
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_validation_is_client_error() {
        let err = NftError::Validation("No image file provided".to_string());
        assert_eq!(err.to_string(), "No image file provided");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_upload_stage() {
        let err: NftError = StorageError::upload_failed("target_1.mind", "bucket missing").into();
        assert_eq!(err.stage(), "marker_upload");
        assert_eq!(err.to_string(), "Upload failed: bucket missing");
    }
}
