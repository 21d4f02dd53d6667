//! Error types for the storage module.

use thiserror::Error;

/// Errors that can occur while storing artifacts.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Key is empty or contains path components.
    #[error("Invalid storage key: {key}")]
    InvalidKey { key: String },

    /// Upload was rejected or failed.
    #[error("Upload failed: {reason}")]
    UploadFailed { key: String, reason: String },

    /// Object does not exist.
    #[error("Artifact not found: {key}")]
    NotFound { key: String },

    /// Delete was rejected or failed.
    #[error("Delete failed: {reason}")]
    DeleteFailed { key: String, reason: String },

    /// Backend is missing required settings.
    #[error("Storage not configured: {0}")]
    NotConfigured(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    /// Creates an upload failed error.
    pub fn upload_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::UploadFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Creates a delete failed error.
    pub fn delete_failed(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DeleteFailed {
            key: key.into(),
            reason: reason.into(),
        }
    }
}
