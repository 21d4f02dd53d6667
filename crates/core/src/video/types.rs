//! Types for the video module.

use serde::{Deserialize, Serialize};

use crate::storage::ArtifactKey;

/// Status of a remote generation task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GenerationStatus {
    /// Accepted but not started.
    Queued,
    /// Running.
    Processing,
    /// Finished with at least one video.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// A status this client does not know. Treated as still running.
    Unknown(String),
}

impl GenerationStatus {
    /// Parses the status string reported by the service.
    pub fn parse(status: &str) -> Self {
        match status {
            "TASK_STATUS_QUEUED" => Self::Queued,
            "TASK_STATUS_PROCESSING" => Self::Processing,
            "TASK_STATUS_SUCCEED" => Self::Succeeded,
            "TASK_STATUS_FAILED" => Self::Failed,
            other => Self::Unknown(other.to_string()),
        }
    }

    /// Whether polling should stop.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// A generated video, already handed off to the artifact store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedVideo {
    /// Remote task id.
    pub task_id: String,
    /// Where the service published the video.
    pub source_url: String,
    /// Artifact store URL.
    pub url: String,
    /// Artifact store key.
    pub key: ArtifactKey,
    pub size_bytes: u64,
    /// Status checks it took.
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status() {
        assert_eq!(
            GenerationStatus::parse("TASK_STATUS_SUCCEED"),
            GenerationStatus::Succeeded
        );
        assert_eq!(
            GenerationStatus::parse("TASK_STATUS_FAILED"),
            GenerationStatus::Failed
        );
        assert_eq!(
            GenerationStatus::parse("TASK_STATUS_QUEUED"),
            GenerationStatus::Queued
        );
        assert_eq!(
            GenerationStatus::parse("TASK_STATUS_PAUSED"),
            GenerationStatus::Unknown("TASK_STATUS_PAUSED".to_string())
        );
    }

    #[test]
    fn test_only_succeed_and_failed_are_terminal() {
        assert!(GenerationStatus::Succeeded.is_terminal());
        assert!(GenerationStatus::Failed.is_terminal());
        assert!(!GenerationStatus::Processing.is_terminal());
        assert!(!GenerationStatus::Unknown(String::new()).is_terminal());
    }
}
