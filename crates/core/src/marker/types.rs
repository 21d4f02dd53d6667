//! Types for the marker module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A message emitted by the worker on stdout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WorkerMessage {
    /// Completion percentage, nominally in [0, 100].
    Progress { progress: f64 },
    /// Terminal result.
    Complete {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<PathBuf>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl WorkerMessage {
    /// Parses one line of worker output. Returns `None` for anything that is
    /// not a protocol message.
    pub fn parse_line(line: &str) -> Option<Self> {
        let trimmed = line.trim();
        if !trimmed.starts_with('{') {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

/// Lifecycle of a compilation job.
///
/// `Idle → Spawned → Progressing* → {Succeeded | Failed | Crashed | TimedOut}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompileState {
    Idle,
    Spawned,
    Progressing,
    Succeeded,
    Failed,
    Crashed,
    TimedOut,
}

impl CompileState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Crashed | Self::TimedOut
        )
    }

    /// Moves to `next` unless the job already settled.
    pub fn advance(&mut self, next: CompileState) -> bool {
        if self.is_terminal() {
            return false;
        }
        *self = next;
        true
    }
}

/// Keeps reported progress within [0, 100] and never lets it go backwards.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    max: Option<f64>,
}

impl ProgressTracker {
    /// Feeds a raw value from the worker. Returns the value to report, or
    /// `None` when nothing new should be reported.
    pub fn observe(&mut self, raw: f64) -> Option<f64> {
        if !raw.is_finite() {
            return None;
        }
        let clamped = raw.clamp(0.0, 100.0);
        match self.max {
            Some(max) if clamped <= max => None,
            _ => {
                self.max = Some(clamped);
                Some(clamped)
            }
        }
    }

    /// Highest value reported so far.
    pub fn current(&self) -> Option<f64> {
        self.max
    }
}

/// Progress update sent while a job runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompileProgress {
    pub job_id: String,
    pub percent: f64,
}

/// A successfully compiled marker on local disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompiledMarker {
    pub job_id: String,
    pub path: PathBuf,
    pub file_name: String,
    pub size_bytes: u64,
    pub duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_progress() {
        let msg = WorkerMessage::parse_line(r#"{"type":"progress","progress":42.5}"#).unwrap();
        assert_eq!(msg, WorkerMessage::Progress { progress: 42.5 });
        assert!(!msg.is_terminal());
    }

    #[test]
    fn test_parse_complete_success() {
        let msg = WorkerMessage::parse_line(
            r#"{"type":"complete","success":true,"message":"ok","path":"/out/target.mind"}"#,
        )
        .unwrap();
        match msg {
            WorkerMessage::Complete {
                success,
                path,
                message,
            } => {
                assert!(success);
                assert_eq!(path, Some(PathBuf::from("/out/target.mind")));
                assert_eq!(message.as_deref(), Some("ok"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_ignores_noise() {
        assert!(WorkerMessage::parse_line("Compiling targets...").is_none());
        assert!(WorkerMessage::parse_line(r#"{"type":"unknown"}"#).is_none());
        assert!(WorkerMessage::parse_line("").is_none());
    }

    #[test]
    fn test_tracker_never_decreases() {
        let mut tracker = ProgressTracker::default();
        let reported: Vec<f64> = [10.0, 50.0, 30.0, 50.0, 120.0, 80.0]
            .into_iter()
            .filter_map(|v| tracker.observe(v))
            .collect();
        assert_eq!(reported, vec![10.0, 50.0, 100.0]);
        assert_eq!(tracker.current(), Some(100.0));
    }

    #[test]
    fn test_tracker_clamps_and_drops_nan() {
        let mut tracker = ProgressTracker::default();
        assert_eq!(tracker.observe(-5.0), Some(0.0));
        assert_eq!(tracker.observe(f64::NAN), None);
        assert_eq!(tracker.observe(f64::INFINITY), None);
        assert_eq!(tracker.observe(0.5), Some(0.5));
    }

    #[test]
    fn test_state_has_no_exit_from_terminal() {
        let mut state = CompileState::Idle;
        assert!(state.advance(CompileState::Spawned));
        assert!(state.advance(CompileState::Progressing));
        assert!(state.advance(CompileState::Crashed));
        assert!(!state.advance(CompileState::Succeeded));
        assert_eq!(state, CompileState::Crashed);
    }
}
