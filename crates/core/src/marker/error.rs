//! Error types for the marker module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while compiling a marker.
#[derive(Debug, Error)]
pub enum CompileError {
    /// Worker program could not be found.
    #[error("Compilation worker not found: {program}")]
    WorkerNotFound { program: PathBuf },

    /// The image was rejected or the worker reported a failure.
    #[error("{reason}")]
    CompilationFailed { reason: String },

    /// Worker exited without reporting a result.
    #[error("Compilation worker crashed ({})", describe_exit(.exit_code))]
    WorkerCrashed {
        exit_code: Option<i32>,
        stderr: Option<String>,
    },

    /// Compilation exceeded its wall-clock limit and the worker was killed.
    #[error("Processing timed out after {timeout_secs} seconds")]
    ProcessingTimeout { timeout_secs: u64 },

    /// Output directory could not be created.
    #[error("Failed to create output directory: {path}")]
    OutputDirectoryFailed { path: PathBuf },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

impl CompileError {
    /// Creates a compilation failed error.
    pub fn compilation_failed(reason: impl Into<String>) -> Self {
        Self::CompilationFailed {
            reason: reason.into(),
        }
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::WorkerNotFound { .. } => "worker_not_found",
            Self::CompilationFailed { .. } => "failed",
            Self::WorkerCrashed { .. } => "crashed",
            Self::ProcessingTimeout { .. } => "timed_out",
            Self::OutputDirectoryFailed { .. } | Self::Io(_) => "io",
        }
    }
}
