//! Configuration for the marker module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the worker-based marker compiler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarkerConfig {
    /// Worker command line and resource limits.
    #[serde(default)]
    pub worker: WorkerCommand,

    /// Directory compiled markers are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Directory for temporary input files.
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Wall-clock limit for a single compilation in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// How long a worker may keep running after reporting its result.
    #[serde(default = "default_exit_grace")]
    pub exit_grace_secs: u64,

    /// Minimum width and height of an input image in pixels.
    #[serde(default = "default_min_dimension")]
    pub min_dimension_px: u32,

    /// Maximum number of worker processes running at once.
    #[serde(default = "default_max_parallel")]
    pub max_parallel_jobs: usize,
}

/// The external program that compiles a marker.
///
/// Arguments may contain the placeholders `{input}`, `{output}`,
/// `{output_dir}`, `{max_memory_mb}` and `{max_concurrency}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerCommand {
    /// Program to execute.
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Arguments passed to the program.
    #[serde(default = "default_args")]
    pub args: Vec<String>,

    /// Heap limit handed to the worker, in megabytes.
    #[serde(default = "default_max_memory")]
    pub max_memory_mb: u32,

    /// Thread budget handed to the worker.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: u32,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("markers")
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("arnft-uploads")
}

fn default_timeout() -> u64 {
    300 // 5 minutes
}

fn default_exit_grace() -> u64 {
    5
}

fn default_min_dimension() -> u32 {
    100
}

fn default_max_parallel() -> usize {
    2
}

fn default_program() -> PathBuf {
    PathBuf::from("node")
}

fn default_args() -> Vec<String> {
    vec![
        "--max-old-space-size={max_memory_mb}".to_string(),
        "worker/compile-worker.mjs".to_string(),
        "{input}".to_string(),
        "{output}".to_string(),
    ]
}

fn default_max_memory() -> u32 {
    2048
}

fn default_max_concurrency() -> u32 {
    1
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            worker: WorkerCommand::default(),
            output_dir: default_output_dir(),
            temp_dir: default_temp_dir(),
            timeout_secs: default_timeout(),
            exit_grace_secs: default_exit_grace(),
            min_dimension_px: default_min_dimension(),
            max_parallel_jobs: default_max_parallel(),
        }
    }
}

impl Default for WorkerCommand {
    fn default() -> Self {
        Self {
            program: default_program(),
            args: default_args(),
            max_memory_mb: default_max_memory(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl WorkerCommand {
    /// Creates a command for `program` with the given argument template.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            ..Default::default()
        }
    }
}

impl MarkerConfig {
    /// Sets the worker command.
    pub fn with_worker(mut self, worker: WorkerCommand) -> Self {
        self.worker = worker;
        self
    }

    /// Sets the output and temp directories.
    pub fn with_dirs(mut self, output_dir: PathBuf, temp_dir: PathBuf) -> Self {
        self.output_dir = output_dir;
        self.temp_dir = temp_dir;
        self
    }

    /// Sets the timeout in seconds.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Sets the grace period after a terminal message.
    pub fn with_exit_grace(mut self, exit_grace_secs: u64) -> Self {
        self.exit_grace_secs = exit_grace_secs;
        self
    }
}
