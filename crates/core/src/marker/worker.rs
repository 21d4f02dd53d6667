//! Worker-process marker compiler.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::{mpsc, Semaphore};
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::config::MarkerConfig;
use super::error::CompileError;
use super::traits::MarkerCompiler;
use super::types::{CompileProgress, CompileState, CompiledMarker, ProgressTracker, WorkerMessage};
use crate::metrics::{WORKERS_SPAWNED, WORKER_OUTCOMES};
use crate::storage::ArtifactKey;

/// Bytes of worker stderr kept for crash reports.
const STDERR_TAIL_BYTES: usize = 4096;

/// How long to wait for the stderr reader after the worker is gone.
const STDERR_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Compiles markers by supervising an external worker process per job.
pub struct WorkerCompiler {
    config: MarkerConfig,
    permits: Arc<Semaphore>,
}

/// How the worker settled.
enum Settled {
    Reported {
        success: bool,
        path: Option<PathBuf>,
        message: Option<String>,
    },
    Exited(ExitStatus),
}

impl WorkerCompiler {
    /// Creates a new compiler with the given configuration.
    pub fn new(config: MarkerConfig) -> Self {
        let permits = Arc::new(Semaphore::new(config.max_parallel_jobs.max(1)));
        Self { config, permits }
    }

    /// Creates a compiler with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(MarkerConfig::default())
    }

    pub fn config(&self) -> &MarkerConfig {
        &self.config
    }

    /// Checks that the upload is a decodable image of usable size.
    /// Returns the file extension matching its format.
    fn inspect_image(&self, image: &[u8]) -> Result<Option<&'static str>, CompileError> {
        let reader = image::ImageReader::new(Cursor::new(image))
            .with_guessed_format()
            .map_err(|e| CompileError::compilation_failed(format!("Invalid image: {}", e)))?;

        let extension = reader
            .format()
            .and_then(|format| format.extensions_str().first().copied());

        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| CompileError::compilation_failed(format!("Invalid image: {}", e)))?;

        let min = self.config.min_dimension_px;
        if width < min || height < min {
            return Err(CompileError::compilation_failed(format!(
                "Image is too small ({}x{}); minimum dimension is {} pixels",
                width, height, min
            )));
        }

        Ok(extension)
    }

    /// Expands the argument template for one job.
    fn build_args(&self, input_path: &Path, output_path: &Path) -> Vec<String> {
        let worker = &self.config.worker;
        let input = input_path.to_string_lossy();
        let output = output_path.to_string_lossy();
        let output_dir = self.config.output_dir.to_string_lossy();
        let max_memory = worker.max_memory_mb.to_string();
        let max_concurrency = worker.max_concurrency.to_string();

        worker
            .args
            .iter()
            .map(|arg| {
                arg.replace("{input}", &input)
                    .replace("{output_dir}", &output_dir)
                    .replace("{output}", &output)
                    .replace("{max_memory_mb}", &max_memory)
                    .replace("{max_concurrency}", &max_concurrency)
            })
            .collect()
    }

    fn spawn(&self, input_path: &Path, output_path: &Path) -> Result<Child, CompileError> {
        let worker = &self.config.worker;
        let mut command = Command::new(&worker.program);
        command
            .args(self.build_args(input_path, output_path))
            .env("ARNFT_WORKER_MAX_MEMORY_MB", worker.max_memory_mb.to_string())
            .env(
                "ARNFT_WORKER_MAX_CONCURRENCY",
                worker.max_concurrency.to_string(),
            )
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        // Own process group so helpers forked by the worker die with it.
        #[cfg(unix)]
        command.process_group(0);

        command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CompileError::WorkerNotFound {
                    program: worker.program.clone(),
                }
            } else {
                CompileError::Io(e)
            }
        })
    }

    /// Reads worker output until the first terminal message or until stdout closes.
    async fn supervise(
        &self,
        child: &mut Child,
        stdout: ChildStdout,
        job_id: &str,
        state: &mut CompileState,
        progress_tx: Option<mpsc::Sender<CompileProgress>>,
    ) -> Result<Settled, CompileError> {
        let mut lines = BufReader::new(stdout).lines();
        let mut tracker = ProgressTracker::default();

        while let Some(line) = lines.next_line().await? {
            match WorkerMessage::parse_line(&line) {
                Some(WorkerMessage::Progress { progress }) => {
                    state.advance(CompileState::Progressing);
                    if let Some(percent) = tracker.observe(progress) {
                        debug!(job_id, "Processing: {:.1}%", percent);
                        if let Some(ref tx) = progress_tx {
                            // Non-blocking send
                            let _ = tx.try_send(CompileProgress {
                                job_id: job_id.to_string(),
                                percent,
                            });
                        }
                    }
                }
                Some(WorkerMessage::Complete {
                    success,
                    path,
                    message,
                }) => {
                    return Ok(Settled::Reported {
                        success,
                        path,
                        message,
                    });
                }
                None => debug!(job_id, "worker: {}", line),
            }
        }

        let status = child.wait().await?;
        Ok(Settled::Exited(status))
    }

    async fn run_job(
        &self,
        image: Bytes,
        progress_tx: Option<mpsc::Sender<CompileProgress>>,
    ) -> Result<CompiledMarker, CompileError> {
        let job_id = Uuid::new_v4().to_string();
        let start = Instant::now();

        let extension = self.inspect_image(&image)?;

        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| CompileError::compilation_failed("Marker compiler is shutting down"))?;

        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|_| CompileError::OutputDirectoryFailed {
                path: self.config.output_dir.clone(),
            })?;
        tokio::fs::create_dir_all(&self.config.temp_dir).await?;

        // Deleted on drop, on every return path below.
        let input = tempfile::Builder::new()
            .prefix("upload_")
            .suffix(&format!(".{}", extension.unwrap_or("img")))
            .tempfile_in(&self.config.temp_dir)?;
        tokio::fs::write(input.path(), &image).await?;

        let file_name = ArtifactKey::fresh("target", "mind").into_string();
        let output_path = self.config.output_dir.join(&file_name);

        let mut state = CompileState::Idle;
        let mut child = self.spawn(input.path(), &output_path)?;
        let mut group = ProcessGroup::new(child.id());
        state.advance(CompileState::Spawned);
        WORKERS_SPAWNED.inc();
        info!(job_id = %job_id, pid = ?child.id(), "Spawned compilation worker");

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                terminate(&mut child, &mut group).await;
                return Err(CompileError::Io(std::io::Error::other(
                    "worker stdio was not captured",
                )));
            }
        };
        let stderr_task = tokio::spawn(collect_stderr(stderr));

        let limit = Duration::from_secs(self.config.timeout_secs);
        let supervised = timeout(
            limit,
            self.supervise(&mut child, stdout, &job_id, &mut state, progress_tx),
        )
        .await;

        let settled = match supervised {
            Ok(Ok(settled)) => settled,
            Ok(Err(e)) => {
                terminate(&mut child, &mut group).await;
                state.advance(CompileState::Failed);
                WORKER_OUTCOMES.with_label_values(&["failed"]).inc();
                return Err(e);
            }
            Err(_) => {
                warn!(
                    job_id = %job_id,
                    "Compilation exceeded {}s, killing worker",
                    self.config.timeout_secs
                );
                terminate(&mut child, &mut group).await;
                state.advance(CompileState::TimedOut);
                WORKER_OUTCOMES.with_label_values(&["timed_out"]).inc();
                return Err(CompileError::ProcessingTimeout {
                    timeout_secs: self.config.timeout_secs,
                });
            }
        };

        if matches!(settled, Settled::Reported { .. }) {
            let grace = Duration::from_secs(self.config.exit_grace_secs);
            if timeout(grace, child.wait()).await.is_err() {
                warn!(
                    job_id = %job_id,
                    "Worker still running {}s after reporting, killing it",
                    self.config.exit_grace_secs
                );
            }
        }
        terminate(&mut child, &mut group).await;

        let stderr_tail = match timeout(STDERR_DRAIN_TIMEOUT, stderr_task).await {
            Ok(Ok(tail)) => tail,
            _ => String::new(),
        };

        let result = match settled {
            Settled::Reported {
                success: true,
                path,
                ..
            } => {
                let path = path.unwrap_or(output_path);
                match tokio::fs::metadata(&path).await {
                    Ok(meta) if meta.is_file() => Ok(CompiledMarker {
                        job_id: job_id.clone(),
                        file_name: path
                            .file_name()
                            .map(|n| n.to_string_lossy().to_string())
                            .unwrap_or(file_name),
                        path,
                        size_bytes: meta.len(),
                        duration_ms: start.elapsed().as_millis() as u64,
                    }),
                    _ => Err(CompileError::compilation_failed(format!(
                        "Worker reported success but {} was not written",
                        path.display()
                    ))),
                }
            }
            Settled::Reported { message, .. } => Err(CompileError::compilation_failed(
                message.unwrap_or_else(|| "Worker reported failure without a message".to_string()),
            )),
            Settled::Exited(status) => {
                warn!(
                    job_id = %job_id,
                    "Worker exited with {:?} before reporting a result",
                    status.code()
                );
                Err(CompileError::WorkerCrashed {
                    exit_code: status.code(),
                    stderr: if stderr_tail.is_empty() {
                        None
                    } else {
                        Some(stderr_tail)
                    },
                })
            }
        };

        let (next_state, outcome) = match &result {
            Ok(_) => (CompileState::Succeeded, "success"),
            Err(CompileError::WorkerCrashed { .. }) => (CompileState::Crashed, "crashed"),
            Err(_) => (CompileState::Failed, "failed"),
        };
        state.advance(next_state);
        WORKER_OUTCOMES.with_label_values(&[outcome]).inc();

        match &result {
            Ok(marker) => info!(
                job_id = %job_id,
                "Marker compiled in {} ms ({} bytes)",
                marker.duration_ms, marker.size_bytes
            ),
            Err(e) => warn!(job_id = %job_id, state = ?state, "Marker compilation failed: {}", e),
        }

        result
    }
}

/// Kills the worker's process group and reaps the worker.
async fn terminate(child: &mut Child, group: &mut ProcessGroup) {
    group.kill();
    if let Err(e) = child.kill().await {
        debug!("Worker already exited: {}", e);
    }
}

/// Keeps the last few KiB of worker stderr.
async fn collect_stderr(stderr: ChildStderr) -> String {
    let mut lines = BufReader::new(stderr).lines();
    let mut tail = String::new();

    while let Ok(Some(line)) = lines.next_line().await {
        debug!("worker stderr: {}", line);
        tail.push_str(&line);
        tail.push('\n');
        if tail.len() > STDERR_TAIL_BYTES {
            let mut cut = tail.len() - STDERR_TAIL_BYTES;
            while !tail.is_char_boundary(cut) {
                cut += 1;
            }
            tail.drain(..cut);
        }
    }

    tail
}

/// Process group of a spawned worker, killed on drop unless already killed.
struct ProcessGroup {
    pgid: Option<u32>,
}

impl ProcessGroup {
    fn new(pgid: Option<u32>) -> Self {
        Self { pgid }
    }

    fn kill(&mut self) {
        let Some(pgid) = self.pgid.take() else {
            return;
        };

        #[cfg(unix)]
        {
            use nix::sys::signal::{killpg, Signal};
            use nix::unistd::Pid;

            if let Err(e) = killpg(Pid::from_raw(pgid as i32), Signal::SIGKILL) {
                debug!("killpg({}) failed: {}", pgid, e);
            }
        }

        #[cfg(not(unix))]
        let _ = pgid;
    }
}

impl Drop for ProcessGroup {
    fn drop(&mut self) {
        self.kill();
    }
}

#[async_trait]
impl MarkerCompiler for WorkerCompiler {
    fn name(&self) -> &str {
        "worker"
    }

    async fn compile(&self, image: Bytes) -> Result<CompiledMarker, CompileError> {
        self.run_job(image, None).await
    }

    async fn compile_with_progress(
        &self,
        image: Bytes,
        progress_tx: mpsc::Sender<CompileProgress>,
    ) -> Result<CompiledMarker, CompileError> {
        self.run_job(image, Some(progress_tx)).await
    }
}
