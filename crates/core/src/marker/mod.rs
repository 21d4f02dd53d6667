//! Marker compilation.
//!
//! Compiling an AR image-tracking marker is CPU heavy and delegated to an
//! external worker program. [`WorkerCompiler`] supervises one worker process
//! per job: it writes the uploaded image to a temporary file, spawns the
//! worker, forwards its progress and enforces a wall-clock timeout.
//!
//! # Worker protocol
//!
//! The worker receives the input image path and the output path as arguments
//! and writes newline-delimited JSON to stdout:
//!
//! ```text
//! {"type":"progress","progress":42.5}
//! {"type":"progress","progress":87.0}
//! {"type":"complete","success":true,"path":"markers/target_1718000000000_3f2a9c1d.mind"}
//! ```
//!
//! or, on failure, `{"type":"complete","success":false,"message":"..."}`.
//! The default worker is `worker/compile-worker.mjs` at the repository root,
//! a Node script around mind-ar's offline compiler (`npm install` in
//! `worker/` before first use).
//! The first `complete` message settles the job. A worker that exits without
//! one is reported as [`CompileError::WorkerCrashed`].
//!
//! # Example
//!
//! ```ignore
//! use arnft_core::marker::{MarkerCompiler, MarkerConfig, WorkerCompiler};
//!
//! let compiler = WorkerCompiler::new(MarkerConfig::default());
//! let marker = compiler.compile(image_bytes).await?;
//! println!("Marker written to {:?}", marker.path);
//! ```

mod config;
mod error;
mod traits;
mod types;
mod worker;

pub use config::{MarkerConfig, WorkerCommand};
pub use error::CompileError;
pub use traits::MarkerCompiler;
pub use types::{CompileProgress, CompileState, CompiledMarker, ProgressTracker, WorkerMessage};
pub use worker::WorkerCompiler;
