//! Video generation.
//!
//! A still image is turned into a short clip by a remote image-to-video
//! service. [`NovitaGenerator`] prepares the image, submits a task, polls it
//! to completion, downloads the result and hands it to the artifact store.

mod config;
mod error;
mod novita;
pub mod preprocess;
mod traits;
mod types;

pub use config::{PreprocessConfig, VideoConfig};
pub use error::GenerationError;
pub use novita::NovitaGenerator;
pub use traits::VideoGenerator;
pub use types::{GeneratedVideo, GenerationStatus};
