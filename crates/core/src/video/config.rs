//! Configuration for the video module.

use serde::{Deserialize, Serialize};

/// Configuration for the Novita image-to-video client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConfig {
    /// Novita API key, sent as a bearer token.
    #[serde(default)]
    pub api_key: String,

    /// API base URL.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for generation.
    #[serde(default = "default_model_name")]
    pub model_name: String,

    /// Number of frames to generate.
    #[serde(default = "default_frames_num")]
    pub frames_num: u32,

    /// Output frame rate.
    #[serde(default = "default_frames_per_second")]
    pub frames_per_second: u32,

    /// Diffusion steps.
    #[serde(default = "default_steps")]
    pub steps: u32,

    /// Whether the service interpolates extra frames.
    #[serde(default = "default_true")]
    pub enable_frame_interpolation: bool,

    /// How the service fits the image to the model's aspect ratio.
    #[serde(default = "default_resize_mode")]
    pub resize_mode: String,

    /// Delay between status checks in milliseconds.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    /// Maximum number of status checks before giving up.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Timeout for a single HTTP request in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Image preparation before submission.
    #[serde(default)]
    pub preprocess: PreprocessConfig,
}

/// How the source image is prepared for the generation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Width and height of the square image sent to the service.
    #[serde(default = "default_target_size")]
    pub target_size: u32,

    /// Initial JPEG quality (1-100).
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Largest accepted encoded image.
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
}

fn default_base_url() -> String {
    "https://api.novita.ai".to_string()
}

fn default_model_name() -> String {
    "SVD-XT".to_string()
}

fn default_frames_num() -> u32 {
    25
}

fn default_frames_per_second() -> u32 {
    6
}

fn default_steps() -> u32 {
    20
}

fn default_true() -> bool {
    true
}

fn default_resize_mode() -> String {
    "CROP_TO_ASPECT_RATIO".to_string()
}

fn default_poll_interval() -> u64 {
    4000
}

fn default_max_attempts() -> u32 {
    90 // 6 minutes at the default interval
}

fn default_request_timeout() -> u64 {
    60
}

fn default_target_size() -> u32 {
    512
}

fn default_jpeg_quality() -> u8 {
    90
}

fn default_max_image_bytes() -> usize {
    1024 * 1024
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model_name: default_model_name(),
            frames_num: default_frames_num(),
            frames_per_second: default_frames_per_second(),
            steps: default_steps(),
            enable_frame_interpolation: default_true(),
            resize_mode: default_resize_mode(),
            poll_interval_ms: default_poll_interval(),
            max_attempts: default_max_attempts(),
            request_timeout_secs: default_request_timeout(),
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            target_size: default_target_size(),
            jpeg_quality: default_jpeg_quality(),
            max_image_bytes: default_max_image_bytes(),
        }
    }
}

impl VideoConfig {
    /// Creates a config for `base_url` using `api_key`.
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Sets the polling schedule.
    pub fn with_polling(mut self, poll_interval_ms: u64, max_attempts: u32) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self.max_attempts = max_attempts;
        self
    }

    /// Returns the base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}
