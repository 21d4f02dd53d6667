use super::{types::Config, ConfigError};
use crate::storage::StorageBackend;

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError(message.into())
}

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Marker timeout and parallelism are positive
/// - Video polling budget, JPEG quality and API key
/// - S3 bucket and region when the S3 backend is selected
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    // Server validation
    if config.server.port == 0 {
        return Err(invalid("server.port cannot be 0"));
    }

    // Marker validation
    let marker = &config.marker;
    if marker.timeout_secs == 0 {
        return Err(invalid("marker.timeout_secs must be greater than 0"));
    }
    if marker.max_parallel_jobs == 0 {
        return Err(invalid("marker.max_parallel_jobs must be greater than 0"));
    }
    if marker.worker.program.as_os_str().is_empty() {
        return Err(invalid("marker.worker.program cannot be empty"));
    }

    // Video validation
    let video = &config.video;
    if video.api_key.is_empty() {
        return Err(invalid(
            "video.api_key is required (set NOVITA_API_KEY or ARNFT_VIDEO__API_KEY)",
        ));
    }
    if video.max_attempts == 0 {
        return Err(invalid("video.max_attempts must be greater than 0"));
    }
    if video.poll_interval_ms == 0 {
        return Err(invalid("video.poll_interval_ms must be greater than 0"));
    }
    if !(1..=100).contains(&video.preprocess.jpeg_quality) {
        return Err(invalid("video.preprocess.jpeg_quality must be between 1 and 100"));
    }
    if video.preprocess.target_size == 0 {
        return Err(invalid("video.preprocess.target_size must be greater than 0"));
    }

    // Storage validation
    match config.storage.backend {
        StorageBackend::S3 => {
            if config.storage.s3.bucket.is_empty() {
                return Err(invalid(
                    "storage.s3.bucket is required when backend = \"s3\"",
                ));
            }
            if config.storage.s3.region.is_empty() {
                return Err(invalid(
                    "storage.s3.region is required when backend = \"s3\"",
                ));
            }
            if config.storage.s3.access_key_id.is_some()
                != config.storage.s3.secret_access_key.is_some()
            {
                return Err(invalid(
                    "storage.s3.access_key_id and storage.s3.secret_access_key must be set together",
                ));
            }
        }
        StorageBackend::Local => {
            if config.storage.local.public_base_url.is_empty() {
                return Err(invalid("storage.local.public_base_url cannot be empty"));
            }
        }
    }

    Ok(())
}
