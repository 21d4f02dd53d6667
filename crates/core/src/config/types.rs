use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::marker::MarkerConfig;
use crate::storage::{StorageBackend, StorageConfig};
use crate::video::VideoConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub marker: MarkerConfig,
    #[serde(default)]
    pub video: VideoConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origin, `*` for any.
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
    /// Largest accepted request body.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    3000
}

fn default_cors_origin() -> String {
    "*".to_string()
}

fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}

/// Sanitized config for logging (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub marker: MarkerConfig,
    pub video: SanitizedVideoConfig,
    pub storage: SanitizedStorageConfig,
}

/// Sanitized video config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedVideoConfig {
    pub base_url: String,
    pub model_name: String,
    pub api_key_configured: bool,
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
}

/// Sanitized storage config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedStorageConfig {
    pub backend: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    pub credentials_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local_dir: Option<PathBuf>,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let storage = &config.storage;
        let storage = match storage.backend {
            StorageBackend::S3 => SanitizedStorageConfig {
                backend: "s3".to_string(),
                bucket: Some(storage.s3.bucket.clone()),
                region: Some(storage.s3.region.clone()),
                endpoint: storage.s3.endpoint.clone(),
                credentials_configured: storage.s3.access_key_id.is_some()
                    && storage.s3.secret_access_key.is_some(),
                local_dir: None,
            },
            StorageBackend::Local => SanitizedStorageConfig {
                backend: "local".to_string(),
                bucket: None,
                region: None,
                endpoint: None,
                credentials_configured: false,
                local_dir: Some(storage.local.dir.clone()),
            },
        };

        Self {
            server: config.server.clone(),
            marker: config.marker.clone(),
            video: SanitizedVideoConfig {
                base_url: config.video.base_url.clone(),
                model_name: config.video.model_name.clone(),
                api_key_configured: !config.video.api_key.is_empty(),
                poll_interval_ms: config.video.poll_interval_ms,
                max_attempts: config.video.max_attempts,
            },
            storage,
        }
    }
}
