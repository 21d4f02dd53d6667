//! Configuration for the storage module.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Storage configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend receives artifacts.
    #[serde(default)]
    pub backend: StorageBackend,

    /// S3 settings (required when backend = "s3").
    #[serde(default)]
    pub s3: S3Config,

    /// Local directory settings (used when backend = "local").
    #[serde(default)]
    pub local: LocalStoreConfig,
}

/// Available storage backends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    S3,
    #[default]
    Local,
}

/// S3 bucket configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket name (`AWS_BUCKET_NAME`).
    #[serde(default)]
    pub bucket: String,

    /// Bucket region (`AWS_REGION`).
    #[serde(default)]
    pub region: String,

    /// Access key id (`AWS_ACCESS_KEY_ID`). Falls back to the default AWS
    /// credential chain when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    /// Secret access key (`AWS_SECRET_ACCESS_KEY`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    /// Custom endpoint for S3-compatible services. Enables path-style addressing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Base URL used to build public object URLs.
    /// Defaults to `https://{bucket}.s3.{region}.amazonaws.com`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_base_url: Option<String>,
}

/// Local directory store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStoreConfig {
    /// Directory artifacts are written to.
    #[serde(default = "default_local_dir")]
    pub dir: PathBuf,

    /// Base URL under which `dir` is reachable.
    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("outputs")
}

fn default_public_base_url() -> String {
    "http://localhost:3000/outputs".to_string()
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            dir: default_local_dir(),
            public_base_url: default_public_base_url(),
        }
    }
}

impl LocalStoreConfig {
    /// Creates a config rooted at `dir`.
    pub fn new(dir: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            public_base_url: public_base_url.into(),
        }
    }
}
