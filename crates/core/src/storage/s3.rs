//! S3 artifact store.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::{debug, error};

use super::config::S3Config;
use super::error::StorageError;
use super::traits::ArtifactStore;
use super::types::{ArtifactKey, StoredArtifact};
use crate::metrics::{UPLOADS_TOTAL, UPLOAD_BYTES};

/// Stores artifacts in an S3 bucket and returns their public URLs.
///
/// Credentials are configured once; the client is cheap to share between
/// concurrent requests.
pub struct S3Store {
    client: Client,
    bucket: String,
    public_base_url: String,
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store")
            .field("bucket", &self.bucket)
            .field("public_base_url", &self.public_base_url)
            .finish_non_exhaustive()
    }
}

impl S3Store {
    /// Creates a store from configuration.
    pub async fn new(config: &S3Config) -> Result<Self, StorageError> {
        if config.bucket.is_empty() {
            return Err(StorageError::NotConfigured(
                "S3 bucket name is required".to_string(),
            ));
        }
        if config.region.is_empty() {
            return Err(StorageError::NotConfigured(
                "S3 region is required".to_string(),
            ));
        }

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(access_key), Some(secret_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key.clone(),
                secret_key.clone(),
                None,
                None,
                "arnft-config",
            ));
        }

        let shared = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint.clone()).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
            public_base_url: public_base_url(config),
        })
    }

    fn url_for(&self, key: &ArtifactKey) -> String {
        format!("{}/{}", self.public_base_url, key)
    }
}

fn public_base_url(config: &S3Config) -> String {
    match &config.public_base_url {
        Some(url) => url.trim_end_matches('/').to_string(),
        None => format!(
            "https://{}.s3.{}.amazonaws.com",
            config.bucket, config.region
        ),
    }
}

#[async_trait]
impl ArtifactStore for S3Store {
    fn name(&self) -> &str {
        "s3"
    }

    async fn put(
        &self,
        bytes: Bytes,
        key: &ArtifactKey,
        content_type: &str,
    ) -> Result<StoredArtifact, StorageError> {
        let size_bytes = bytes.len() as u64;

        let result = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await;

        if let Err(e) = result {
            UPLOADS_TOTAL.with_label_values(&["s3", "failed"]).inc();
            let reason = DisplayErrorContext(&e).to_string();
            error!("S3 upload of {} failed: {}", key, reason);
            return Err(StorageError::upload_failed(key.as_str(), reason));
        }

        UPLOADS_TOTAL.with_label_values(&["s3", "success"]).inc();
        UPLOAD_BYTES.inc_by(size_bytes);
        debug!("Uploaded {} ({} bytes) to bucket {}", key, size_bytes, self.bucket);

        Ok(StoredArtifact {
            key: key.clone(),
            url: self.url_for(key),
            size_bytes,
            content_type: content_type.to_string(),
        })
    }

    async fn delete(&self, key: &ArtifactKey) -> Result<(), StorageError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|e| {
                StorageError::delete_failed(key.as_str(), DisplayErrorContext(&e).to_string())
            })?;
        Ok(())
    }
}
