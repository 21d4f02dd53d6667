//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock dependencies injected, so the HTTP surface can be exercised
//! without a worker program, the video API or a bucket.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use arnft_core::storage::{ArtifactStore, FsStore, LocalStoreConfig, StorageBackend};
use arnft_core::testing::{MockArtifactStore, MockMarkerCompiler, MockVideoGenerator};
use arnft_core::{Config, NftService};

/// Re-export fixtures for test convenience
pub use arnft_core::testing::fixtures;

const BOUNDARY: &str = "arnft-test-boundary";

/// Test fixture for API testing with mock dependencies.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_create_nft() {
///     let fixture = TestFixture::new();
///
///     let response = fixture
///         .post_multipart("/create-nft", &[Part::file("image", "cat.png", png)])
///         .await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock compiler - inject failures, count calls
    pub compiler: Arc<MockMarkerCompiler>,
    /// Mock generator - inject failures, count calls
    pub generator: Arc<MockVideoGenerator>,
    /// In-memory store (unused when local outputs are enabled)
    pub store: Arc<MockArtifactStore>,
    /// Directory served under /outputs (local outputs only)
    pub outputs_dir: Option<PathBuf>,
    /// Temporary directory for compiled markers and outputs
    pub temp_dir: TempDir,
}

/// Options for building a fixture
#[derive(Debug, Default)]
pub struct TestConfig {
    /// Store artifacts on disk and serve them under /outputs
    pub local_outputs: bool,
    /// Request body limit override
    pub max_upload_bytes: Option<usize>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub raw: Vec<u8>,
}

/// One part of a multipart form
pub struct Part {
    name: String,
    file_name: Option<String>,
    content_type: Option<String>,
    data: Vec<u8>,
}

impl Part {
    pub fn text(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            file_name: None,
            content_type: None,
            data: value.as_bytes().to_vec(),
        }
    }

    pub fn file(name: &str, file_name: &str, data: Vec<u8>) -> Self {
        Self {
            name: name.to_string(),
            file_name: Some(file_name.to_string()),
            content_type: Some("application/octet-stream".to_string()),
            data,
        }
    }
}

/// Encode parts as a multipart/form-data body
pub fn multipart_body(parts: &[Part]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        let disposition = match &part.file_name {
            Some(file_name) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                part.name, file_name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name),
        };
        body.extend_from_slice(disposition.as_bytes());
        if let Some(content_type) = &part.content_type {
            body.extend_from_slice(format!("Content-Type: {}\r\n", content_type).as_bytes());
        }
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(&part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

impl TestFixture {
    /// Create a new test fixture with default mocks.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config::default();
        config.video.api_key = "sk-test".to_string();
        if let Some(limit) = test_config.max_upload_bytes {
            config.server.max_upload_bytes = limit;
        }

        let memory_store = Arc::new(MockArtifactStore::new());
        let compiler = Arc::new(MockMarkerCompiler::new(temp_dir.path().join("markers")));

        let (store, outputs_dir): (Arc<dyn ArtifactStore>, Option<PathBuf>) =
            if test_config.local_outputs {
                let dir = temp_dir.path().join("outputs");
                let local = LocalStoreConfig::new(&dir, "http://localhost:3000/outputs");
                config.storage.backend = StorageBackend::Local;
                config.storage.local = local.clone();
                (Arc::new(FsStore::new(local)) as Arc<dyn ArtifactStore>, Some(dir))
            } else {
                config.storage.backend = StorageBackend::S3;
                config.storage.s3.bucket = "test-bucket".to_string();
                config.storage.s3.region = "us-east-1".to_string();
                (memory_store.clone() as Arc<dyn ArtifactStore>, None)
            };

        let generator = Arc::new(MockVideoGenerator::new().with_store(Arc::clone(&store)));
        let nft = NftService::new(compiler.clone(), generator.clone(), store);

        let state = Arc::new(arnft_server::state::AppState::new(config, Arc::new(nft)));
        let router = arnft_server::api::create_router(state);

        Self {
            router,
            compiler,
            generator,
            store: memory_store,
            outputs_dir,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with a multipart form body.
    pub async fn post_multipart(&self, path: &str, parts: &[Part]) -> TestResponse {
        self.post_raw(
            path,
            multipart_body(parts),
            &format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .await
    }

    /// Send a POST request with a raw body and content type.
    pub async fn post_raw(&self, path: &str, body: Vec<u8>, content_type: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let raw = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        let body = serde_json::from_slice(&raw).unwrap_or(Value::Null);

        TestResponse { status, body, raw }
    }
}
