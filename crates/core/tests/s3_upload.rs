//! S3 store tests against an in-process S3-compatible endpoint.

use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Router;

use arnft_core::storage::{ArtifactKey, ArtifactStore, S3Config, S3Store};

#[derive(Debug, Clone)]
struct Received {
    method: Method,
    path: String,
    content_type: Option<String>,
    body: Vec<u8>,
}

type Shared = Arc<Mutex<Vec<Received>>>;

async fn record(
    State(state): State<Shared>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    state.lock().unwrap().push(Received {
        method,
        path: uri.path().to_string(),
        content_type: headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(String::from),
        body: body.to_vec(),
    });
    (StatusCode::OK, [("etag", "\"fake-etag\"")])
}

async fn start_endpoint() -> (String, Shared) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("http://{}", listener.local_addr().unwrap());
    let state: Shared = Arc::new(Mutex::new(Vec::new()));

    let app = Router::new().fallback(record).with_state(state.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (endpoint, state)
}

fn config(endpoint: &str) -> S3Config {
    S3Config {
        bucket: "ar-assets".to_string(),
        region: "us-east-1".to_string(),
        access_key_id: Some("AKIDTEST".to_string()),
        secret_access_key: Some("secret".to_string()),
        endpoint: Some(endpoint.to_string()),
        public_base_url: Some("https://cdn.example.com".to_string()),
    }
}

#[tokio::test]
async fn test_put_uploads_bytes_to_bucket_path() {
    let (endpoint, received) = start_endpoint().await;
    let store = S3Store::new(&config(&endpoint)).await.unwrap();
    let payload = Bytes::from(vec![7u8; 4096]);
    let key = ArtifactKey::fresh("video", "mp4");

    let stored = store.put(payload.clone(), &key, "video/mp4").await.unwrap();

    assert_eq!(stored.url, format!("https://cdn.example.com/{}", key));
    assert_eq!(stored.size_bytes, payload.len() as u64);

    let requests = received.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, Method::PUT);
    assert_eq!(request.path, format!("/ar-assets/{}", key));
    assert_eq!(request.content_type.as_deref(), Some("video/mp4"));
    // The body may be wrapped in aws-chunked framing with a trailing checksum.
    assert!(request
        .body
        .windows(payload.len())
        .any(|window| window == payload.as_ref()));
}
