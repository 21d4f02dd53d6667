//! NFT asset creation endpoint.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::error::{api_error, ApiError};
use crate::state::AppState;

const NO_IMAGE: &str = "No image file provided";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNftResponse {
    pub success: bool,
    pub marker_url: String,
    pub video_url: String,
}

/// Reads the `image` field of the form. Other fields are ignored.
async fn read_image(mut multipart: Multipart) -> Result<Option<Bytes>, ApiError> {
    let mut image: Option<Bytes> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                return Err(api_error(e.status(), e.body_text()));
            }
        };

        if field.name() != Some("image") {
            continue;
        }

        match field.bytes().await {
            Ok(bytes) => image = Some(bytes),
            Err(e) => {
                warn!("Failed to read image field: {}", e);
                return Err(api_error(e.status(), format!("Failed to read image: {}", e.body_text())));
            }
        }
    }

    Ok(image.filter(|bytes| !bytes.is_empty()))
}

/// `POST /create-nft`: compiles a marker and generates a video for the uploaded image.
pub async fn create_nft(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CreateNftResponse>, ApiError> {
    let multipart = multipart.map_err(|e| {
        warn!("Rejected create-nft request: {}", e);
        api_error(StatusCode::BAD_REQUEST, NO_IMAGE)
    })?;

    let image = read_image(multipart)
        .await?
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, NO_IMAGE))?;

    info!("Received image ({} bytes)", image.len());

    match state.nft().create_nft(image).await {
        Ok(artifacts) => Ok(Json(CreateNftResponse {
            success: true,
            marker_url: artifacts.marker_url,
            video_url: artifacts.video_url,
        })),
        Err(e) if e.is_client_error() => Err(api_error(StatusCode::BAD_REQUEST, e.to_string())),
        Err(e) => {
            error!(stage = e.stage(), "NFT creation failed: {}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
