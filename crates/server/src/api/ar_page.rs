//! AR page publishing endpoint.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use arnft_core::storage::{ArtifactKey, HTML_CONTENT_TYPE};

use super::error::{api_error, ApiError};
use crate::state::AppState;

const NO_HTML: &str = "No html content provided";
const STORE_FAILED: &str = "Failed to create AR page";

#[derive(Debug, Serialize)]
pub struct CreateArPageResponse {
    pub success: bool,
    pub url: String,
}

/// Reads the `html` field of the form. Blank content counts as missing.
async fn read_html(mut multipart: Multipart) -> Result<Option<String>, ApiError> {
    let mut html: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart body: {}", e);
                return Err(api_error(e.status(), e.body_text()));
            }
        };

        if field.name() != Some("html") {
            continue;
        }

        match field.text().await {
            Ok(text) => html = Some(text),
            Err(e) => {
                warn!("Failed to read html field: {}", e);
                return Err(api_error(e.status(), format!("Failed to read html: {}", e.body_text())));
            }
        }
    }

    Ok(html.filter(|text| !text.trim().is_empty()))
}

/// `POST /create-ar-page`: stores the `html` field as a standalone page.
pub async fn create_ar_page(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<CreateArPageResponse>, ApiError> {
    let multipart = multipart.map_err(|e| {
        warn!("Rejected create-ar-page request: {}", e);
        api_error(StatusCode::BAD_REQUEST, NO_HTML)
    })?;

    let html = read_html(multipart)
        .await?
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, NO_HTML))?;

    let key = ArtifactKey::parse(format!("ar-{}.html", Uuid::new_v4())).map_err(|e| {
        error!("Failed to build AR page key: {}", e);
        api_error(StatusCode::INTERNAL_SERVER_ERROR, STORE_FAILED)
    })?;

    match state.store().put(Bytes::from(html), &key, HTML_CONTENT_TYPE).await {
        Ok(stored) => {
            info!(key = %stored.key, "AR page created");
            Ok(Json(CreateArPageResponse {
                success: true,
                url: stored.url,
            }))
        }
        Err(e) => {
            error!("Failed to store AR page: {}", e);
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, STORE_FAILED))
        }
    }
}
