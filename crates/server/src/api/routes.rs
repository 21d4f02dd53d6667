use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use tracing::warn;

use super::{ar_page, handlers, middleware::metrics_middleware, nft};
use crate::state::AppState;

/// Builds the CORS layer for a comma separated origin list, `*` for any.
fn cors_layer(origins: &str) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.trim() == "*" {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(allowed))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let server = &state.config().server;
    let cors = cors_layer(&server.cors_origin);
    let body_limit = server.max_upload_bytes;
    let outputs_dir = state.outputs_dir().map(|dir| dir.to_path_buf());

    let mut app = Router::new()
        // Health and metrics
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        // Asset creation
        .route("/create-nft", post(nft::create_nft))
        .route("/create-ar-page", post(ar_page::create_ar_page))
        .with_state(state);

    // Locally stored artifacts are served by this process
    if let Some(dir) = outputs_dir {
        app = app.nest_service("/outputs", ServeDir::new(dir));
    }

    app.layer(middleware::from_fn(metrics_middleware))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
