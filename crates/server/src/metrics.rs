//! Prometheus metrics for observability.
//!
//! This module provides HTTP request metrics for the server and registers the
//! core metrics (stages, workers, generation polling, uploads) in the same
//! registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use regex_lite::Regex;
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "arnft_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("arnft_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "arnft_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Core metrics (stages, workers, generation, storage)
    for metric in arnft_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!("Failed to encode metrics: {}", e);
    }
    String::from_utf8(buffer).unwrap_or_default()
}

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}")
        .unwrap()
});

static ARTIFACT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^/outputs/.+$").unwrap());

static NUMERIC_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/\d+(/|$)").unwrap());

/// Normalize a path for metric labels (replace artifact names and IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    if ARTIFACT_RE.is_match(path) {
        return "/outputs/{file}".to_string();
    }

    let result = UUID_RE.replace_all(path, "{id}");
    let result = NUMERIC_RE.replace_all(&result, "/{id}$1");
    result.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_artifact() {
        assert_eq!(
            normalize_path("/outputs/target_1718000000000_3f2a9c1d.mind"),
            "/outputs/{file}"
        );
        assert_eq!(
            normalize_path("/outputs/ar-550e8400-e29b-41d4-a716-446655440000.html"),
            "/outputs/{file}"
        );
    }

    #[test]
    fn test_normalize_path_uuid() {
        let path = "/pages/550e8400-e29b-41d4-a716-446655440000";
        assert_eq!(normalize_path(path), "/pages/{id}");
    }

    #[test]
    fn test_normalize_path_numeric() {
        assert_eq!(normalize_path("/jobs/12345"), "/jobs/{id}");
        assert_eq!(normalize_path("/jobs/12/steps/3"), "/jobs/{id}/steps/{id}");
    }

    #[test]
    fn test_normalize_path_no_ids() {
        assert_eq!(normalize_path("/create-nft"), "/create-nft");
        assert_eq!(normalize_path("/health"), "/health");
    }

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("arnft_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_registry_contains_core_metrics() {
        // Prometheus only outputs vectors that have at least one child
        arnft_core::metrics::STAGE_TOTAL
            .with_label_values(&["marker", "success"])
            .inc_by(0);
        arnft_core::metrics::WORKERS_SPAWNED.inc_by(0);
        arnft_core::metrics::POLL_ATTEMPTS.inc_by(0);
        HTTP_REQUESTS_IN_FLIGHT.set(0);

        let output = encode_metrics();

        assert!(output.contains("arnft_http_requests_in_flight"));
        assert!(output.contains("arnft_stage_total"));
        assert!(output.contains("arnft_workers_spawned_total"));
        assert!(output.contains("arnft_generation_poll_attempts_total"));
    }
}
