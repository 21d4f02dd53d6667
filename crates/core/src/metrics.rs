//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - The NFT sequencer (per-stage outcomes and durations)
//! - Marker compilation workers
//! - Video generation polling
//! - Artifact uploads

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Sequencer Metrics
// =============================================================================

/// Stage executions by stage and result.
pub static STAGE_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("arnft_stage_total", "Total stage executions"),
        &["stage", "result"], // stage: "marker", "marker_upload", "video"; result: "success", "failed"
    )
    .unwrap()
});

/// Stage duration in seconds.
pub static STAGE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("arnft_stage_duration_seconds", "Duration of each stage")
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 120.0, 300.0, 600.0]),
        &["stage"],
    )
    .unwrap()
});

/// Requests that produced both artifacts.
pub static NFTS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "arnft_nfts_created_total",
        "Total requests that produced a marker and a video",
    )
    .unwrap()
});

// =============================================================================
// Compilation Worker Metrics
// =============================================================================

/// Worker processes spawned.
pub static WORKERS_SPAWNED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "arnft_workers_spawned_total",
        "Total compilation worker processes spawned",
    )
    .unwrap()
});

/// Worker outcomes.
pub static WORKER_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("arnft_worker_outcomes_total", "Compilation worker outcomes"),
        &["outcome"], // "success", "failed", "crashed", "timed_out"
    )
    .unwrap()
});

// =============================================================================
// Video Generation Metrics
// =============================================================================

/// Status checks sent to the generation service.
pub static POLL_ATTEMPTS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "arnft_generation_poll_attempts_total",
        "Total video generation status checks",
    )
    .unwrap()
});

/// Generation outcomes.
pub static GENERATION_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "arnft_generation_outcomes_total",
            "Video generation outcomes",
        ),
        &["outcome"], // "success", "submission_failed", "failed", "timed_out", "error"
    )
    .unwrap()
});

// =============================================================================
// Storage Metrics
// =============================================================================

/// Uploads by backend and result.
pub static UPLOADS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("arnft_uploads_total", "Total artifact uploads"),
        &["backend", "result"],
    )
    .unwrap()
});

/// Bytes uploaded.
pub static UPLOAD_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("arnft_upload_bytes_total", "Total artifact bytes uploaded").unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Sequencer
        Box::new(STAGE_TOTAL.clone()),
        Box::new(STAGE_DURATION.clone()),
        Box::new(NFTS_CREATED.clone()),
        // Workers
        Box::new(WORKERS_SPAWNED.clone()),
        Box::new(WORKER_OUTCOMES.clone()),
        // Generation
        Box::new(POLL_ATTEMPTS.clone()),
        Box::new(GENERATION_OUTCOMES.clone()),
        // Storage
        Box::new(UPLOADS_TOTAL.clone()),
        Box::new(UPLOAD_BYTES.clone()),
    ]
}
