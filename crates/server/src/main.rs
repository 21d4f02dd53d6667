use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use arnft_core::{
    create_store, load_config, load_config_from_env, validate_config, Config, NftService,
    NovitaGenerator, SanitizedConfig, WorkerCompiler,
};
use arnft_server::{api::create_router, metrics::REGISTRY, state::AppState};

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Config file used when `ARNFT_CONFIG` is not set
const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging() {
    let json = std::env::var("ARNFT_LOG_FORMAT")
        .map(|format| format.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}

/// Loads the config file named by `ARNFT_CONFIG`, or `config.toml` when it
/// exists, or the environment alone.
fn load() -> Result<Config> {
    match std::env::var("ARNFT_CONFIG") {
        Ok(path) => {
            let path = PathBuf::from(path);
            info!("Loading configuration from {:?}", path);
            load_config(&path).with_context(|| format!("Failed to load config from {:?}", path))
        }
        Err(_) => {
            let path = PathBuf::from(DEFAULT_CONFIG_PATH);
            if path.exists() {
                info!("Loading configuration from {:?}", path);
                load_config(&path)
                    .with_context(|| format!("Failed to load config from {:?}", path))
            } else {
                info!("No config file, using environment only");
                load_config_from_env().context("Failed to load config from environment")
            }
        }
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    init_logging();

    // Load and validate configuration
    let config = load()?;
    validate_config(&config).context("Configuration validation failed")?;

    let sanitized = serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(sanitized.as_bytes()));
    info!(
        "Configuration loaded successfully (hash {})",
        &config_hash[..16]
    );
    info!("Effective configuration: {}", sanitized);

    // Register metrics before the first request
    once_cell::sync::Lazy::force(&REGISTRY);

    // Build services
    let store = create_store(&config.storage)
        .await
        .context("Failed to initialize artifact store")?;
    info!("Using artifact store: {}", store.name());

    let compiler = WorkerCompiler::new(config.marker.clone());
    info!(
        "Marker worker: {:?} (timeout {}s, {} parallel jobs)",
        config.marker.worker.program, config.marker.timeout_secs, config.marker.max_parallel_jobs
    );

    let generator = NovitaGenerator::new(config.video.clone(), Arc::clone(&store))
        .context("Failed to create video generator")?;
    info!("Video generator: {}", config.video.base_url);

    let nft = NftService::new(Arc::new(compiler), Arc::new(generator), store);

    // Create app state and router
    let state = Arc::new(AppState::new(config.clone(), Arc::new(nft)));
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting arnft {} on {}", VERSION, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
