use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use seedcrawl_core::{
    load_config, validate_config, EztvClient, IdentifierProvider, Scraper, SqliteCatalog,
    TorrentSource, TorrentStore,
};
use seedcrawl_server::api::create_router;
use seedcrawl_server::scheduler::ScrapeScheduler;
use seedcrawl_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Determine config path
    let config_path = std::env::var("SEEDCRAWL_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    // Load configuration
    info!("Loading configuration from {:?}", config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    // Validate configuration
    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        version = VERSION,
        config_hash = &config_hash[..16],
        "Configuration loaded successfully"
    );
    info!("Database path: {:?}", config.database.path);

    // Open the catalog (torrents + provider watermarks)
    let catalog = Arc::new(
        SqliteCatalog::new(&config.database.path).context("Failed to open torrent catalog")?,
    );
    info!("Torrent catalog initialized");

    // Create the listing source
    let source: Arc<dyn TorrentSource> = Arc::new(
        EztvClient::new(config.source.clone()).context("Failed to create EZTV client")?,
    );
    info!("Using EZTV source at {}", config.source.url);

    let store: Arc<dyn TorrentStore> = catalog.clone();
    let identifiers: Arc<dyn IdentifierProvider> = catalog;
    let scraper = Arc::new(Scraper::new(
        config.scraper.clone(),
        source,
        Arc::clone(&store),
        identifiers,
    ));

    // Start scheduled scraping
    let scheduler = ScrapeScheduler::new(Arc::clone(&scraper));
    scheduler.start().await;

    // Create app state
    let state = Arc::new(AppState::new(config.clone(), store, scraper));

    // Create router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutting down...");
    scheduler.stop().await;

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
}
