//! # Ledger POS API Server
//!
//! REST server for the POS transaction engine.
//!
//! ## Startup Sequence
//! ```text
//! tracing init ──► config from env ──► DB pool + migrations ──► axum serve
//! ```

use std::net::SocketAddr;

use tracing::info;
use tracing_subscriber::EnvFilter;

use pos_db::{Database, DbConfig};
use pos_server::config::ServerConfig;
use pos_server::{app, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; RUST_LOG overrides the default level
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("Starting Ledger POS API server...");

    // Load configuration
    let config = ServerConfig::load()?;
    info!(
        port = config.http_port,
        database = %config.database_path,
        "Configuration loaded"
    );

    // Connect to database (runs migrations)
    let db = Database::new(DbConfig::new(&config.database_path)).await?;
    info!("Database ready");

    let addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let state = AppState::new(db.clone(), config);
    let router = app(state);

    info!(%addr, "Starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
