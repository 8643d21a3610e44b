//! kelvin - a HAPI time-series data server
//!
//! This is the main entry point for the kelvin application.

use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use kelvin::{handlers, AppState, Config, KelvinError, Result};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let (config, home) = Config::load().map_err(|e| {
        eprintln!("Configuration error: {e}");
        e
    })?;

    // Validate configuration
    config.validate().map_err(|e| {
        eprintln!("Invalid configuration: {e}");
        e
    })?;

    kelvin::init_tracing(&config.log_level);

    info!("Starting kelvin v{}", env!("CARGO_PKG_VERSION"));
    info!(home = %home.display(), backend = %config.hapi.backend, "Loading HAPI home");

    // Read the protocol version and select the backend
    let app_state = AppState::new(config.clone(), home).map_err(|e| {
        error!("Failed to initialize HAPI home: {}", e);
        e
    })?;

    info!(version = %app_state.version, "Serving HAPI protocol version");

    // Wrap in Arc for sharing
    let state = Arc::new(app_state);

    // Build the router; everything goes through the path-normalizing
    // dispatcher so tag-prefixed paths resolve too
    let app = Router::new()
        .fallback(handlers::dispatch)
        .layer(CorsLayer::permissive())
        .layer(kelvin::create_http_trace_layer())
        .with_state(state);

    // Create the server address
    let addr = SocketAddr::from((
        config
            .server
            .host
            .parse::<std::net::IpAddr>()
            .map_err(|e| KelvinError::Config {
                message: format!("Invalid host address: {}", e),
            })?,
        config.server.port,
    ));

    info!("Server listening on http://{}", addr);

    // Start the server
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| KelvinError::Server {
            message: format!("Failed to bind to address: {}", e),
        })?;

    // Set up graceful shutdown
    let shutdown_future = shutdown_signal();

    info!("Server is ready to accept connections");

    // Start the server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_future)
        .await
        .map_err(|e| KelvinError::Server {
            message: format!("Server error: {}", e),
        })?;

    info!("Server has been gracefully shut down");
    Ok(())
}

/// Wait for a shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
