//! # Challenge Platform Server
//!
//! Standalone HTTP server for command dispatch and status polling.
//!
//! ## Usage
//!
//! ```bash
//! # Run with configuration from ./config
//! cargo run --bin platform-server
//!
//! # Run with a specific environment and config directory
//! PLATFORM_ENV=production PLATFORM_CONFIG_DIR=/etc/platform cargo run --bin platform-server
//! ```

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use challenge_platform::config::ConfigManager;
use challenge_platform::logging::init_structured_logging;
use challenge_platform::web::{create_app, AppState};
use challenge_platform::PlatformContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_manager = ConfigManager::load().context("failed to load configuration")?;
    init_structured_logging(
        &config_manager.config().logging,
        config_manager.environment(),
    );

    info!("🚀 Starting Challenge Platform Server...");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));
    info!("   Environment: {}", config_manager.environment());

    // The broker must be reachable at startup; there is no lazy reconnect here.
    let context = match PlatformContext::init(Arc::clone(&config_manager)).await {
        Ok(context) => Arc::new(context),
        Err(e) => {
            error!(error = %e, "❌ Failed to initialize platform context");
            return Err(e).context("platform context initialization failed");
        }
    };

    let bind_address = config_manager.config().web.bind_address.clone();
    let app = create_app(AppState::new(Arc::clone(&context)));
    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;

    info!(bind_address = %bind_address, "🎉 Server listening, press Ctrl+C to shut down");

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("🛑 Shutdown signal received, closing connections...");
    if let Err(e) = context.shutdown().await {
        warn!(error = %e, "Platform context did not shut down cleanly");
    }

    served.context("HTTP server error")?;
    info!("👋 Challenge Platform Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}
