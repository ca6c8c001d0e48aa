//! ==============================================================================
//! main.rs - sensor hub entry point
//! ==============================================================================
//!
//! purpose:
//!     the hub a sensor device pushes its readings to. each push is parsed,
//!     stamped with the server clock and appended to a csv log; the newest
//!     row is served back to the dashboard.
//!
//! responsibilities:
//!     - load .env, configuration and logging
//!     - create the store file (header only) if it is missing
//!     - serve the http api until ctrl-c / sigterm
//!
//! relationships:
//!     - uses: config.rs (sensor-hub.toml + SENSOR_HUB_* overrides)
//!     - uses: routes.rs (router and handlers)
//!     - uses: store.rs (via AppState)
//!
//! architecture:
//!
//!     ┌──────────┐  GET /api/upload   ┌────────────┐   append   ┌──────────────┐
//!     │  device  │ ─────────────────▶ │            │ ─────────▶ │              │
//!     └──────────┘                    │ axum hub   │            │ sensor_data  │
//!     ┌──────────┐  GET /data         │ (port 5000)│   read     │    .csv      │
//!     │ browser  │ ◀───────────────── │            │ ◀───────── │              │
//!     └──────────┘                    └────────────┘            └──────────────┘
//!
//! ==============================================================================

use anyhow::{Context, Result};
use tokio::signal;
use tracing::info;

use sensor_hub::{create_app, AppState, TelemetryConfig};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // step 1: load configuration
    let config = TelemetryConfig::load_or_default()?;

    // step 2: logging
    sensor_hub::logging::init_tracing(&config.logging.level)?;
    config.log_summary();

    // step 3: open the store, writing the header on first start
    let state = AppState::new(&config).context("Failed to initialize sensor store")?;
    info!(path = %state.store.path().display(), "sensor store ready");

    // step 4: serve
    let listener = tokio::net::TcpListener::bind(config.server.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind_addr()))?;
    info!(addr = %config.server.bind_addr(), "dashboard live");

    axum::serve(listener, create_app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install sigterm handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("signal received, starting graceful shutdown");
}
