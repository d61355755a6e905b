//! Delta Force API gateway service.
//!
//! # Architecture Overview
//!
//! ```text
//!   plugin commands                     ┌────────────────────────────────┐
//!   ───────────────▶ ApiClient ────────▶│ default │ esa │ eo  (mirrors)  │
//!                     │    ▲            └────────────────────────────────┘
//!                     ▼    │ mark_failed / current
//!                EndpointSelector ◀──── admin API (status, mode, reset)
//!                     ▲
//!                     │ credential + mode
//!               config watcher (TOML, hot reload)
//! ```
//!
//! Runs the shared client with its operator surface: the admin API, an
//! optional Prometheus exporter and config hot reload.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use df_gateway::admin::{setup_admin_router, AdminState};
use df_gateway::client::ApiClient;
use df_gateway::config::watcher::ConfigWatcher;
use df_gateway::config::load_or_init;
use df_gateway::lifecycle::{shutdown_signal, ReloadApplier, Shutdown};
use df_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "df-gateway")]
#[command(about = "Delta Force API gateway", long_about = None)]
struct Args {
    /// Path to the TOML config file. Created with defaults if missing.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_or_init(&args.config)?;

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "df-gateway starting");

    tracing::info!(
        config = %args.config.display(),
        endpoints = config.endpoints.len(),
        mode = %config.api.mode,
        credential_configured = config.api.credential().is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let client = Arc::new(ApiClient::from_config(&config)?);
    let shutdown = Shutdown::new();

    let admin_task = if config.admin.enabled {
        let listener = TcpListener::bind(&config.admin.bind_address).await?;
        tracing::info!(address = %listener.local_addr()?, "Admin API listening");

        let app = setup_admin_router(AdminState::new(client.clone(), &config.admin.api_key));
        let stop = shutdown.wait();
        Some(tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).with_graceful_shutdown(stop).await {
                tracing::error!(error = %e, "Admin server failed");
            }
        }))
    } else {
        None
    };

    let (watcher, reloads) = ConfigWatcher::new(&args.config);
    // Dropping the notify handle stops watching.
    let _watch_handle = match watcher.run() {
        Ok(handle) => Some(handle),
        Err(e) => {
            tracing::warn!(error = %e, "Config hot reload disabled");
            None
        }
    };
    let reload_task = tokio::spawn(
        ReloadApplier::new(client.clone(), config).run(reloads, shutdown.clone()),
    );

    shutdown_signal().await;
    shutdown.trigger();

    if let Some(task) = admin_task {
        let _ = task.await;
    }
    let _ = reload_task.await;

    tracing::info!("Shutdown complete");
    Ok(())
}
