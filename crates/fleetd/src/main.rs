//! fleetd - Device Fleet Manager Daemon
//!
//! Serves the fleet REST API over an in-memory device registry and action
//! simulator.
//!
//! Usage:
//!   fleetd [OPTIONS] [config.toml]
//!
//! Without a config file the server starts with no devices on 0.0.0.0:50051.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use fleet_api::AppState;
use fleet_core::FleetService;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::DaemonConfig;

#[derive(Parser, Debug)]
#[command(name = "fleetd")]
#[command(about = "Device fleet manager daemon")]
#[command(version)]
struct Args {
    /// Configuration file path (TOML format)
    config: Option<PathBuf>,

    /// Listen port, overrides [server].port
    #[arg(short, long)]
    port: Option<u16>,

    /// Listen address, overrides [server].bind
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleetd=info,fleet_api=info,fleet_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    tracing::info!("Starting fleetd (Device Fleet Manager Daemon)");

    let mut config = match args.config {
        Some(ref path) => {
            tracing::info!("Loading config from: {}", path.display());
            DaemonConfig::load(path)?
        }
        None => {
            tracing::info!("No config file provided, using defaults");
            DaemonConfig::default()
        }
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let service =
        FleetService::from_config(config.simulator.clone()).context("Invalid simulator config")?;
    for entry in config.devices {
        let id = entry.id.clone();
        service
            .register_device(entry.into())
            .with_context(|| format!("Failed to register configured device '{}'", id))?;
    }
    tracing::info!(
        devices = service.registry().len(),
        min_duration_secs = config.simulator.min_duration_secs,
        max_duration_secs = config.simulator.max_duration_secs,
        success_rate = config.simulator.success_rate,
        "Fleet state initialised"
    );

    let state = AppState::new(Arc::new(service));

    let addr = config.server.socket_addr()?;
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    fleet_api::serve(listener, state, shutdown_signal()).await?;

    tracing::info!("fleetd stopped");

    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
