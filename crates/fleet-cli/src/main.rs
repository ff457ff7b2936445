//! fleet-cli - Command-line tool for the device fleet manager
//!
//! Talks to a running `fleetd` over its REST API.

mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fleet_client::FleetClient;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::Config;
use crate::output::{OutputContext, OutputFormat};

#[derive(Parser)]
#[command(name = "fleet-cli")]
#[command(author, version, about = "Device Fleet Manager CLI")]
#[command(propagate_version = true)]
struct Cli {
    /// Server URL [default: http://localhost:50051]
    #[arg(short, long, env = "FLEET_SERVER")]
    server: Option<String>,

    /// Configuration file path
    #[arg(short, long, env = "FLEET_CONFIG")]
    config: Option<PathBuf>,

    /// Output format [default: table]
    #[arg(short, long, value_enum)]
    output: Option<OutputFormat>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Minimal output (for scripting)
    #[arg(short, long)]
    quiet: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all registered devices
    List,

    /// Register a new device
    Register {
        /// Device ID
        id: String,

        /// Display name
        #[arg(long)]
        name: Option<String>,

        /// Device type (e.g. sensor, gateway)
        #[arg(long = "type")]
        device_type: Option<String>,

        /// Initial status (defaults to IDLE)
        #[arg(long)]
        status: Option<String>,
    },

    /// Set a device's status
    SetStatus {
        /// Device ID
        id: String,

        /// New status (IDLE, BUSY, OFFLINE, MAINTENANCE, UPDATING, ERROR, UNKNOWN)
        status: String,
    },

    /// Show device details
    Info {
        /// Device ID
        id: String,
    },

    /// List actions started on a device
    History {
        /// Device ID
        id: String,
    },

    /// Initiate an action on a device
    Run {
        /// Device ID
        id: String,

        /// Action type (SOFTWARE_UPDATE, SYSTEM_REBOOT, CONFIGURATION_CHANGE, FIRMWARE_UPDATE)
        #[arg(value_name = "TYPE")]
        action_type: String,

        /// Action parameter, repeatable
        #[arg(short, long = "param", value_name = "KEY=VALUE", value_parser = commands::parse_param)]
        params: Vec<(String, String)>,
    },

    /// Show action status
    Action {
        /// Action ID
        action_id: String,
    },

    /// Poll an action until it completes
    Poll {
        /// Action ID
        action_id: String,

        /// Seconds between polls
        #[arg(long, default_value = "2.0")]
        interval: f64,
    },

    /// Stream action events as they happen
    Watch {
        /// Only show events for this device
        #[arg(long)]
        device: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();

    // Load config file
    let config = if let Some(config_path) = &cli.config {
        Config::load_from(config_path)?
    } else {
        Config::load().unwrap_or_default()
    };

    // Merge CLI args with config
    let merged = config.merge_with_args(cli.server.as_deref(), cli.output, cli.no_color);
    debug!(server = %merged.server, output = ?merged.output, "Resolved CLI configuration");

    let ctx = OutputContext::new(merged.output, merged.no_color, cli.quiet);
    let client = create_client(&merged.server)?;

    match &cli.command {
        Commands::List => {
            commands::list(&client, &ctx).await?;
        }

        Commands::Register {
            id,
            name,
            device_type,
            status,
        } => {
            commands::register(
                &client,
                id,
                name.as_deref(),
                device_type.as_deref(),
                status.as_deref(),
                &ctx,
            )
            .await?;
        }

        Commands::SetStatus { id, status } => {
            commands::set_status(&client, id, status, &ctx).await?;
        }

        Commands::Info { id } => {
            commands::info(&client, id, &ctx).await?;
        }

        Commands::History { id } => {
            commands::history(&client, id, &ctx).await?;
        }

        Commands::Run {
            id,
            action_type,
            params,
        } => {
            commands::run(&client, id, action_type, params, &ctx).await?;
        }

        Commands::Action { action_id } => {
            commands::action(&client, action_id, &ctx).await?;
        }

        Commands::Poll {
            action_id,
            interval,
        } => {
            let interval = Duration::try_from_secs_f64(*interval)
                .context("Poll interval must be a non-negative number of seconds")?;
            commands::poll(&client, action_id, interval, &ctx).await?;
        }

        Commands::Watch { device } => {
            commands::watch(&client, device.as_deref(), &ctx).await?;
        }
    }

    Ok(())
}

fn create_client(server: &str) -> Result<FleetClient> {
    FleetClient::new(server).with_context(|| format!("Failed to create client for {}", server))
}
