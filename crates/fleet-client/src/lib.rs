//! Fleet Client Library
//!
//! Provides a typed HTTP client for the device fleet manager API.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::collections::BTreeMap;
//! use std::time::Duration;
//!
//! use fleet_client::{FleetClient, RegisterDeviceRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = FleetClient::new("http://localhost:50051")?;
//!
//!     client.register_device(&RegisterDeviceRequest::new("dev-1")).await?;
//!
//!     let action = client
//!         .initiate_action("dev-1", "SOFTWARE_UPDATE", BTreeMap::new())
//!         .await?;
//!     let done = client.wait_for_action(&action.id, Duration::from_secs(1)).await?;
//!     println!("{} finished as {}", done.id, done.status);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Testing
//!
//! The `testing` module runs a router on an ephemeral port:
//!
//! ```rust,ignore
//! use fleet_client::testing::TestServer;
//! use fleet_api::{create_router, AppState};
//!
//! let server = TestServer::start(create_router(state)).await?;
//! let devices = server.client.list_devices().await?;
//! ```

mod client;
mod error;
pub mod events;
pub mod testing;
mod types;

pub use client::FleetClient;
pub use error::{FleetClientError, Result};
pub use events::{EventError, EventStream};
pub use types::{
    InitiateActionRequest, RegisterDeviceRequest, UpdateStatusRequest, UpdateStatusResponse,
};

// Re-export core types for convenience
pub use fleet_core::{Action, ActionEvent, ActionStatus, ActionType, Device, DeviceStatus};
