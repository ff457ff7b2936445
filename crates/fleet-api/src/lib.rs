//! fleet-api - REST API layer for the device fleet manager
//!
//! Thin axum adapter over [`fleet_core::FleetService`]. Handlers decode the
//! request, parse enum names, call one service operation and serialize the
//! returned snapshot.
//!
//! # Usage
//!
//! ```ignore
//! use fleet_api::{create_router, AppState};
//! use fleet_core::SimulatorConfig;
//!
//! let state = AppState::from_config(SimulatorConfig::default())?;
//! let router = create_router(state);
//! ```

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ErrorResponse};
pub use state::AppState;

use std::future::Future;

use axum::routing::{get, put};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Create the fleet REST API router with the given application state
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(|| async { "OK" }))
        // Device routes
        .route(
            "/fleet/v1/devices",
            get(handlers::devices::list_devices).post(handlers::devices::register_device),
        )
        .route(
            "/fleet/v1/devices/{device_id}",
            get(handlers::devices::get_device),
        )
        .route(
            "/fleet/v1/devices/{device_id}/status",
            put(handlers::devices::update_status),
        )
        // Action routes
        .route(
            "/fleet/v1/devices/{device_id}/actions",
            get(handlers::actions::list_device_actions).post(handlers::actions::initiate_action),
        )
        .route(
            "/fleet/v1/actions/{action_id}",
            get(handlers::actions::get_action),
        )
        // Event stream
        .route("/fleet/v1/events", get(handlers::events::stream_events))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Serve the API until `signal` resolves.
///
/// On the signal the action simulator is shut down first, which also ends
/// every open event stream, and then the server drains its connections.
pub async fn serve<F>(listener: TcpListener, state: AppState, signal: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let service = state.service().clone();
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move {
            signal.await;
            info!("Shutting down action simulator");
            service.shutdown().await;
        })
        .await
}
