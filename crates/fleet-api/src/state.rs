//! Application state for the fleet API

use std::sync::Arc;

use fleet_core::{FleetService, SimulatorConfig};

use crate::error::ApiError;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    service: Arc<FleetService>,
}

impl AppState {
    pub fn new(service: Arc<FleetService>) -> Self {
        Self { service }
    }

    /// Build a fresh registry and random-outcome simulator
    pub fn from_config(config: SimulatorConfig) -> Result<Self, ApiError> {
        let service = FleetService::from_config(config)?;
        Ok(Self::new(Arc::new(service)))
    }

    pub fn service(&self) -> &Arc<FleetService> {
        &self.service
    }
}
