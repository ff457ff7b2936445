//! Common error types for fleet state operations

use thiserror::Error;

/// Result type for fleet operations
pub type FleetResult<T> = Result<T, FleetError>;

/// Errors surfaced by the registry, the simulator and the service layer
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FleetError {
    /// Unknown device id
    #[error("Device with ID '{0}' not found")]
    DeviceNotFound(String),

    /// Unknown action id
    #[error("Action with ID '{0}' not found")]
    ActionNotFound(String),

    /// Registration with an id that is already taken
    #[error("Device with ID '{0}' already exists")]
    DeviceAlreadyExists(String),

    /// Device already has an action in flight
    #[error("Device '{device_id}' is already busy with action: {action_id}")]
    DeviceBusy {
        device_id: String,
        action_id: String,
    },

    /// Empty id, unknown enum value, malformed parameters
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Action initiation after shutdown was requested
    #[error("Action simulator is shutting down")]
    ShuttingDown,

    /// Broken internal invariant
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FleetError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            FleetError::DeviceNotFound(_) => 404,
            FleetError::ActionNotFound(_) => 404,
            FleetError::DeviceAlreadyExists(_) => 409,
            FleetError::DeviceBusy { .. } => 409,
            FleetError::InvalidRequest(_) => 400,
            FleetError::ShuttingDown => 503,
            FleetError::Internal(_) => 500,
        }
    }

    /// Whether the error means the referenced resource does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            FleetError::DeviceNotFound(_) | FleetError::ActionNotFound(_)
        )
    }
}
