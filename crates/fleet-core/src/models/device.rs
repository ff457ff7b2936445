//! Device models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FleetError;

/// Operational status of a device
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceStatus {
    /// Available for new actions
    #[default]
    Idle,
    /// Running a non-update action
    Busy,
    /// Not reachable
    Offline,
    /// Taken out of service by an operator
    Maintenance,
    /// Running a software or firmware update
    Updating,
    /// Coming back from a fault
    Recovering,
    /// Last action failed
    Error,
}

impl DeviceStatus {
    pub const ALL: [DeviceStatus; 7] = [
        DeviceStatus::Idle,
        DeviceStatus::Busy,
        DeviceStatus::Offline,
        DeviceStatus::Maintenance,
        DeviceStatus::Updating,
        DeviceStatus::Recovering,
        DeviceStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Idle => "IDLE",
            DeviceStatus::Busy => "BUSY",
            DeviceStatus::Offline => "OFFLINE",
            DeviceStatus::Maintenance => "MAINTENANCE",
            DeviceStatus::Updating => "UPDATING",
            DeviceStatus::Recovering => "RECOVERING",
            DeviceStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceStatus {
    type Err = FleetError;

    /// Case-insensitive; `-` and spaces are accepted in place of `_`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_enum_name(s);
        DeviceStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == wanted)
            .ok_or_else(|| FleetError::InvalidRequest(format!("Invalid device status '{}'", s)))
    }
}

/// Normalize user input such as `software-update` to `SOFTWARE_UPDATE`
pub(crate) fn normalize_enum_name(s: &str) -> String {
    s.trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            c => c.to_ascii_uppercase(),
        })
        .collect()
}

/// Point-in-time snapshot of a registered device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    /// Unique device identifier
    pub id: String,
    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Display type (e.g. "sensor", "gateway")
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    /// Current status
    pub status: DeviceStatus,
    /// When the device was registered
    pub registered_at: DateTime<Utc>,
    /// Refreshed on every mutation
    pub last_updated_at: DateTime<Utc>,
    /// Action currently in flight, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_action_id: Option<String>,
}

impl Device {
    /// Whether an action is currently associated with this device
    pub fn has_action(&self) -> bool {
        self.current_action_id.is_some()
    }
}

/// Registration request for a new device
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDevice {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    /// Defaults to IDLE
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_status: Option<DeviceStatus>,
}

impl NewDevice {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    pub fn with_status(mut self, status: DeviceStatus) -> Self {
        self.initial_status = Some(status);
        self
    }
}
