//! Request and response types for the fleet client

use std::collections::BTreeMap;

use fleet_core::{Action, Device, DeviceStatus};
use serde::{Deserialize, Serialize};

/// Device registration request
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegisterDeviceRequest {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub device_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RegisterDeviceRequest {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateStatusResponse {
    pub device_id: String,
    pub previous_status: DeviceStatus,
    pub status: DeviceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateActionRequest {
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DeviceList {
    pub items: Vec<Device>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ActionList {
    pub items: Vec<Action>,
}

/// Error body returned by the server
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: String,
    pub message: String,
}
