//! Device handlers

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use fleet_core::{Device, DeviceStatus, NewDevice};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct DeviceListResponse {
    pub items: Vec<Device>,
}

#[derive(Deserialize)]
pub struct RegisterDeviceRequest {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub device_type: Option<String>,
    /// Initial status name, IDLE when omitted
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Serialize)]
pub struct UpdateStatusResponse {
    pub device_id: String,
    pub previous_status: DeviceStatus,
    pub status: DeviceStatus,
}

/// GET /fleet/v1/devices
pub async fn list_devices(State(state): State<AppState>) -> Json<DeviceListResponse> {
    Json(DeviceListResponse {
        items: state.service().devices(),
    })
}

/// POST /fleet/v1/devices
pub async fn register_device(
    State(state): State<AppState>,
    Json(request): Json<RegisterDeviceRequest>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    let initial_status = request
        .status
        .as_deref()
        .map(str::parse::<DeviceStatus>)
        .transpose()?;

    let device = state.service().register_device(NewDevice {
        id: request.id,
        name: request.name,
        device_type: request.device_type,
        initial_status,
    })?;

    tracing::info!(device_id = %device.id, status = %device.status, "Device registered");
    Ok((StatusCode::CREATED, Json(device)))
}

/// GET /fleet/v1/devices/{device_id}
pub async fn get_device(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<Device>, ApiError> {
    Ok(Json(state.service().device(&device_id)?))
}

/// PUT /fleet/v1/devices/{device_id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<UpdateStatusResponse>, ApiError> {
    let status: DeviceStatus = request.status.parse()?;
    let change = state.service().set_device_status(&device_id, status)?;

    tracing::info!(
        device_id = %device_id,
        from = %change.previous,
        to = %change.current,
        "Device status updated"
    );

    Ok(Json(UpdateStatusResponse {
        device_id,
        previous_status: change.previous,
        status: change.current,
    }))
}
