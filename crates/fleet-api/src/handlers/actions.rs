//! Action handlers
//!
//! Actions run in the background; initiation answers 202 right away and
//! callers poll `GET /fleet/v1/actions/{action_id}` or follow the event
//! stream.

use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use fleet_core::{Action, ActionType};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ActionListResponse {
    pub items: Vec<Action>,
}

#[derive(Deserialize)]
pub struct InitiateActionRequest {
    /// Action type name, e.g. "SOFTWARE_UPDATE"
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

/// POST /fleet/v1/devices/{device_id}/actions
pub async fn initiate_action(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    Json(request): Json<InitiateActionRequest>,
) -> Result<(StatusCode, Json<Action>), ApiError> {
    let action_type: ActionType = request.action_type.parse()?;
    let action = state
        .service()
        .initiate_action(&device_id, action_type, request.params)?;

    Ok((StatusCode::ACCEPTED, Json(action)))
}

/// GET /fleet/v1/devices/{device_id}/actions
pub async fn list_device_actions(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<ActionListResponse>, ApiError> {
    let items = state.service().device_actions(&device_id)?;
    Ok(Json(ActionListResponse { items }))
}

/// GET /fleet/v1/actions/{action_id}
pub async fn get_action(
    State(state): State<AppState>,
    Path(action_id): Path<String>,
) -> Result<Json<Action>, ApiError> {
    Ok(Json(state.service().action(&action_id)?))
}
