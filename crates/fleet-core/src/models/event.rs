//! Action lifecycle events

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::action::{Action, ActionStatus};

/// Published on every action transition past PENDING
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub action_id: String,
    pub device_id: String,
    pub status: ActionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl From<&Action> for ActionEvent {
    fn from(action: &Action) -> Self {
        Self {
            action_id: action.id.clone(),
            device_id: action.device_id.clone(),
            status: action.status,
            error: action.error_message.clone(),
            timestamp: action.completed_at.unwrap_or_else(Utc::now),
        }
    }
}
