//! Action (simulated long-running operation) models

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::device::{normalize_enum_name, DeviceStatus};
use crate::error::FleetError;

/// Error message recorded when a worker is stopped before it finished
pub const CANCELLED_MESSAGE: &str = "Action was cancelled";

/// Error message recorded on the simulated failure branch
pub const RANDOM_FAILURE_MESSAGE: &str = "Action simulation failed (random failure)";

/// Kind of action that can be run against a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    SoftwareUpdate,
    FirmwareUpdate,
    SystemReboot,
    ConfigurationChange,
}

impl ActionType {
    pub const ALL: [ActionType; 4] = [
        ActionType::SoftwareUpdate,
        ActionType::FirmwareUpdate,
        ActionType::SystemReboot,
        ActionType::ConfigurationChange,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::SoftwareUpdate => "SOFTWARE_UPDATE",
            ActionType::FirmwareUpdate => "FIRMWARE_UPDATE",
            ActionType::SystemReboot => "SYSTEM_REBOOT",
            ActionType::ConfigurationChange => "CONFIGURATION_CHANGE",
        }
    }

    /// Status a device takes on while this action runs
    pub fn device_status(&self) -> DeviceStatus {
        match self {
            ActionType::SoftwareUpdate | ActionType::FirmwareUpdate => DeviceStatus::Updating,
            ActionType::SystemReboot | ActionType::ConfigurationChange => DeviceStatus::Busy,
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = FleetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = normalize_enum_name(s);
        ActionType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| FleetError::InvalidRequest(format!("Invalid action type '{}'", s)))
    }
}

/// Lifecycle status of an action
///
/// `Pending -> Running -> {Completed | Failed}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionStatus {
    /// Recorded, worker not yet released
    Pending,
    /// Worker is simulating the action
    Running,
    /// Finished successfully
    Completed,
    /// Failed or cancelled
    Failed,
}

impl ActionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionStatus::Pending => "PENDING",
            ActionStatus::Running => "RUNNING",
            ActionStatus::Completed => "COMPLETED",
            ActionStatus::Failed => "FAILED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ActionStatus::Completed | ActionStatus::Failed)
    }
}

impl fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a worker finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Simulated work succeeded
    Completed,
    /// Simulated work hit the random failure branch
    Failed,
    /// Stop flag or shutdown interrupted the wait
    Cancelled,
}

impl ActionOutcome {
    /// Cancellation wins over the drawn success value.
    pub fn resolve(interrupted: bool, succeeded: bool) -> Self {
        match (interrupted, succeeded) {
            (true, _) => ActionOutcome::Cancelled,
            (false, true) => ActionOutcome::Completed,
            (false, false) => ActionOutcome::Failed,
        }
    }

    pub fn status(&self) -> ActionStatus {
        match self {
            ActionOutcome::Completed => ActionStatus::Completed,
            ActionOutcome::Failed | ActionOutcome::Cancelled => ActionStatus::Failed,
        }
    }

    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            ActionOutcome::Completed => None,
            ActionOutcome::Failed => Some(RANDOM_FAILURE_MESSAGE),
            ActionOutcome::Cancelled => Some(CANCELLED_MESSAGE),
        }
    }

    /// Device status to write back, or `None` to leave the device untouched
    pub fn device_status(&self) -> Option<DeviceStatus> {
        match self {
            ActionOutcome::Completed => Some(DeviceStatus::Idle),
            ActionOutcome::Failed => Some(DeviceStatus::Error),
            ActionOutcome::Cancelled => None,
        }
    }
}

/// Snapshot of an action record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Globally unique action identifier
    pub id: String,
    /// Device the action runs against
    pub device_id: String,
    /// Kind of action
    #[serde(rename = "type")]
    pub action_type: ActionType,
    /// Lifecycle status
    pub status: ActionStatus,
    /// Caller-supplied parameters
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub params: BTreeMap<String, String>,
    /// When the action was initiated
    pub initiated_at: DateTime<Utc>,
    /// When the action reached a terminal state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Set only on FAILED
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl Action {
    /// Create a new pending action
    pub fn pending(
        id: impl Into<String>,
        device_id: impl Into<String>,
        action_type: ActionType,
        params: BTreeMap<String, String>,
    ) -> Self {
        Self {
            id: id.into(),
            device_id: device_id.into(),
            action_type,
            status: ActionStatus::Pending,
            params,
            initiated_at: Utc::now(),
            completed_at: None,
            error_message: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Whether this failure came from a stop/shutdown rather than the simulation
    pub fn was_cancelled(&self) -> bool {
        self.status == ActionStatus::Failed
            && self.error_message.as_deref() == Some(CANCELLED_MESSAGE)
    }

    /// Apply the terminal outcome. Callers must check `is_terminal` first.
    pub(crate) fn finish(&mut self, outcome: ActionOutcome) {
        self.status = outcome.status();
        self.error_message = outcome.error_message().map(String::from);
        self.completed_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_actions_mark_device_updating() {
        assert_eq!(
            ActionType::SoftwareUpdate.device_status(),
            DeviceStatus::Updating
        );
        assert_eq!(
            ActionType::FirmwareUpdate.device_status(),
            DeviceStatus::Updating
        );
        assert_eq!(ActionType::SystemReboot.device_status(), DeviceStatus::Busy);
        assert_eq!(
            ActionType::ConfigurationChange.device_status(),
            DeviceStatus::Busy
        );
    }

    #[test]
    fn test_parse_action_type() {
        assert_eq!(
            "software-update".parse::<ActionType>().unwrap(),
            ActionType::SoftwareUpdate
        );
        assert_eq!(
            "SYSTEM_REBOOT".parse::<ActionType>().unwrap(),
            ActionType::SystemReboot
        );
        assert!("ACTION_TYPE_UNKNOWN".parse::<ActionType>().is_err());
    }

    #[test]
    fn test_outcome_resolution() {
        assert_eq!(ActionOutcome::resolve(true, true), ActionOutcome::Cancelled);
        assert_eq!(ActionOutcome::resolve(true, false), ActionOutcome::Cancelled);
        assert_eq!(ActionOutcome::resolve(false, true), ActionOutcome::Completed);
        assert_eq!(ActionOutcome::resolve(false, false), ActionOutcome::Failed);

        assert_eq!(ActionOutcome::Cancelled.device_status(), None);
        assert_eq!(
            ActionOutcome::Failed.device_status(),
            Some(DeviceStatus::Error)
        );
    }

    #[test]
    fn test_finish_sets_terminal_fields() {
        let mut action = Action::pending("a1", "dev-1", ActionType::SystemReboot, BTreeMap::new());
        assert!(action.completed_at.is_none());
        assert!(action.error_message.is_none());

        action.finish(ActionOutcome::Cancelled);
        assert_eq!(action.status, ActionStatus::Failed);
        assert!(action.was_cancelled());
        assert!(action.completed_at.is_some());
    }

    #[test]
    fn test_random_failure_is_not_cancellation() {
        let mut action = Action::pending("a1", "dev-1", ActionType::SystemReboot, BTreeMap::new());
        action.finish(ActionOutcome::Failed);
        assert_eq!(action.status, ActionStatus::Failed);
        assert!(!action.was_cancelled());
        assert_eq!(action.error_message.as_deref(), Some(RANDOM_FAILURE_MESSAGE));
    }
}
