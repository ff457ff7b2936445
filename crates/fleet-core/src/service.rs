//! Request-level operations over the registry and the simulator
//!
//! The core components trust their callers. `FleetService` is the caller:
//! it rejects empty ids, unknown devices and busy devices before anything
//! reaches the simulator.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, error};

use crate::config::SimulatorConfig;
use crate::error::{FleetError, FleetResult};
use crate::models::{Action, ActionEvent, ActionType, Device, DeviceStatus, NewDevice};
use crate::registry::DeviceRegistry;
use crate::simulator::ActionSimulator;

/// Result of a status update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub previous: DeviceStatus,
    pub current: DeviceStatus,
}

/// Validating facade used by the request handlers
pub struct FleetService {
    registry: Arc<DeviceRegistry>,
    simulator: Arc<ActionSimulator>,
    /// Makes the busy check and the initiation one step. Held only for the
    /// synchronous check and `ActionSimulator::initiate_action`, which never
    /// waits on a worker, so initiations on other devices queue for
    /// microseconds at most.
    initiation: Mutex<()>,
}

impl FleetService {
    pub fn new(registry: Arc<DeviceRegistry>, simulator: Arc<ActionSimulator>) -> Self {
        Self {
            registry,
            simulator,
            initiation: Mutex::new(()),
        }
    }

    /// Build a registry and a random-outcome simulator from config
    pub fn from_config(config: SimulatorConfig) -> FleetResult<Self> {
        config.validate()?;
        let registry = Arc::new(DeviceRegistry::new());
        let simulator = Arc::new(ActionSimulator::new(registry.clone(), config));
        Ok(Self::new(registry, simulator))
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn simulator(&self) -> &Arc<ActionSimulator> {
        &self.simulator
    }

    pub fn register_device(&self, new: NewDevice) -> FleetResult<Device> {
        require_id("device_id", &new.id)?;
        self.registry.register(new)
    }

    pub fn set_device_status(&self, device_id: &str, status: DeviceStatus) -> FleetResult<StatusChange> {
        require_id("device_id", device_id)?;
        let previous = self.registry.set_status(device_id, status)?;
        Ok(StatusChange {
            previous,
            current: status,
        })
    }

    pub fn device(&self, device_id: &str) -> FleetResult<Device> {
        require_id("device_id", device_id)?;
        self.registry
            .get(device_id)
            .ok_or_else(|| FleetError::DeviceNotFound(device_id.to_string()))
    }

    pub fn devices(&self) -> Vec<Device> {
        self.registry.list()
    }

    /// Start an action on an existing, idle-handed device
    pub fn initiate_action(
        &self,
        device_id: &str,
        action_type: ActionType,
        params: BTreeMap<String, String>,
    ) -> FleetResult<Action> {
        require_id("device_id", device_id)?;

        let action_id = {
            let _guard = self.initiation.lock();
            let device = self
                .registry
                .get(device_id)
                .ok_or_else(|| FleetError::DeviceNotFound(device_id.to_string()))?;
            if let Some(action_id) = device.current_action_id {
                debug!(device_id = %device_id, action_id = %action_id, "Device busy, action refused");
                return Err(FleetError::DeviceBusy {
                    device_id: device_id.to_string(),
                    action_id,
                });
            }
            self.simulator
                .initiate_action(device_id, action_type, params)?
        };

        self.simulator.get_action(&action_id).ok_or_else(|| {
            error!(action_id = %action_id, "Initiated action is missing");
            FleetError::Internal(format!("action '{}' missing after initiation", action_id))
        })
    }

    pub fn action(&self, action_id: &str) -> FleetResult<Action> {
        require_id("action_id", action_id)?;
        self.simulator
            .get_action(action_id)
            .ok_or_else(|| FleetError::ActionNotFound(action_id.to_string()))
    }

    pub fn device_actions(&self, device_id: &str) -> FleetResult<Vec<Action>> {
        require_id("device_id", device_id)?;
        if !self.registry.exists(device_id) {
            return Err(FleetError::DeviceNotFound(device_id.to_string()));
        }
        Ok(self.simulator.list_actions(Some(device_id)))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ActionEvent> {
        self.simulator.subscribe()
    }

    pub async fn shutdown(&self) {
        self.simulator.shutdown().await;
    }

    /// See [`ActionSimulator::stopped`]
    pub fn stopped(&self) -> impl std::future::Future<Output = ()> + Send + 'static {
        self.simulator.stopped()
    }
}

fn require_id(field: &str, value: &str) -> FleetResult<()> {
    if value.trim().is_empty() {
        return Err(FleetError::InvalidRequest(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ActionStatus;
    use crate::simulator::FixedOutcome;
    use std::time::Duration;

    fn service() -> FleetService {
        let registry = Arc::new(DeviceRegistry::new());
        let simulator = Arc::new(ActionSimulator::with_outcome_source(
            registry.clone(),
            SimulatorConfig::default(),
            Arc::new(FixedOutcome::succeeding(Duration::from_secs(10))),
        ));
        FleetService::new(registry, simulator)
    }

    #[test]
    fn test_empty_ids_rejected() {
        let service = service();
        assert!(matches!(
            service.register_device(NewDevice::new("  ")),
            Err(FleetError::InvalidRequest(_))
        ));
        assert!(matches!(
            service.set_device_status("", DeviceStatus::Idle),
            Err(FleetError::InvalidRequest(_))
        ));
        assert!(matches!(service.action(""), Err(FleetError::InvalidRequest(_))));
        assert!(service.devices().is_empty());
    }

    #[test]
    fn test_set_status_reports_change() {
        let service = service();
        service.register_device(NewDevice::new("dev-1")).unwrap();
        let change = service
            .set_device_status("dev-1", DeviceStatus::Maintenance)
            .unwrap();
        assert_eq!(
            change,
            StatusChange {
                previous: DeviceStatus::Idle,
                current: DeviceStatus::Maintenance,
            }
        );
        assert_eq!(
            service.set_device_status("missing", DeviceStatus::Idle),
            Err(FleetError::DeviceNotFound("missing".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_device_action_refused() {
        let service = service();
        let err = service
            .initiate_action("ghost", ActionType::SystemReboot, BTreeMap::new())
            .unwrap_err();
        assert_eq!(err, FleetError::DeviceNotFound("ghost".into()));
        assert!(service.simulator().list_actions(None).is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_busy_device_refused() {
        let service = service();
        service.register_device(NewDevice::new("dev-1")).unwrap();

        let action = service
            .initiate_action("dev-1", ActionType::SoftwareUpdate, BTreeMap::new())
            .unwrap();
        assert_eq!(action.status, ActionStatus::Running);

        let err = service
            .initiate_action("dev-1", ActionType::SystemReboot, BTreeMap::new())
            .unwrap_err();
        assert_eq!(
            err,
            FleetError::DeviceBusy {
                device_id: "dev-1".into(),
                action_id: action.id.clone(),
            }
        );
        assert_eq!(service.device_actions("dev-1").unwrap().len(), 1);

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert_eq!(service.action(&action.id).unwrap().status, ActionStatus::Completed);
        service
            .initiate_action("dev-1", ActionType::SystemReboot, BTreeMap::new())
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_actions_for_unknown_device() {
        let service = service();
        assert_eq!(
            service.device_actions("ghost"),
            Err(FleetError::DeviceNotFound("ghost".into()))
        );
        assert_eq!(
            service.action("action_0_0"),
            Err(FleetError::ActionNotFound("action_0_0".into()))
        );
    }

    #[test]
    fn test_from_config_validates() {
        let bad = SimulatorConfig {
            tick_ms: 0,
            ..Default::default()
        };
        assert!(FleetService::from_config(bad).is_err());
        assert!(FleetService::from_config(SimulatorConfig::default()).is_ok());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_initiations_on_one_device() {
        let service = Arc::new(service());
        service.register_device(NewDevice::new("dev-1")).unwrap();

        let attempts: Vec<_> = (0..16)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move {
                    service.initiate_action("dev-1", ActionType::SystemReboot, BTreeMap::new())
                })
            })
            .collect();

        let mut started = Vec::new();
        let mut busy_with = Vec::new();
        for attempt in attempts {
            match attempt.await.unwrap() {
                Ok(action) => started.push(action.id),
                Err(FleetError::DeviceBusy { action_id, .. }) => busy_with.push(action_id),
                Err(e) => panic!("unexpected error: {}", e),
            }
        }
        assert_eq!(started.len(), 1);
        assert_eq!(busy_with.len(), 15);
        assert!(busy_with.iter().all(|id| *id == started[0]));
        assert_eq!(service.device_actions("dev-1").unwrap().len(), 1);
        assert_eq!(
            service.device("dev-1").unwrap().current_action_id,
            Some(started[0].clone())
        );

        service.shutdown().await;
    }
}
