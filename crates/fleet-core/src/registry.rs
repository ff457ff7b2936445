//! Device registry
//!
//! Authoritative in-memory store of device records. Every operation takes
//! a single lock around the whole map and returns copies, so callers never
//! observe a record mid-update.

use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{FleetError, FleetResult};
use crate::models::{Device, DeviceStatus, NewDevice};

/// Thread-safe store of devices keyed by id
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: Mutex<BTreeMap<String, Device>>,
}

impl DeviceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new device. Fails without mutation if the id is taken.
    pub fn register(&self, new: NewDevice) -> FleetResult<Device> {
        let mut devices = self.devices.lock();
        if devices.contains_key(&new.id) {
            return Err(FleetError::DeviceAlreadyExists(new.id));
        }

        let now = Utc::now();
        let device = Device {
            id: new.id.clone(),
            name: new.name,
            device_type: new.device_type,
            status: new.initial_status.unwrap_or_default(),
            registered_at: now,
            last_updated_at: now,
            current_action_id: None,
        };
        devices.insert(new.id, device.clone());

        debug!(device_id = %device.id, status = %device.status, "Device registered");
        Ok(device)
    }

    /// Swap the device status, returning the previous one
    pub fn set_status(&self, id: &str, status: DeviceStatus) -> FleetResult<DeviceStatus> {
        let previous = self.update(id, |device| std::mem::replace(&mut device.status, status))?;
        debug!(device_id = %id, from = %previous, to = %status, "Device status changed");
        Ok(previous)
    }

    /// Point-in-time copy of a device
    pub fn get(&self, id: &str) -> Option<Device> {
        self.devices.lock().get(id).cloned()
    }

    /// Snapshot of all devices in ascending id order
    pub fn list(&self) -> Vec<Device> {
        self.devices.lock().values().cloned().collect()
    }

    pub fn set_current_action(&self, id: &str, action_id: &str) -> FleetResult<()> {
        self.update(id, |device| {
            device.current_action_id = Some(action_id.to_string());
        })
    }

    pub fn clear_current_action(&self, id: &str) -> FleetResult<()> {
        self.update(id, |device| {
            device.current_action_id = None;
        })
    }

    pub fn exists(&self, id: &str) -> bool {
        self.devices.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.devices.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.lock().is_empty()
    }

    fn update<R>(&self, id: &str, f: impl FnOnce(&mut Device) -> R) -> FleetResult<R> {
        let mut devices = self.devices.lock();
        let device = devices
            .get_mut(id)
            .ok_or_else(|| FleetError::DeviceNotFound(id.to_string()))?;
        let result = f(device);
        device.last_updated_at = Utc::now();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn registry_with(ids: &[&str]) -> DeviceRegistry {
        let registry = DeviceRegistry::new();
        for id in ids {
            registry.register(NewDevice::new(*id)).unwrap();
        }
        registry
    }

    #[test]
    fn test_register_defaults_to_idle() {
        let registry = DeviceRegistry::new();
        let device = registry
            .register(NewDevice::new("dev-1").with_name("Edge box").with_type("gateway"))
            .unwrap();

        assert_eq!(device.status, DeviceStatus::Idle);
        assert_eq!(device.registered_at, device.last_updated_at);
        assert!(device.current_action_id.is_none());
        assert_eq!(registry.get("dev-1"), Some(device));
    }

    #[test]
    fn test_register_with_initial_status() {
        let registry = DeviceRegistry::new();
        let device = registry
            .register(NewDevice::new("dev-1").with_status(DeviceStatus::Maintenance))
            .unwrap();
        assert_eq!(device.status, DeviceStatus::Maintenance);
    }

    #[test]
    fn test_duplicate_registration_leaves_original() {
        let registry = DeviceRegistry::new();
        let first = registry
            .register(NewDevice::new("dev-1").with_name("first"))
            .unwrap();

        let err = registry
            .register(NewDevice::new("dev-1").with_name("second"))
            .unwrap_err();
        assert_eq!(err, FleetError::DeviceAlreadyExists("dev-1".into()));
        assert_eq!(registry.get("dev-1"), Some(first));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_set_status_returns_previous() {
        let registry = registry_with(&["dev-1"]);
        let before = registry.get("dev-1").unwrap();

        let previous = registry.set_status("dev-1", DeviceStatus::Offline).unwrap();
        assert_eq!(previous, DeviceStatus::Idle);

        let after = registry.get("dev-1").unwrap();
        assert_eq!(after.status, DeviceStatus::Offline);
        assert!(after.last_updated_at >= before.last_updated_at);
    }

    #[test]
    fn test_unknown_device_is_not_created() {
        let registry = DeviceRegistry::new();

        assert_eq!(
            registry.set_status("missing", DeviceStatus::Idle),
            Err(FleetError::DeviceNotFound("missing".into()))
        );
        assert!(registry.set_current_action("missing", "a").is_err());
        assert!(registry.clear_current_action("missing").is_err());
        assert!(registry.get("missing").is_none());
        assert!(!registry.exists("missing"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_current_action_association() {
        let registry = registry_with(&["dev-1"]);

        registry.set_current_action("dev-1", "action_1_0").unwrap();
        assert_eq!(
            registry.get("dev-1").unwrap().current_action_id.as_deref(),
            Some("action_1_0")
        );

        registry.clear_current_action("dev-1").unwrap();
        assert!(!registry.get("dev-1").unwrap().has_action());
    }

    #[test]
    fn test_list_is_sorted_by_id() {
        let registry = registry_with(&["c", "a", "b"]);
        let ids: Vec<_> = registry.list().into_iter().map(|d| d.id).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_concurrent_registration_has_one_winner() {
        let registry = DeviceRegistry::new();
        let winners: usize = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let registry = &registry;
                    scope.spawn(move || {
                        registry
                            .register(NewDevice::new("shared").with_name(format!("t{}", i)))
                            .is_ok()
                    })
                })
                .collect();
            handles
                .into_iter()
                .map(|h| usize::from(h.join().unwrap()))
                .sum()
        });

        assert_eq!(winners, 1);
        assert_eq!(registry.len(), 1);
    }
}
