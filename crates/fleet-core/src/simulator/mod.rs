//! Action simulator
//!
//! Launches one worker task per initiated action, owns the action records
//! and coordinates shutdown. Device state is only ever touched through the
//! public [`DeviceRegistry`] operations.

mod outcome;
mod worker;

pub use outcome::{ActionPlan, FixedOutcome, OutcomeSource, RandomOutcome};

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::SimulatorConfig;
use crate::error::{FleetError, FleetResult};
use crate::models::{Action, ActionEvent, ActionOutcome, ActionStatus, ActionType};
use crate::registry::DeviceRegistry;
use worker::WorkerJob;

/// Process-wide suffix for action ids
static ACTION_COUNTER: AtomicU64 = AtomicU64::new(0);

struct ActionEntry {
    /// Initiation order
    seq: u64,
    action: Action,
    stop: Arc<AtomicBool>,
    /// Taken by `shutdown` for joining
    worker: Option<JoinHandle<()>>,
}

/// State shared between the simulator and its workers
pub(crate) struct SimulatorShared {
    actions: Mutex<HashMap<String, ActionEntry>>,
    shutdown_requested: AtomicBool,
    events: broadcast::Sender<ActionEvent>,
}

impl SimulatorShared {
    pub(crate) fn shutdown_requested(&self) -> bool {
        self.shutdown_requested.load(Ordering::SeqCst)
    }

    /// Move an action to its terminal state. Fails if the record is gone or
    /// already terminal; terminal records are never rewritten.
    pub(crate) fn resolve(&self, action_id: &str, outcome: ActionOutcome) -> FleetResult<Action> {
        let snapshot = {
            let mut actions = self.actions.lock();
            let entry = actions.get_mut(action_id).ok_or_else(|| {
                FleetError::Internal(format!("action '{}' vanished before it resolved", action_id))
            })?;
            if entry.action.is_terminal() {
                return Err(FleetError::Internal(format!(
                    "action '{}' already resolved as {}",
                    action_id, entry.action.status
                )));
            }
            entry.action.finish(outcome);
            entry.action.clone()
        };
        self.publish(&snapshot);
        Ok(snapshot)
    }

    fn publish(&self, action: &Action) {
        // No subscribers is fine
        let _ = self.events.send(ActionEvent::from(action));
    }
}

/// Runs simulated actions against devices in a [`DeviceRegistry`]
pub struct ActionSimulator {
    registry: Arc<DeviceRegistry>,
    shared: Arc<SimulatorShared>,
    config: SimulatorConfig,
    outcomes: Arc<dyn OutcomeSource>,
    /// Serializes concurrent `shutdown` callers
    shutdown_gate: tokio::sync::Mutex<()>,
    /// Flips to true once every worker has been joined
    stopped: watch::Sender<bool>,
}

impl ActionSimulator {
    /// Create a simulator drawing durations and results at random
    pub fn new(registry: Arc<DeviceRegistry>, config: SimulatorConfig) -> Self {
        let outcomes = Arc::new(RandomOutcome::new(&config));
        Self::with_outcome_source(registry, config, outcomes)
    }

    /// Create a simulator with an injected outcome source
    pub fn with_outcome_source(
        registry: Arc<DeviceRegistry>,
        config: SimulatorConfig,
        outcomes: Arc<dyn OutcomeSource>,
    ) -> Self {
        let (events, _) = broadcast::channel(config.event_capacity.max(1));
        Self {
            registry,
            shared: Arc::new(SimulatorShared {
                actions: Mutex::new(HashMap::new()),
                shutdown_requested: AtomicBool::new(false),
                events,
            }),
            config,
            outcomes,
            shutdown_gate: tokio::sync::Mutex::new(()),
            stopped: watch::channel(false).0,
        }
    }

    pub fn registry(&self) -> &Arc<DeviceRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shared.shutdown_requested()
    }

    /// Start an action and return its id without waiting for it.
    ///
    /// Device existence and availability are the caller's concern. Must be
    /// called from within a Tokio runtime.
    pub fn initiate_action(
        &self,
        device_id: &str,
        action_type: ActionType,
        params: BTreeMap<String, String>,
    ) -> FleetResult<String> {
        let runtime = Handle::try_current()
            .map_err(|e| FleetError::Internal(format!("no async runtime available: {}", e)))?;

        let action_id = next_action_id();
        let stop = Arc::new(AtomicBool::new(false));
        let (launch_tx, launch_rx) = oneshot::channel();

        {
            let mut actions = self.shared.actions.lock();
            if self.shared.shutdown_requested() {
                return Err(FleetError::ShuttingDown);
            }

            let seq = actions.len() as u64;
            let action = Action::pending(&action_id, device_id, action_type, params);
            actions.insert(
                action_id.clone(),
                ActionEntry {
                    seq,
                    action,
                    stop: stop.clone(),
                    worker: None,
                },
            );

            let job = WorkerJob {
                action_id: action_id.clone(),
                device_id: device_id.to_string(),
                stop,
                plan: self.outcomes.plan(),
                tick: self.config.tick(),
                launch: launch_rx,
                registry: self.registry.clone(),
                shared: self.shared.clone(),
            };
            let handle = runtime.spawn(worker::run(job));
            if let Some(entry) = actions.get_mut(&action_id) {
                entry.worker = Some(handle);
            }
        }

        if let Err(e) = self.registry.set_current_action(device_id, &action_id) {
            warn!(device_id = %device_id, action_id = %action_id, error = %e, "Could not associate action with device");
        }
        if let Err(e) = self
            .registry
            .set_status(device_id, action_type.device_status())
        {
            warn!(device_id = %device_id, error = %e, "Could not mark device busy");
        }

        let running = {
            let mut actions = self.shared.actions.lock();
            let entry = actions.get_mut(&action_id).ok_or_else(|| {
                FleetError::Internal(format!("action '{}' vanished during initiation", action_id))
            })?;
            if entry.action.status == ActionStatus::Pending {
                entry.action.status = ActionStatus::Running;
                Some(entry.action.clone())
            } else {
                None
            }
        };
        if let Some(action) = running {
            self.shared.publish(&action);
        }

        // Release the worker only once RUNNING is recorded
        let _ = launch_tx.send(());

        info!(
            action_id = %action_id,
            device_id = %device_id,
            action_type = %action_type,
            "Action initiated"
        );
        Ok(action_id)
    }

    /// Snapshot of an action
    pub fn get_action(&self, action_id: &str) -> Option<Action> {
        self.shared
            .actions
            .lock()
            .get(action_id)
            .map(|entry| entry.action.clone())
    }

    /// Snapshots in initiation order, optionally restricted to one device
    pub fn list_actions(&self, device_id: Option<&str>) -> Vec<Action> {
        let actions = self.shared.actions.lock();
        let mut entries: Vec<_> = actions
            .values()
            .filter(|entry| device_id.map_or(true, |id| entry.action.device_id == id))
            .map(|entry| (entry.seq, entry.action.clone()))
            .collect();
        drop(actions);
        entries.sort_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, action)| action).collect()
    }

    /// Receive every action transition from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ActionEvent> {
        self.shared.events.subscribe()
    }

    /// Resolves once `shutdown` has joined every worker, or immediately if it
    /// already has. Also resolves if the simulator is dropped.
    pub fn stopped(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut receiver = self.stopped.subscribe();
        async move {
            let _ = receiver.wait_for(|stopped| *stopped).await;
        }
    }

    /// Stop every worker and wait for all of them to finish.
    ///
    /// Idempotent. Concurrent callers return only after the join completes.
    pub async fn shutdown(&self) {
        let _gate = self.shutdown_gate.lock().await;

        let (first, workers) = {
            let mut actions = self.shared.actions.lock();
            let first = !self.shared.shutdown_requested.swap(true, Ordering::SeqCst);
            let workers: Vec<_> = actions
                .iter_mut()
                .filter_map(|(id, entry)| {
                    entry.stop.store(true, Ordering::SeqCst);
                    entry.worker.take().map(|handle| (id.clone(), handle))
                })
                .collect();
            (first, workers)
        };

        if !first {
            debug!("Action simulator already shut down");
            return;
        }

        info!(workers = workers.len(), "Waiting for action workers");
        for (action_id, handle) in workers {
            if let Err(e) = handle.await {
                error!(action_id = %action_id, error = %e, "Action worker did not finish cleanly");
            }
        }
        self.stopped.send_replace(true);
        info!("Action simulator shut down");
    }
}

impl Drop for ActionSimulator {
    fn drop(&mut self) {
        self.shared.shutdown_requested.store(true, Ordering::SeqCst);
        for entry in self.shared.actions.lock().values() {
            entry.stop.store(true, Ordering::SeqCst);
        }
    }
}

fn next_action_id() -> String {
    let n = ACTION_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("action_{}_{}", Utc::now().timestamp_millis(), n)
}
