//! Per-action worker task

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use super::outcome::ActionPlan;
use super::SimulatorShared;
use crate::models::ActionOutcome;
use crate::registry::DeviceRegistry;

/// Everything a worker needs, moved into the spawned task
pub(crate) struct WorkerJob {
    pub action_id: String,
    pub device_id: String,
    pub stop: Arc<AtomicBool>,
    pub plan: Box<dyn ActionPlan>,
    pub tick: Duration,
    pub launch: oneshot::Receiver<()>,
    pub registry: Arc<DeviceRegistry>,
    pub shared: Arc<SimulatorShared>,
}

/// Simulate one action from launch to its terminal state
pub(crate) async fn run(job: WorkerJob) {
    let WorkerJob {
        action_id,
        device_id,
        stop,
        mut plan,
        tick,
        launch,
        registry,
        shared,
    } = job;

    // A dropped sender still releases the worker so the action resolves.
    let _ = launch.await;

    let duration = plan.duration();
    debug!(action_id = %action_id, duration_secs = duration.as_secs(), "Action worker started");

    let interrupted = wait(duration, tick, || {
        stop.load(Ordering::SeqCst) || shared.shutdown_requested()
    })
    .await;
    let succeeded = plan.succeeds();
    let outcome = ActionOutcome::resolve(interrupted, succeeded);

    let action = match shared.resolve(&action_id, outcome) {
        Ok(action) => action,
        Err(e) => {
            error!(action_id = %action_id, error = %e, "Failed to record action outcome");
            return;
        }
    };

    let Some(status) = outcome.device_status() else {
        info!(action_id = %action_id, device_id = %device_id, "Action cancelled");
        return;
    };

    if let Err(e) = registry.set_status(&device_id, status) {
        warn!(device_id = %device_id, error = %e, "Could not restore device status");
    }
    if let Err(e) = registry.clear_current_action(&device_id) {
        warn!(device_id = %device_id, error = %e, "Could not clear current action");
    }

    info!(
        action_id = %action_id,
        device_id = %device_id,
        status = %action.status,
        "Action finished"
    );
}

/// Sleep for `duration` in steps of at most `tick`, returning `true` if
/// `interrupted` reported true after any step.
async fn wait(duration: Duration, tick: Duration, interrupted: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + duration;
    loop {
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        tokio::time::sleep(tick.min(deadline - now)).await;
        if interrupted() {
            return true;
        }
    }
}
