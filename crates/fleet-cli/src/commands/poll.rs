//! Poll command - follow an action until it finishes

use std::sync::atomic::Ordering;
use std::time::Duration;

use anyhow::{bail, Result};
use fleet_client::{ActionStatus, FleetClient};
use tracing::debug;

use super::action::action_pairs;
use crate::output::{colored_action_status, OutputContext, OutputFormat};

pub async fn poll(
    client: &FleetClient,
    action_id: &str,
    interval: Duration,
    ctx: &OutputContext,
) -> Result<()> {
    ctx.info(&format!("Polling action {} (Ctrl+C to stop)", action_id));
    let running = super::interrupt_flag()?;

    while running.load(Ordering::SeqCst) {
        let action = client.get_action(action_id).await?;
        debug!(action_id = %action.id, status = %action.status, "Polled action");
        ctx.info(&format!(
            "[{}] Status: {}",
            chrono::Local::now().format("%H:%M:%S"),
            colored_action_status(action.status)
        ));

        if action.is_terminal() {
            ctx.print_kv(&action_pairs(&action, ctx.format == OutputFormat::Table));
            if action.status == ActionStatus::Failed {
                bail!(
                    "Action {} failed: {}",
                    action.id,
                    action.error_message.as_deref().unwrap_or("unknown error")
                );
            }
            ctx.success(&format!("✓ Action {} completed successfully", action.id));
            return Ok(());
        }

        // Sleep in short slices so Ctrl+C is noticed promptly
        let deadline = tokio::time::Instant::now() + interval;
        while running.load(Ordering::SeqCst) && tokio::time::Instant::now() < deadline {
            let remaining = deadline - tokio::time::Instant::now();
            tokio::time::sleep(remaining.min(Duration::from_millis(100))).await;
        }
    }

    ctx.warn("Polling stopped by user.");
    Ok(())
}
