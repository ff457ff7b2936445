//! Set-status command - manually change a device's status

use anyhow::Result;
use fleet_client::FleetClient;

use crate::output::{colored_device_status, OutputContext, OutputFormat};

pub async fn set_status(
    client: &FleetClient,
    id: &str,
    status: &str,
    ctx: &OutputContext,
) -> Result<()> {
    let change = client.set_device_status(id, status).await?;

    if ctx.format == OutputFormat::Table {
        ctx.success(&format!("✓ Device '{}' status updated", change.device_id));
        ctx.info(&format!(
            "  Previous: {}",
            colored_device_status(change.previous_status)
        ));
        ctx.info(&format!("  Current:  {}", colored_device_status(change.status)));
    } else {
        ctx.print_kv(&[
            ("device_id", change.device_id.clone()),
            ("previous_status", change.previous_status.to_string()),
            ("status", change.status.to_string()),
        ]);
    }
    Ok(())
}
