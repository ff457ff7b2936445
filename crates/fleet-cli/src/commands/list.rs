//! List command - show all registered devices

use anyhow::Result;
use fleet_client::FleetClient;

use crate::output::{DeviceRow, OutputContext};

pub async fn list(client: &FleetClient, ctx: &OutputContext) -> Result<()> {
    let devices = client.list_devices().await?;
    let rows: Vec<DeviceRow> = devices.iter().map(DeviceRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
