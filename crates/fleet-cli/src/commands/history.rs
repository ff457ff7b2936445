//! History command - list actions run on a device

use anyhow::Result;
use fleet_client::FleetClient;

use crate::output::{ActionRow, OutputContext};

pub async fn history(client: &FleetClient, id: &str, ctx: &OutputContext) -> Result<()> {
    let actions = client.list_device_actions(id).await?;
    let rows: Vec<ActionRow> = actions.iter().map(ActionRow::from).collect();
    ctx.print(&rows);
    Ok(())
}
