//! Info command - show details for one device

use anyhow::Result;
use fleet_client::FleetClient;

use crate::output::{colored_device_status, format_time, OutputContext, OutputFormat};

pub async fn info(client: &FleetClient, id: &str, ctx: &OutputContext) -> Result<()> {
    let device = client.get_device(id).await?;

    let status = if ctx.format == OutputFormat::Table {
        colored_device_status(device.status)
    } else {
        device.status.to_string()
    };

    let pairs = vec![
        ("ID", device.id.clone()),
        ("Name", device.name.clone().unwrap_or_default()),
        ("Type", device.device_type.clone().unwrap_or_default()),
        ("Status", status),
        ("Registered", format_time(&device.registered_at)),
        ("Last Updated", format_time(&device.last_updated_at)),
        (
            "Current Action",
            device
                .current_action_id
                .clone()
                .unwrap_or_else(|| "None".to_string()),
        ),
    ];
    ctx.print_kv(&pairs);
    Ok(())
}
