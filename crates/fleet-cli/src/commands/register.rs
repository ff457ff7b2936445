//! Register command - add a device to the fleet

use anyhow::Result;
use fleet_client::{FleetClient, RegisterDeviceRequest};
use tracing::debug;

use crate::output::OutputContext;

pub async fn register(
    client: &FleetClient,
    id: &str,
    name: Option<&str>,
    device_type: Option<&str>,
    status: Option<&str>,
    ctx: &OutputContext,
) -> Result<()> {
    let request = RegisterDeviceRequest {
        id: id.to_string(),
        name: name.map(String::from),
        device_type: device_type.map(String::from),
        status: status.map(String::from),
    };
    debug!(request = ?request, "Registering device");
    let device = client.register_device(&request).await?;

    ctx.success(&format!(
        "✓ Device '{}' registered successfully ({})",
        device.id, device.status
    ));
    Ok(())
}
