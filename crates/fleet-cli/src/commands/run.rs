//! Run command - start an action on a device

use std::collections::BTreeMap;

use anyhow::Result;
use fleet_client::FleetClient;
use tracing::debug;

use crate::output::{colored_action_status, OutputContext, OutputFormat};

/// Parse a `KEY=VALUE` action parameter
pub fn parse_param(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", raw));
    }
    Ok((key.to_string(), value.to_string()))
}

pub async fn run(
    client: &FleetClient,
    id: &str,
    action_type: &str,
    params: &[(String, String)],
    ctx: &OutputContext,
) -> Result<()> {
    let params: BTreeMap<String, String> = params.iter().cloned().collect();
    debug!(device_id = %id, action_type = %action_type, params = ?params, "Initiating action");
    let action = client.initiate_action(id, action_type, params).await?;
    debug!(action_id = %action.id, status = %action.status, "Action accepted");

    if ctx.format == OutputFormat::Table {
        ctx.success(&format!(
            "✓ Action {} initiated on device '{}'",
            action.action_type, action.device_id
        ));
        ctx.info(&format!("  Action ID: {}", action.id));
        ctx.info(&format!("  Status:    {}", colored_action_status(action.status)));
        if ctx.quiet {
            println!("{}", action.id);
        }
    } else {
        ctx.print_kv(&[
            ("action_id", action.id.clone()),
            ("device_id", action.device_id.clone()),
            ("type", action.action_type.to_string()),
            ("status", action.status.to_string()),
        ]);
    }
    Ok(())
}
