//! Action command - show the state of one action

use anyhow::Result;
use fleet_client::{Action, FleetClient};

use crate::output::{colored_action_status, format_time, OutputContext, OutputFormat};

pub async fn action(client: &FleetClient, action_id: &str, ctx: &OutputContext) -> Result<()> {
    let action = client.get_action(action_id).await?;
    ctx.print_kv(&action_pairs(&action, ctx.format == OutputFormat::Table));
    Ok(())
}

pub(crate) fn action_pairs(action: &Action, color: bool) -> Vec<(&'static str, String)> {
    let status = if color {
        colored_action_status(action.status)
    } else {
        action.status.to_string()
    };

    let mut pairs = vec![
        ("Action ID", action.id.clone()),
        ("Device ID", action.device_id.clone()),
        ("Action Type", action.action_type.to_string()),
        ("Status", status),
        ("Initiated", format_time(&action.initiated_at)),
    ];
    match action.completed_at {
        Some(completed) => {
            pairs.push(("Completed", format_time(&completed)));
            let secs = (completed - action.initiated_at).num_milliseconds() as f64 / 1000.0;
            pairs.push(("Duration", format!("{:.2}s", secs)));
        }
        None => pairs.push(("Completed", "In progress...".to_string())),
    }
    if !action.params.is_empty() {
        let params: Vec<String> = action
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        pairs.push(("Parameters", params.join(", ")));
    }
    if let Some(error) = &action.error_message {
        pairs.push(("Error", error.clone()));
    }
    pairs
}
