//! Watch command - follow the live action event stream

use std::sync::atomic::Ordering;

use anyhow::Result;
use fleet_client::{ActionEvent, FleetClient};
use futures::StreamExt;
use tracing::debug;

use crate::output::{colored_action_status, format_time, OutputContext, OutputFormat};

pub async fn watch(
    client: &FleetClient,
    device_id: Option<&str>,
    ctx: &OutputContext,
) -> Result<()> {
    debug!(device_id = ?device_id, "Subscribing to action events");
    let mut events = client.events(device_id).await?;
    match device_id {
        Some(id) => ctx.info(&format!("Watching actions on device '{}'...", id)),
        None => ctx.info("Watching actions on all devices..."),
    }
    ctx.info("Press Ctrl+C to stop");

    let running = super::interrupt_flag()?;

    if ctx.format == OutputFormat::Csv {
        println!("timestamp,device_id,action_id,status,error");
    }

    while running.load(Ordering::SeqCst) {
        tokio::select! {
            event = events.next() => {
                match event {
                    Some(Ok(event)) => {
                        debug!(action_id = %event.action_id, status = %event.status, "Event received");
                        print_event(&event, ctx);
                    }
                    Some(Err(e)) => {
                        ctx.error(&format!("Stream error: {}", e));
                        break;
                    }
                    None => {
                        ctx.info("Stream ended");
                        break;
                    }
                }
            }
            _ = tokio::time::sleep(tokio::time::Duration::from_millis(100)) => {}
        }
    }

    Ok(())
}

fn print_event(event: &ActionEvent, ctx: &OutputContext) {
    match ctx.format {
        OutputFormat::Table => {
            let mut line = format!(
                "[{}] {} {} {}",
                format_time(&event.timestamp),
                event.device_id,
                event.action_id,
                colored_action_status(event.status)
            );
            if let Some(error) = &event.error {
                line.push_str(&format!(" ({})", error));
            }
            println!("{}", line);
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string(event) {
                println!("{}", json);
            }
        }
        OutputFormat::Csv => {
            println!(
                "{},{},{},{},{}",
                event.timestamp.to_rfc3339(),
                event.device_id,
                event.action_id,
                event.status,
                event.error.as_deref().unwrap_or_default()
            );
        }
    }
}
