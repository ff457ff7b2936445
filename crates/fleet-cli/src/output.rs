//! Output formatting for fleet-cli (table, json, csv)

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use fleet_client::{Action, ActionStatus, Device, DeviceStatus};
use serde::{Deserialize, Serialize};
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// ASCII table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
    /// CSV format
    Csv,
}

/// Context for output rendering
pub struct OutputContext {
    pub format: OutputFormat,
    pub quiet: bool,
}

impl OutputContext {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self { format, quiet }
    }

    /// Print a success message (unless in quiet mode)
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg.green());
        }
    }

    /// Print an info message (unless in quiet mode)
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("{}", msg);
        }
    }

    /// Print a warning message
    pub fn warn(&self, msg: &str) {
        eprintln!("{}", msg.yellow());
    }

    /// Print an error message
    pub fn error(&self, msg: &str) {
        eprintln!("{}", msg.red());
    }

    /// Print data in the configured format
    pub fn print<T: Tabled + Serialize>(&self, data: &[T]) {
        match self.format {
            OutputFormat::Table => {
                if data.is_empty() {
                    if !self.quiet {
                        println!("No data");
                    }
                } else {
                    println!("{}", Table::new(data));
                }
            }
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::to_string_pretty(data).unwrap_or_else(|_| "[]".to_string())
                );
            }
            OutputFormat::Csv => {
                if let Some(csv) = to_csv(data) {
                    print!("{}", csv);
                }
            }
        }
    }

    /// Print key-value pairs (for info/action commands)
    pub fn print_kv(&self, pairs: &[(&str, String)]) {
        match self.format {
            OutputFormat::Table => {
                for (key, value) in pairs {
                    println!("{}: {}", key.bold(), value);
                }
            }
            OutputFormat::Json => {
                let map: serde_json::Map<String, serde_json::Value> = pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.clone())))
                    .collect();
                println!(
                    "{}",
                    serde_json::to_string_pretty(&map).unwrap_or_else(|_| "{}".to_string())
                );
            }
            OutputFormat::Csv => {
                let keys: Vec<String> = pairs.iter().map(|(k, _)| escape_csv(k)).collect();
                println!("{}", keys.join(","));
                let values: Vec<String> = pairs.iter().map(|(_, v)| escape_csv(v)).collect();
                println!("{}", values.join(","));
            }
        }
    }
}

/// Render rows as CSV, header taken from the first row's fields
fn to_csv<T: Serialize>(data: &[T]) -> Option<String> {
    let first = serde_json::to_value(data.first()?).ok()?;
    let serde_json::Value::Object(map) = first else {
        return None;
    };
    let headers: Vec<String> = map.keys().cloned().collect();

    let mut out = headers.join(",");
    out.push('\n');
    for item in data {
        if let Ok(serde_json::Value::Object(row)) = serde_json::to_value(item) {
            let values: Vec<String> = headers
                .iter()
                .map(|h| match row.get(h) {
                    Some(serde_json::Value::String(s)) => escape_csv(s),
                    Some(serde_json::Value::Null) | None => String::new(),
                    Some(other) => escape_csv(&other.to_string()),
                })
                .collect();
            out.push_str(&values.join(","));
            out.push('\n');
        }
    }
    Some(out)
}

/// Escape a value for CSV output
fn escape_csv(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Timestamp for human-facing output
pub fn format_time(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn colored_device_status(status: DeviceStatus) -> String {
    let text = status.as_str();
    match status {
        DeviceStatus::Idle => text.green().to_string(),
        DeviceStatus::Busy | DeviceStatus::Updating => text.yellow().to_string(),
        DeviceStatus::Error => text.red().to_string(),
        DeviceStatus::Offline | DeviceStatus::Maintenance | DeviceStatus::Unknown => {
            text.dimmed().to_string()
        }
    }
}

pub fn colored_action_status(status: ActionStatus) -> String {
    let text = status.as_str();
    match status {
        ActionStatus::Completed => text.green().to_string(),
        ActionStatus::Failed => text.red().to_string(),
        ActionStatus::Pending | ActionStatus::Running => text.yellow().to_string(),
    }
}

// =============================================================================
// Display types for various commands
// =============================================================================

/// Device display for list command
#[derive(Debug, Tabled, Serialize)]
pub struct DeviceRow {
    #[tabled(rename = "Device ID")]
    pub id: String,
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    pub device_type: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Action")]
    pub action: String,
}

impl From<&Device> for DeviceRow {
    fn from(device: &Device) -> Self {
        Self {
            id: device.id.clone(),
            name: device.name.clone().unwrap_or_default(),
            device_type: device.device_type.clone().unwrap_or_default(),
            status: device.status.to_string(),
            action: device.current_action_id.clone().unwrap_or_default(),
        }
    }
}

/// Action display for history command
#[derive(Debug, Tabled, Serialize)]
pub struct ActionRow {
    #[tabled(rename = "Action ID")]
    pub id: String,
    #[tabled(rename = "Type")]
    #[serde(rename = "type")]
    pub action_type: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Initiated")]
    pub initiated: String,
    #[tabled(rename = "Completed")]
    pub completed: String,
}

impl From<&Action> for ActionRow {
    fn from(action: &Action) -> Self {
        Self {
            id: action.id.clone(),
            action_type: action.action_type.to_string(),
            status: action.status.to_string(),
            initiated: format_time(&action.initiated_at),
            completed: action
                .completed_at
                .as_ref()
                .map(format_time)
                .unwrap_or_default(),
        }
    }
}
