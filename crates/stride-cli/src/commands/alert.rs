//! Alert command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use crate::cli::OutputFormat;
use crate::util::{connect, require_device, to_json, write_output};

pub async fn cmd_alert(
    server: &str,
    device: Option<String>,
    format: OutputFormat,
    output: Option<&PathBuf>,
    no_color: bool,
) -> Result<()> {
    let device_id = require_device(device)?;
    let client = connect(server)?;

    let alert = client
        .alert(&device_id)
        .await
        .context("Failed to fetch alert")?;

    let content = match format {
        OutputFormat::Json => to_json(&serde_json::json!({ "alert": alert }))?,
        OutputFormat::Text => format_alert_text(alert.as_deref(), no_color),
    };

    write_output(output, &content)
}

pub(crate) fn format_alert_text(alert: Option<&str>, no_color: bool) -> String {
    match alert {
        Some(message) if no_color => format!("ALERT: {}\n", message),
        Some(message) => format!("{} {}\n", "ALERT:".red().bold(), message),
        None => "No pending alerts\n".to_string(),
    }
}
