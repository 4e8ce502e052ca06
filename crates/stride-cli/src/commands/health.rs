//! Health command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use stride_core::service_client::HealthResponse;

use crate::cli::OutputFormat;
use crate::util::{connect, format_timestamp, to_json, write_output};

pub async fn cmd_health(
    server: &str,
    format: OutputFormat,
    output: Option<&PathBuf>,
    no_color: bool,
) -> Result<()> {
    let client = connect(server)?;
    let health = client
        .health()
        .await
        .with_context(|| format!("Service at {} is not healthy", client.base_url()))?;

    let content = match format {
        OutputFormat::Json => to_json(&health)?,
        OutputFormat::Text => format_health_text(client.base_url(), &health, no_color),
    };

    write_output(output, &content)
}

fn format_health_text(url: &str, health: &HealthResponse, no_color: bool) -> String {
    let status = if no_color {
        health.status.clone()
    } else {
        health.status.green().to_string()
    };
    format!(
        "{}: {} (v{}, {})\n",
        url,
        status,
        health.version,
        format_timestamp(health.timestamp)
    )
}
