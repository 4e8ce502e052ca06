//! Activity command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use stride_types::{ActivityEntry, ActivityRange};

use crate::cli::OutputFormat;
use crate::util::{connect, format_timestamp, require_device, to_json, write_output};

pub async fn cmd_activity(
    server: &str,
    device: Option<String>,
    range: ActivityRange,
    format: OutputFormat,
    output: Option<&PathBuf>,
) -> Result<()> {
    let device_id = require_device(device)?;
    let client = connect(server)?;

    let entries = client
        .activity_in(&device_id, &range)
        .await
        .context("Failed to fetch activity")?;

    let content = match format {
        OutputFormat::Json => to_json(&entries)?,
        OutputFormat::Text => format_activity_text(&device_id, &entries),
    };

    write_output(output, &content)
}

/// One line per entry plus a total.
fn format_activity_text(device_id: &str, entries: &[ActivityEntry]) -> String {
    if entries.is_empty() {
        return format!("No activity recorded for {}\n", device_id);
    }

    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{}  {:>6}\n",
            format_timestamp(entry.timestamp),
            entry.steps
        ));
    }

    let total: u64 = entries.iter().map(|e| u64::from(e.steps)).sum();
    out.push_str(&format!(
        "{} entries, {} steps total\n",
        entries.len(),
        total
    ));
    out
}
