//! Devices command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use stride_core::service_client::DeviceSummary;

use crate::cli::OutputFormat;
use crate::util::{connect, format_timestamp, to_json, write_output};

pub async fn cmd_devices(
    server: &str,
    format: OutputFormat,
    output: Option<&PathBuf>,
) -> Result<()> {
    let client = connect(server)?;
    let devices = client
        .devices()
        .await
        .context("Failed to list devices")?;

    let content = match format {
        OutputFormat::Json => to_json(&devices)?,
        OutputFormat::Text => format_devices_text(&devices),
    };

    write_output(output, &content)
}

fn format_devices_text(devices: &[DeviceSummary]) -> String {
    if devices.is_empty() {
        return "No devices have reported yet\n".to_string();
    }

    let width = devices
        .iter()
        .map(|d| d.device_id.len())
        .max()
        .unwrap_or(0)
        .max("DEVICE".len());

    let mut out = format!("{:<width$}  {:>7}  LAST SEEN\n", "DEVICE", "ENTRIES");
    for device in devices {
        out.push_str(&format!(
            "{:<width$}  {:>7}  {}\n",
            device.device_id,
            device.entry_count,
            format_timestamp(device.last_seen)
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn test_format_devices_text_empty() {
        assert_eq!(format_devices_text(&[]), "No devices have reported yet\n");
    }

    #[test]
    fn test_format_devices_text_aligns_columns() {
        let devices = vec![DeviceSummary {
            device_id: "phone_1".to_string(),
            first_seen: datetime!(2025-06-01 09:00 UTC),
            last_seen: datetime!(2025-06-01 10:00 UTC),
            entry_count: 42,
        }];

        let text = format_devices_text(&devices);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "DEVICE   ENTRIES  LAST SEEN");
        assert_eq!(lines[1], "phone_1       42  2025-06-01T10:00:00Z");
    }
}
