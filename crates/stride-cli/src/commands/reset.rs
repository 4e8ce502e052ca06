//! Reset command implementation.

use anyhow::{Context, Result};

use crate::util::{connect, require_device};

pub async fn cmd_reset(server: &str, device: Option<String>, quiet: bool) -> Result<()> {
    let device_id = require_device(device)?;
    let client = connect(server)?;

    client
        .reset(&device_id)
        .await
        .with_context(|| format!("Failed to reset {}", device_id))?;

    if !quiet {
        eprintln!("Reset {}: timeline and alerts cleared", device_id);
    }
    Ok(())
}
