//! Utility functions for CLI operations.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use stride_core::service_client::ServiceClient;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// Get device identifier, with helpful error message.
pub fn require_device(device: Option<String>) -> Result<String> {
    device.filter(|d| !d.trim().is_empty()).ok_or_else(|| {
        anyhow::anyhow!(
            "No device specified. Use --device <ID> or set STRIDE_DEVICE environment variable.\n\
             Run 'stride devices' to list devices known to the service."
        )
    })
}

/// Build a client for the service at `server`.
pub fn connect(server: &str) -> Result<ServiceClient> {
    ServiceClient::new(server).with_context(|| format!("Invalid server URL '{}'", server))
}

/// Write output to file or stdout.
pub fn write_output(output: Option<&PathBuf>, content: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write to {}", path.display()))?;
        }
        None => {
            print!("{}", content);
            io::stdout().flush()?;
        }
    }
    Ok(())
}

/// Pretty JSON followed by a newline.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let mut json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    json.push('\n');
    Ok(json)
}

/// Parse an RFC 3339 timestamp given on the command line.
pub fn parse_timestamp(value: &str) -> std::result::Result<OffsetDateTime, String> {
    OffsetDateTime::parse(value, &Rfc3339).map_err(|e| {
        format!("invalid timestamp '{value}': {e} (expected RFC 3339, e.g. 2025-06-01T10:00:00Z)")
    })
}

/// RFC 3339 rendering for text output, falling back to `Display`.
pub fn format_timestamp(at: OffsetDateTime) -> String {
    at.format(&Rfc3339).unwrap_or_else(|_| at.to_string())
}

/// Start an in-memory stride-service on an ephemeral port, returning its URL.
#[cfg(test)]
pub(crate) async fn spawn_test_service() -> String {
    use axum::Router;
    use stride_service::{AppState, Config, api};
    use stride_store::Store;

    let store = Store::open_in_memory().unwrap();
    let state = AppState::new(store, Config::default());
    let app = Router::new().merge(api::router()).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
