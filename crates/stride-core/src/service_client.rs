//! HTTP client for the stride-service REST API.
//!
//! Used by sample sources to post step deltas and poll alerts, and by the
//! CLI to read timelines and analytics.
//!
//! # Example
//!
//! ```no_run
//! use stride_core::service_client::ServiceClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ServiceClient::new("http://127.0.0.1:8000")?;
//!
//! let report = client.analytics("phone_1", Some(70.0)).await?;
//! println!("Steps today: {}", report.corrected_steps_today);
//!
//! if let Some(alert) = client.alert("phone_1").await? {
//!     println!("Alert: {alert}");
//! }
//! # Ok(())
//! # }
//! ```

use reqwest::{Client, Url};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use stride_types::{ActivityEntry, ActivityRange, AnalyticsReport, StepPacket};

/// HTTP client for the stride-service API.
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
    base_url: Url,
}

/// Error type for service client operations.
#[derive(Debug, thiserror::Error)]
pub enum ServiceClientError {
    /// The service is not reachable.
    #[error("Service not reachable at {url}: {source}")]
    NotReachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Invalid URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// API returned an error response.
    #[error("API error: {message}")]
    ApiError { status: u16, message: String },
}

/// Result type for service client operations.
pub type Result<T> = std::result::Result<T, ServiceClientError>;

// ==========================================================================
// Response Types
// ==========================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Acknowledgement returned by write endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub ok: bool,
}

/// Pending alert for a device, if any.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertResponse {
    pub alert: Option<String>,
}

/// A device known to the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceSummary {
    /// Device identifier.
    pub device_id: String,
    /// When the device first reported.
    #[serde(with = "time::serde::rfc3339")]
    pub first_seen: OffsetDateTime,
    /// When the device last reported.
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen: OffsetDateTime,
    /// Number of stored entries.
    pub entry_count: u64,
}

// ==========================================================================
// ServiceClient Implementation
// ==========================================================================

impl ServiceClient {
    /// Create a new service client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the stride-service (e.g., "http://127.0.0.1:8000")
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .map_err(ServiceClientError::Request)?;

        Self::with_client(base_url, client)
    }

    /// Create a client with a custom reqwest Client.
    pub fn with_client(base_url: &str, client: Client) -> Result<Self> {
        let trimmed = base_url.trim_end_matches('/');

        if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
            return Err(ServiceClientError::InvalidUrl(format!(
                "URL must start with http:// or https://, got: {}",
                base_url
            )));
        }

        let base_url = Url::parse(trimmed)
            .map_err(|e| ServiceClientError::InvalidUrl(format!("{trimmed}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(ServiceClientError::InvalidUrl(trimmed.to_string()));
        }

        Ok(Self { client, base_url })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Check if the service is reachable.
    pub async fn is_reachable(&self) -> bool {
        self.health().await.is_ok()
    }

    /// Get service health.
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = self.endpoint(&["api", "health"]);
        self.get(url).await
    }

    /// Post one step delta.
    pub async fn send_steps(&self, packet: &StepPacket) -> Result<AckResponse> {
        let url = self.endpoint(&["data"]);
        self.post_json(url, packet).await
    }

    /// Get the full timeline of a device.
    pub async fn activity(&self, device_id: &str) -> Result<Vec<ActivityEntry>> {
        self.activity_in(device_id, &ActivityRange::default()).await
    }

    /// Get a window and page of a device's timeline.
    pub async fn activity_in(
        &self,
        device_id: &str,
        range: &ActivityRange,
    ) -> Result<Vec<ActivityEntry>> {
        let url = self.activity_url(device_id, range)?;
        self.get(url).await
    }

    /// Delete all data of a device.
    pub async fn reset(&self, device_id: &str) -> Result<AckResponse> {
        let url = self.endpoint(&["user", device_id, "reset"]);
        self.post_empty(url).await
    }

    /// Pop the oldest pending alert of a device.
    pub async fn alert(&self, device_id: &str) -> Result<Option<String>> {
        let url = self.endpoint(&["alert", device_id]);
        let response: AlertResponse = self.get(url).await?;
        Ok(response.alert)
    }

    /// Get today's analytics for a device.
    pub async fn analytics(
        &self,
        device_id: &str,
        weight_kg: Option<f64>,
    ) -> Result<AnalyticsReport> {
        let mut url = self.endpoint(&["analytics", device_id, "today"]);
        if let Some(weight) = weight_kg {
            url.query_pairs_mut()
                .append_pair("weight_kg", &weight.to_string());
        }
        self.get(url).await
    }

    /// List known devices.
    pub async fn devices(&self) -> Result<Vec<DeviceSummary>> {
        let url = self.endpoint(&["api", "devices"]);
        self.get(url).await
    }

    // ======================================================================
    // Internal HTTP helpers
    // ======================================================================

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // `with_client` rejects cannot-be-a-base URLs.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn activity_url(&self, device_id: &str, range: &ActivityRange) -> Result<Url> {
        let mut url = self.endpoint(&["user", device_id, "activity"]);
        if range.is_unbounded() {
            return Ok(url);
        }

        let mut pairs = url.query_pairs_mut();
        for (name, bound) in [("since", range.since), ("until", range.until)] {
            if let Some(at) = bound {
                let formatted = at.format(&Rfc3339).map_err(|e| {
                    ServiceClientError::InvalidUrl(format!("cannot format {name} bound {at}: {e}"))
                })?;
                pairs.append_pair(name, &formatted);
            }
        }
        if let Some(limit) = range.limit {
            pairs.append_pair("limit", &limit.to_string());
        }
        if let Some(offset) = range.offset {
            pairs.append_pair("offset", &offset.to_string());
        }
        drop(pairs);
        Ok(url)
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            ServiceClientError::NotReachable {
                url: url.to_string(),
                source: e,
            }
        })?;

        self.handle_response(response).await
    }

    async fn post_empty<T: serde::de::DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.client.post(url.clone()).send().await.map_err(|e| {
            ServiceClientError::NotReachable {
                url: url.to_string(),
                source: e,
            }
        })?;

        self.handle_response(response).await
    }

    async fn post_json<T: serde::de::DeserializeOwned, B: Serialize>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T> {
        let response = self
            .client
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceClientError::NotReachable {
                url: url.to_string(),
                source: e,
            })?;

        self.handle_response(response).await
    }

    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            response.json().await.map_err(ServiceClientError::Request)
        } else {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(String::from))
                .unwrap_or_else(|| status.to_string());

            Err(ServiceClientError::ApiError {
                status: status.as_u16(),
                message,
            })
        }
    }
}
