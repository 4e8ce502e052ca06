//! REST API endpoints for the stride-service.
//!
//! Sample sources post step deltas to `/data`; dashboards read timelines,
//! alerts and analytics back.
//!
//! # Concurrency and Lock Acquisition
//!
//! - **`state.config`** (RwLock): read lock, copied out and released
//!   immediately.
//! - **`state.store`** (Mutex): held for the database work of one request
//!   only. Analytics are computed on a snapshot after the lock is released.
//!
//! When both are needed, `config` is read first.
//!
//! ## Error Handling
//!
//! All endpoints return structured JSON errors via [`AppError`]. Invalid
//! device ids and weights return HTTP 400; store failures return HTTP 500.
//!
//! # Example
//!
//! ```ignore
//! use stride_service::api;
//!
//! let app = api::router().with_state(state);
//! ```

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use stride_core::{ActivityAnalytics, Clock};
use stride_store::StoredDevice;
use stride_types::{ActivityEntry, ActivityRange, AnalyticsReport, StepPacket};
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::state::AppState;

/// Create the API router.
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/devices", get(list_devices))
        // Sample source endpoints
        .route("/data", post(post_data))
        .route("/alert/{device_id}", get(pop_alert))
        // Per-device views
        .route("/user/{device_id}/activity", get(get_activity))
        .route("/user/{device_id}/reset", post(reset_device))
        .route("/analytics/{device_id}/today", get(get_analytics))
}

/// Liveness banner.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

async fn root() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "server running",
    })
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Health check endpoint.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: state.clock.now(),
    })
}

/// Acknowledgement for write endpoints.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub ok: bool,
}

impl AckResponse {
    const OK: Self = Self { ok: true };
}

/// Accept one step delta from a sample source.
///
/// The packet is appended to the device's timeline, then the inactivity rule
/// runs over the updated timeline and may queue an alert.
///
/// # Errors
///
/// Returns [`AppError::BadRequest`] if the device id is invalid.
async fn post_data(
    State(state): State<Arc<AppState>>,
    Json(packet): Json<StepPacket>,
) -> Result<Json<AckResponse>, AppError> {
    if let Err(e) = packet.validate() {
        warn!(device_id = %packet.device_id, "Rejected packet: {}", e);
        return Err(AppError::BadRequest(e.to_string()));
    }

    let rule = state.config.read().await.alerts.rule();

    let store = state.store.lock().await;
    store.append_activity(&packet.device_id, &packet.to_entry())?;

    let timeline = store.activity(&packet.device_id)?;
    if let Some(message) = rule.evaluate(&timeline) {
        debug!(device_id = %packet.device_id, "Inactivity detected");
        store.push_alert(&packet.device_id, message, state.clock.now())?;
    }

    Ok(Json(AckResponse::OK))
}

/// Get a device's timeline in arrival order. Unknown devices give `[]`.
///
/// Optional `since`/`until` (RFC 3339) narrow it by reported timestamp;
/// `limit`/`offset` page through it.
async fn get_activity(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    Query(range): Query<ActivityRange>,
) -> Result<Json<Vec<ActivityEntry>>, AppError> {
    let store = state.store.lock().await;
    let entries = store.activity_in(&device_id, range)?;
    Ok(Json(entries))
}

/// Forget everything stored for a device.
async fn reset_device(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<AckResponse>, AppError> {
    let store = state.store.lock().await;
    store.reset_device(&device_id)?;
    Ok(Json(AckResponse::OK))
}

/// Oldest pending alert, if any.
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub alert: Option<String>,
}

/// Pop the oldest pending alert of a device.
async fn pop_alert(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
) -> Result<Json<AlertResponse>, AppError> {
    let store = state.store.lock().await;
    let alert = store.pop_alert(&device_id)?;
    Ok(Json(AlertResponse { alert }))
}

/// Query parameters for the analytics endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    /// Body weight in kilograms; the configured default when omitted.
    pub weight_kg: Option<f64>,
}

impl AnalyticsQuery {
    /// Resolve the weight, rejecting values the calorie model cannot use.
    pub fn weight_or(&self, default_kg: f64) -> Result<f64, AppError> {
        let weight = self.weight_kg.unwrap_or(default_kg);
        if !weight.is_finite() || weight <= 0.0 {
            return Err(AppError::BadRequest(format!(
                "Invalid weight_kg {}: must be a positive number",
                weight
            )));
        }
        Ok(weight)
    }
}

/// Today's analytics for a device.
///
/// # Errors
///
/// - Returns [`AppError::BadRequest`] if `weight_kg` is not a positive number
/// - Returns [`AppError::Store`] if the database query fails
async fn get_analytics(
    State(state): State<Arc<AppState>>,
    Path(device_id): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<AnalyticsReport>, AppError> {
    let config = state.config.read().await.analytics;
    let weight_kg = query.weight_or(config.default_weight_kg)?;

    let entries = {
        let store = state.store.lock().await;
        store.activity(&device_id)?
    };

    let analytics = ActivityAnalytics::with_clock(config, state.clock.clone());
    Ok(Json(analytics.report(&entries, weight_kg)))
}

/// List every device that has reported, most recently active first.
async fn list_devices(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<StoredDevice>>, AppError> {
    let store = state.store.lock().await;
    let devices = store.list_devices()?;
    Ok(Json(devices))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Store(stride_store::Error),
}

impl From<stride_store::Error> for AppError {
    fn from(e: stride_store::Error) -> Self {
        match e {
            stride_store::Error::InvalidDeviceId(e) => AppError::BadRequest(e.to_string()),
            other => AppError::Store(other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Store(e) => {
                warn!("Store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use stride_core::{FixedClock, ManualClock};
    use time::macros::datetime;
    use tower::ServiceExt;

    use crate::config::Config;

    fn create_test_state() -> Arc<AppState> {
        create_test_state_at(datetime!(2025-06-01 12:00 UTC))
    }

    fn create_test_state_at(now: OffsetDateTime) -> Arc<AppState> {
        let store = stride_store::Store::open_in_memory().unwrap();
        AppState::with_clock(store, Config::default(), Arc::new(FixedClock::new(now)))
    }

    async fn response_body(response: axum::response::Response) -> String {
        let body = response.into_body();
        let bytes = body.collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn send(
        state: &Arc<AppState>,
        request: Request<Body>,
    ) -> (StatusCode, serde_json::Value) {
        let response = router()
            .with_state(state.clone())
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let body = response_body(response).await;
        let json = serde_json::from_str(&body).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn get_json(state: &Arc<AppState>, uri: &str) -> (StatusCode, serde_json::Value) {
        send(
            state,
            Request::builder().uri(uri).body(Body::empty()).unwrap(),
        )
        .await
    }

    async fn post_json(
        state: &Arc<AppState>,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        send(
            state,
            Request::builder()
                .method("POST")
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    async fn post_steps(state: &Arc<AppState>, device_id: &str, steps: u32, at: &str) {
        let (status, json) = post_json(
            state,
            "/data",
            serde_json::json!({ "device_id": device_id, "steps": steps, "timestamp": at }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_root_endpoint() {
        let state = create_test_state();
        let (status, json) = get_json(&state, "/").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "server running");
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let state = create_test_state();
        let (status, json) = get_json(&state, "/api/health").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert!(json["version"].is_string());
        assert_eq!(json["timestamp"], "2025-06-01T12:00:00Z");
    }

    #[tokio::test]
    async fn test_activity_unknown_device_is_empty() {
        let state = create_test_state();
        let (status, json) = get_json(&state, "/user/nobody/activity").await;

        assert_eq!(status, StatusCode::OK);
        assert!(json.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_post_data_appends_to_timeline() {
        let state = create_test_state();
        post_steps(&state, "phone_1", 8, "2025-06-01T10:00:10Z").await;
        post_steps(&state, "phone_1", 12, "2025-06-01T10:00:00Z").await;

        let (status, json) = get_json(&state, "/user/phone_1/activity").await;
        assert_eq!(status, StatusCode::OK);

        // Arrival order, not timestamp order.
        let entries = json.as_array().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["steps"], 8);
        assert_eq!(entries[1]["steps"], 12);
        assert_eq!(entries[1]["timestamp"], "2025-06-01T10:00:00Z");
    }

    #[tokio::test]
    async fn test_activity_range_and_paging() {
        let state = create_test_state();
        for (steps, at) in [
            (1, "2025-06-01T10:00:00Z"),
            (2, "2025-06-01T10:01:00Z"),
            (3, "2025-06-01T10:02:00Z"),
            (4, "2025-06-01T10:03:00Z"),
        ] {
            post_steps(&state, "phone_1", steps, at).await;
        }

        let steps_of = |json: serde_json::Value| -> Vec<u64> {
            json.as_array()
                .unwrap()
                .iter()
                .map(|e| e["steps"].as_u64().unwrap())
                .collect()
        };

        let (status, json) = get_json(
            &state,
            "/user/phone_1/activity?since=2025-06-01T10:01:00Z&until=2025-06-01T10:02:00Z",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(steps_of(json), vec![2, 3]);

        let (_, json) = get_json(&state, "/user/phone_1/activity?limit=2&offset=1").await;
        assert_eq!(steps_of(json), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_activity_rejects_bad_range() {
        let state = create_test_state();
        let (status, _) = get_json(&state, "/user/phone_1/activity?since=yesterday").await;
        assert!(status.is_client_error());

        let (status, _) = get_json(&state, "/user/phone_1/activity?limit=-1").await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_post_data_rejects_blank_device_id() {
        let state = create_test_state();
        let (status, json) = post_json(
            &state,
            "/data",
            serde_json::json!({ "device_id": "  ", "steps": 3, "timestamp": "2025-06-01T10:00:00Z" }),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("device id"));

        let store = state.store.lock().await;
        assert_eq!(store.count_activity(None).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_post_data_rejects_negative_steps() {
        let state = create_test_state();
        let (status, _) = post_json(
            &state,
            "/data",
            serde_json::json!({ "device_id": "phone_1", "steps": -4, "timestamp": "2025-06-01T10:00:00Z" }),
        )
        .await;

        assert!(status.is_client_error());
        let store = state.store.lock().await;
        assert_eq!(store.count_activity(None).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_inactivity_alert_queued_once() {
        let state = create_test_state();
        post_steps(&state, "phone_1", 10, "2025-06-01T10:00:00Z").await;
        post_steps(&state, "phone_1", 4, "2025-06-01T10:05:00Z").await;

        let (status, json) = get_json(&state, "/alert/phone_1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["alert"], "Move! You've been inactive for a while.");

        let (_, json) = get_json(&state, "/alert/phone_1").await;
        assert!(json["alert"].is_null());
    }

    #[tokio::test]
    async fn test_late_packet_does_not_refire_alert() {
        let state = create_test_state();
        post_steps(&state, "phone_1", 10, "2025-06-01T10:00:00Z").await;
        post_steps(&state, "phone_1", 4, "2025-06-01T10:05:00Z").await;
        post_steps(&state, "phone_1", 2, "2025-06-01T10:01:00Z").await;

        let store = state.store.lock().await;
        assert_eq!(store.pending_alerts("phone_1").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_alert_for_short_gaps() {
        let state = create_test_state();
        post_steps(&state, "phone_1", 10, "2025-06-01T10:00:00Z").await;
        post_steps(&state, "phone_1", 10, "2025-06-01T10:03:00Z").await;

        let (_, json) = get_json(&state, "/alert/phone_1").await;
        assert!(json["alert"].is_null());
    }

    #[tokio::test]
    async fn test_alert_threshold_from_config() {
        let state = create_test_state();
        state.config.write().await.alerts.inactivity_threshold_secs = 60;

        post_steps(&state, "phone_1", 10, "2025-06-01T10:00:00Z").await;
        post_steps(&state, "phone_1", 10, "2025-06-01T10:02:00Z").await;

        let (_, json) = get_json(&state, "/alert/phone_1").await;
        assert!(json["alert"].is_string());
    }

    #[tokio::test]
    async fn test_analytics_report() {
        let state = create_test_state_at(datetime!(2025-06-01 06:00 UTC));
        post_steps(&state, "phone_1", 60, "2025-06-01T05:59:20Z").await;
        post_steps(&state, "phone_1", 60, "2025-06-01T05:59:40Z").await;

        let (status, json) = get_json(&state, "/analytics/phone_1/today?weight_kg=70").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pace_spm"], 120.0);
        assert_eq!(json["raw_steps_today"], 120);
        assert_eq!(json["corrected_steps_today"], 120);
        assert_eq!(json["predicted_daily_steps"], 300);
        // 2.15 MET at 70 kg over the one-minute floor.
        let calories = json["calories_today"].as_f64().unwrap();
        assert!((calories - 2.63).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_analytics_default_weight_from_config() {
        let state = create_test_state_at(datetime!(2025-06-01 06:00 UTC));
        post_steps(&state, "phone_1", 60, "2025-06-01T05:59:20Z").await;

        let (_, default_weight) = get_json(&state, "/analytics/phone_1/today").await;
        let (_, explicit) = get_json(&state, "/analytics/phone_1/today?weight_kg=75").await;
        assert_eq!(default_weight["calories_today"], explicit["calories_today"]);
    }

    #[tokio::test]
    async fn test_analytics_unknown_device_is_zero() {
        let state = create_test_state();
        let (status, json) = get_json(&state, "/analytics/nobody/today").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["pace_spm"], 0.0);
        assert_eq!(json["raw_steps_today"], 0);
        assert_eq!(json["corrected_steps_today"], 0);
        assert_eq!(json["calories_today"], 0.0);
        assert_eq!(json["predicted_daily_steps"], 0);
    }

    #[tokio::test]
    async fn test_analytics_rejects_invalid_weight() {
        let state = create_test_state();
        for weight in ["0", "-70", "NaN", "inf"] {
            let uri = format!("/analytics/phone_1/today?weight_kg={weight}");
            let (status, json) = get_json(&state, &uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "weight {weight}");
            assert!(json["error"].as_str().unwrap().contains("weight_kg"));
        }
    }

    #[tokio::test]
    async fn test_analytics_follows_clock() {
        let clock = Arc::new(ManualClock::new(datetime!(2025-06-01 10:00 UTC)));
        let store = stride_store::Store::open_in_memory().unwrap();
        let state = AppState::with_clock(store, Config::default(), clock.clone());

        post_steps(&state, "phone_1", 30, "2025-06-01T09:59:30Z").await;
        let (_, json) = get_json(&state, "/analytics/phone_1/today").await;
        assert_eq!(json["pace_spm"], 30.0);

        clock.advance(std::time::Duration::from_secs(120));
        let (_, json) = get_json(&state, "/analytics/phone_1/today").await;
        assert_eq!(json["pace_spm"], 0.0);
        assert_eq!(json["raw_steps_today"], 30);
    }

    #[tokio::test]
    async fn test_reset_clears_timeline_and_alerts() {
        let state = create_test_state();
        post_steps(&state, "phone_1", 10, "2025-06-01T10:00:00Z").await;
        post_steps(&state, "phone_1", 4, "2025-06-01T10:05:00Z").await;

        let (status, json) = post_json(&state, "/user/phone_1/reset", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);

        let (_, activity) = get_json(&state, "/user/phone_1/activity").await;
        assert!(activity.as_array().unwrap().is_empty());

        let (_, alert) = get_json(&state, "/alert/phone_1").await;
        assert!(alert["alert"].is_null());

        let (_, report) = get_json(&state, "/analytics/phone_1/today").await;
        assert_eq!(report["raw_steps_today"], 0);
    }

    #[tokio::test]
    async fn test_reset_unknown_device_is_ok() {
        let state = create_test_state();
        let (status, json) = post_json(&state, "/user/nobody/reset", serde_json::json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["ok"], true);
    }

    #[tokio::test]
    async fn test_list_devices() {
        let state = create_test_state();
        let (_, json) = get_json(&state, "/api/devices").await;
        assert!(json.as_array().unwrap().is_empty());

        post_steps(&state, "phone_1", 5, "2025-06-01T10:00:00Z").await;
        post_steps(&state, "phone_2", 5, "2025-06-01T11:00:00Z").await;
        post_steps(&state, "phone_1", 5, "2025-06-01T09:00:00Z").await;

        let (status, json) = get_json(&state, "/api/devices").await;
        assert_eq!(status, StatusCode::OK);

        let devices = json.as_array().unwrap();
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0]["device_id"], "phone_2");
        assert_eq!(devices[1]["device_id"], "phone_1");
        assert_eq!(devices[1]["entry_count"], 2);
        assert_eq!(devices[1]["first_seen"], "2025-06-01T09:00:00Z");
        assert_eq!(devices[1]["last_seen"], "2025-06-01T10:00:00Z");
    }

    #[test]
    fn test_store_invalid_device_maps_to_bad_request() {
        let err = stride_store::Error::InvalidDeviceId(
            stride_types::ParseError::InvalidDeviceId("empty".to_string()),
        );
        assert!(matches!(AppError::from(err), AppError::BadRequest(_)));
    }
}
