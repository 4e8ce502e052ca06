//! HTTP REST API for the Stride step tracker.
//!
//! This crate provides a service that:
//! - Accepts step-count deltas posted by phones and simulators
//! - Stores per-device timelines in the local database
//! - Queues an inactivity alert when two consecutive reports are far apart
//! - Serves timelines, alerts and today's analytics as JSON
//!
//! # REST API Endpoints
//!
//! - `GET /` - Liveness banner
//! - `GET /api/health` - Service health check
//! - `GET /api/devices` - List all known devices
//! - `POST /data` - Submit a step delta (`{"device_id", "steps", "timestamp"}`)
//! - `GET /user/{device_id}/activity` - A device's timeline in arrival order,
//!   optionally narrowed by `since`/`until` and paged by `limit`/`offset`
//! - `POST /user/{device_id}/reset` - Forget a device
//! - `GET /alert/{device_id}` - Pop the oldest pending alert
//! - `GET /analytics/{device_id}/today?weight_kg=` - Today's analytics
//!
//! # Configuration
//!
//! The service reads configuration from `~/.config/stride/server.toml`:
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:8000"
//!
//! [storage]
//! path = "~/.local/share/stride/activity.db"
//!
//! [alerts]
//! inactivity_threshold_secs = 180
//!
//! [analytics]
//! pace_window_secs = 60
//! calorie_window_secs = 300
//! history_days = 21
//! default_weight_kg = 75.0
//! ```

pub mod api;
pub mod config;
pub mod state;

pub use config::{AlertsConfig, Config, ConfigError, ServerConfig, StorageConfig};
pub use state::AppState;
