//! Local persistence for Stride activity data.
//!
//! This crate provides SQLite-based storage for per-device step timelines
//! and the per-device alert queue.
//!
//! # Features
//!
//! - Append-only activity timelines, one row per reported delta
//! - Per-device FIFO alert queue
//! - Atomic per-device reset
//! - Query by device and time range, with pagination
//! - Implements [`stride_core::ActivitySource`] for the analytics engine
//!
//! # Example
//!
//! ```
//! use stride_store::Store;
//! use stride_types::ActivityEntry;
//! use time::macros::datetime;
//!
//! let store = Store::open_in_memory()?;
//! store.append_activity("phone_1", &ActivityEntry::new(datetime!(2025-06-01 10:00 UTC), 12))?;
//!
//! let timeline = store.activity("phone_1")?;
//! assert_eq!(timeline.len(), 1);
//! # Ok::<(), stride_store::Error>(())
//! ```

mod error;
mod models;
mod queries;
mod schema;
mod store;

pub use error::{Error, Result};
pub use models::{StoredActivity, StoredDevice};
pub use queries::ActivityQuery;
pub use store::Store;

/// Default database path following platform conventions.
///
/// - Linux: `~/.local/share/stride/activity.db`
/// - macOS: `~/Library/Application Support/stride/activity.db`
/// - Windows: `C:\Users\<user>\AppData\Local\stride\activity.db`
pub fn default_db_path() -> std::path::PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join("stride")
        .join("activity.db")
}
