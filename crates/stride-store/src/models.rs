//! Data models for stored data.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use stride_types::ActivityEntry;

/// A device stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredDevice {
    /// Device identifier.
    pub device_id: String,
    /// Timestamp of the earliest entry reported by the device.
    #[serde(with = "time::serde::rfc3339")]
    pub first_seen: OffsetDateTime,
    /// Timestamp of the latest entry reported by the device.
    #[serde(with = "time::serde::rfc3339")]
    pub last_seen: OffsetDateTime,
    /// Number of stored entries.
    pub entry_count: u64,
}

/// An activity row stored in the database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredActivity {
    /// Database row ID; increases with arrival order.
    pub id: i64,
    /// Device identifier.
    pub device_id: String,
    /// When the delta was reported.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    /// Steps since the previous report.
    pub steps: u32,
}

impl StoredActivity {
    /// Convert to an ActivityEntry.
    pub fn to_entry(&self) -> ActivityEntry {
        ActivityEntry::new(self.timestamp, self.steps)
    }
}
