//! Query builder for stored activity.
//!
//! # Example
//!
//! ```
//! use stride_store::{ActivityQuery, Store};
//! use time::{Duration, OffsetDateTime};
//!
//! let store = Store::open_in_memory()?;
//! let yesterday = OffsetDateTime::now_utc() - Duration::hours(24);
//!
//! // Last day of one device, one page of 50
//! let query = ActivityQuery::new()
//!     .device("phone_1")
//!     .since(yesterday)
//!     .limit(50);
//!
//! let rows = store.query_activity(&query)?;
//! assert!(rows.is_empty());
//! # Ok::<(), stride_store::Error>(())
//! ```

use stride_types::ActivityRange;
use time::OffsetDateTime;

/// Filters and paging over activity rows.
///
/// Rows come back in arrival order, the order the deltas were appended in,
/// whatever their timestamps say. The time filters select on the reported
/// timestamp but never reorder.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ActivityQuery {
    /// Filter by device ID.
    pub device_id: Option<String>,
    /// Window and page applied to the rows.
    pub range: ActivityRange,
    /// Latest arrivals first.
    pub newest_first: bool,
}

impl ActivityQuery {
    /// All rows of all devices, in arrival order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter by device ID.
    pub fn device(mut self, device_id: &str) -> Self {
        self.device_id = Some(device_id.to_string());
        self
    }

    /// Replace the window and page.
    pub fn range(mut self, range: ActivityRange) -> Self {
        self.range = range;
        self
    }

    /// Only rows stamped at or after this time.
    pub fn since(mut self, time: OffsetDateTime) -> Self {
        self.range.since = Some(time);
        self
    }

    /// Only rows stamped at or before this time.
    pub fn until(mut self, time: OffsetDateTime) -> Self {
        self.range.until = Some(time);
        self
    }

    /// At most this many rows.
    pub fn limit(mut self, limit: u32) -> Self {
        self.range.limit = Some(limit);
        self
    }

    /// Skip this many rows first.
    pub fn offset(mut self, offset: u32) -> Self {
        self.range.offset = Some(offset);
        self
    }

    /// Latest arrivals first.
    pub fn newest_first(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub(crate) fn build_where(&self) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref device_id) = self.device_id {
            conditions.push("device_id = ?");
            params.push(Box::new(device_id.clone()));
        }

        if let Some(since) = self.range.since {
            conditions.push("timestamp >= ?");
            params.push(Box::new(clamped_nanos(since)));
        }

        if let Some(until) = self.range.until {
            conditions.push("timestamp <= ?");
            params.push(Box::new(clamped_nanos(until)));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    pub(crate) fn build_sql(&self) -> String {
        let (where_clause, _) = self.build_where();
        let order = if self.newest_first { "DESC" } else { "ASC" };

        let mut sql = String::from("SELECT id, device_id, timestamp, steps FROM activity");
        if !where_clause.is_empty() {
            sql.push(' ');
            sql.push_str(&where_clause);
        }
        sql.push_str(&format!(" ORDER BY id {order}"));

        match (self.range.limit, self.range.offset) {
            (Some(limit), Some(offset)) => sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}")),
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // SQLite only accepts OFFSET after a LIMIT.
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }

        sql
    }
}

/// Unix nanoseconds for a filter bound, saturating at the storable range.
fn clamped_nanos(time: OffsetDateTime) -> i64 {
    let nanos = time.unix_timestamp_nanos();
    i64::try_from(nanos).unwrap_or(if nanos < 0 { i64::MIN } else { i64::MAX })
}
