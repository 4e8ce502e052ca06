//! Main store implementation.

use std::path::Path;

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row};
use time::OffsetDateTime;
use tracing::{debug, info};

use stride_core::ActivitySource;
use stride_types::{ActivityEntry, ActivityRange, validate_device_id};

use crate::error::{Error, Result};
use crate::models::{StoredActivity, StoredDevice};
use crate::queries::ActivityQuery;
use crate::schema;

/// SQLite-based store for activity timelines and pending alerts.
///
/// A `Store` wraps one connection and is not `Sync`; share it behind a
/// mutex. Every multi-statement write runs in one transaction, so readers
/// never observe a half-applied append or reset.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open or create a database at the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| Error::CreateDirectory {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        info!("Opening database at {}", path.display());
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        schema::initialize(&conn)?;

        Ok(Self { conn })
    }

    /// Open the default database location.
    pub fn open_default() -> Result<Self> {
        Self::open(crate::default_db_path())
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }
}

// Activity operations
impl Store {
    /// Append one entry to a device's timeline.
    ///
    /// Registers the device on first use. Entries are never merged or
    /// deduplicated; two identical entries give two rows. Returns the row id.
    pub fn append_activity(&self, device_id: &str, entry: &ActivityEntry) -> Result<i64> {
        validate_device_id(device_id)?;
        let timestamp = to_nanos(entry.timestamp)?;

        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO devices (id, first_seen, last_seen) VALUES (?1, ?2, ?2)
             ON CONFLICT(id) DO UPDATE SET
                first_seen = MIN(first_seen, ?2),
                last_seen = MAX(last_seen, ?2)",
            rusqlite::params![device_id, timestamp],
        )?;
        tx.execute(
            "INSERT INTO activity (device_id, timestamp, steps) VALUES (?1, ?2, ?3)",
            rusqlite::params![device_id, timestamp, entry.steps],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        debug!(device_id, steps = entry.steps, id, "Appended activity");
        Ok(id)
    }

    /// The full timeline of a device, in arrival order.
    ///
    /// Entries come back in the order they were appended, even when a late
    /// delta carries an older timestamp. An unknown device has an empty
    /// timeline.
    pub fn activity(&self, device_id: &str) -> Result<Vec<ActivityEntry>> {
        self.activity_in(device_id, ActivityRange::default())
    }

    /// A window and page of a device's timeline, in arrival order.
    pub fn activity_in(&self, device_id: &str, range: ActivityRange) -> Result<Vec<ActivityEntry>> {
        let rows = self.query_activity(&ActivityQuery::new().device(device_id).range(range))?;
        Ok(rows.iter().map(StoredActivity::to_entry).collect())
    }

    /// Query activity rows with filters.
    pub fn query_activity(&self, query: &ActivityQuery) -> Result<Vec<StoredActivity>> {
        let sql = query.build_sql();
        let (_, params) = query.build_where();

        debug!("Executing query: {}", sql);

        let params_ref: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_ref.as_slice(), |row| {
                Ok(StoredActivity {
                    id: row.get(0)?,
                    device_id: row.get(1)?,
                    timestamp: timestamp_column(row, 2)?,
                    steps: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Count activity rows, optionally for one device.
    pub fn count_activity(&self, device_id: Option<&str>) -> Result<u64> {
        let count: i64 = match device_id {
            Some(id) => self.conn.query_row(
                "SELECT COUNT(*) FROM activity WHERE device_id = ?",
                [id],
                |row| row.get(0),
            )?,
            None => self
                .conn
                .query_row("SELECT COUNT(*) FROM activity", [], |row| row.get(0))?,
        };
        Ok(count.max(0) as u64)
    }
}

// Device operations
impl Store {
    /// Get a device by ID.
    pub fn get_device(&self, device_id: &str) -> Result<Option<StoredDevice>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.first_seen, d.last_seen,
                    (SELECT COUNT(*) FROM activity a WHERE a.device_id = d.id)
             FROM devices d WHERE d.id = ?",
        )?;

        let device = stmt.query_row([device_id], device_from_row).optional()?;

        Ok(device)
    }

    /// List all devices, most recently active first.
    pub fn list_devices(&self) -> Result<Vec<StoredDevice>> {
        let mut stmt = self.conn.prepare(
            "SELECT d.id, d.first_seen, d.last_seen,
                    (SELECT COUNT(*) FROM activity a WHERE a.device_id = d.id)
             FROM devices d ORDER BY d.last_seen DESC, d.id ASC",
        )?;

        let devices = stmt
            .query_map([], device_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(devices)
    }

    /// Delete a device's timeline, pending alerts and device record.
    ///
    /// All three go in one transaction. Returns the number of activity rows
    /// removed; resetting an unknown device is not an error.
    pub fn reset_device(&self, device_id: &str) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute("DELETE FROM activity WHERE device_id = ?", [device_id])?;
        tx.execute("DELETE FROM alerts WHERE device_id = ?", [device_id])?;
        tx.execute("DELETE FROM devices WHERE id = ?", [device_id])?;
        tx.commit()?;

        info!(device_id, removed, "Reset device");
        Ok(removed)
    }
}

// Alert operations
impl Store {
    /// Queue an alert for a device, raised at `at`.
    pub fn push_alert(&self, device_id: &str, message: &str, at: OffsetDateTime) -> Result<()> {
        validate_device_id(device_id)?;
        let created_at = to_nanos(at)?;
        self.conn.execute(
            "INSERT INTO alerts (device_id, message, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![device_id, message, created_at],
        )?;
        debug!(device_id, message, "Queued alert");
        Ok(())
    }

    /// Remove and return the oldest pending alert of a device.
    pub fn pop_alert(&self, device_id: &str) -> Result<Option<String>> {
        let tx = self.conn.unchecked_transaction()?;
        let oldest: Option<(i64, String)> = tx
            .query_row(
                "SELECT id, message FROM alerts WHERE device_id = ? ORDER BY id ASC LIMIT 1",
                [device_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((id, message)) = oldest else {
            return Ok(None);
        };
        tx.execute("DELETE FROM alerts WHERE id = ?", [id])?;
        tx.commit()?;

        Ok(Some(message))
    }

    /// Pending alerts of a device, oldest first, without removing them.
    pub fn pending_alerts(&self, device_id: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT message FROM alerts WHERE device_id = ? ORDER BY id ASC")?;

        let messages = stmt
            .query_map([device_id], |row| row.get(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(messages)
    }
}

impl ActivitySource for Store {
    type Error = Error;

    fn activity(&self, device_id: &str) -> Result<Vec<ActivityEntry>> {
        Store::activity(self, device_id)
    }
}

fn to_nanos(timestamp: OffsetDateTime) -> Result<i64> {
    i64::try_from(timestamp.unix_timestamp_nanos())
        .map_err(|_| Error::InvalidTimestamp(format!("{timestamp} is out of range")))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<OffsetDateTime> {
    let nanos: i64 = row.get(idx)?;
    OffsetDateTime::from_unix_timestamp_nanos(i128::from(nanos))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn device_from_row(row: &Row<'_>) -> rusqlite::Result<StoredDevice> {
    Ok(StoredDevice {
        device_id: row.get(0)?,
        first_seen: timestamp_column(row, 1)?,
        last_seen: timestamp_column(row, 2)?,
        entry_count: row.get::<_, i64>(3)?.max(0) as u64,
    })
}
