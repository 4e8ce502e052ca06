//! Trait abstractions over activity storage.
//!
//! The analytics engine never talks to a storage engine directly. It reads
//! a device's timeline through [`ActivitySource`], which is implemented by
//! the SQLite store and by an in-memory map for tests.

use std::collections::HashMap;
use std::convert::Infallible;

use stride_types::ActivityEntry;

/// Read access to per-device activity timelines.
///
/// # Contract
///
/// - Entries are returned ascending by timestamp (ties in arrival order).
/// - An unknown device yields an empty timeline, never an error.
/// - A returned timeline is one consistent snapshot: a concurrent append is
///   either wholly present or wholly absent.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use stride_core::ActivitySource;
/// use stride_types::ActivityEntry;
/// use time::macros::datetime;
///
/// let mut timelines: HashMap<String, Vec<ActivityEntry>> = HashMap::new();
/// timelines.insert(
///     "phone_1".to_string(),
///     vec![ActivityEntry::new(datetime!(2025-06-01 10:00 UTC), 12)],
/// );
///
/// assert_eq!(timelines.activity("phone_1").unwrap().len(), 1);
/// assert!(timelines.activity("unknown").unwrap().is_empty());
/// ```
pub trait ActivitySource {
    /// Error raised by the underlying storage.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the full timeline of `device_id`, oldest first.
    fn activity(&self, device_id: &str) -> Result<Vec<ActivityEntry>, Self::Error>;
}

impl ActivitySource for HashMap<String, Vec<ActivityEntry>> {
    type Error = Infallible;

    fn activity(&self, device_id: &str) -> Result<Vec<ActivityEntry>, Self::Error> {
        let mut entries = self.get(device_id).cloned().unwrap_or_default();
        entries.sort_by_key(|e| e.timestamp);
        Ok(entries)
    }
}

impl<S: ActivitySource + ?Sized> ActivitySource for &S {
    type Error = S::Error;

    fn activity(&self, device_id: &str) -> Result<Vec<ActivityEntry>, Self::Error> {
        (**self).activity(device_id)
    }
}
