//! Inactivity detection.
//!
//! When a device reports after a long pause, the gap between its two most
//! recent entries exceeds the threshold and the device is due a nudge.

use std::time::Duration;

use stride_types::ActivityEntry;

/// Default gap after which a device counts as inactive.
pub const DEFAULT_INACTIVITY_THRESHOLD: Duration = Duration::from_secs(3 * 60);

/// Message queued for an inactive device.
pub const INACTIVITY_MESSAGE: &str = "Move! You've been inactive for a while.";

/// Rule deciding whether a timeline warrants an inactivity alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InactivityRule {
    /// Gap between the last two entries above which the rule fires.
    pub threshold: Duration,
    /// Alert text.
    pub message: String,
}

impl Default for InactivityRule {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_INACTIVITY_THRESHOLD,
            message: INACTIVITY_MESSAGE.to_string(),
        }
    }
}

impl InactivityRule {
    /// Rule with the default message and the given threshold.
    pub fn new(threshold: Duration) -> Self {
        Self {
            threshold,
            ..Self::default()
        }
    }

    /// Check the two most recent entries of `entries`.
    ///
    /// Returns the alert message when the gap between them is strictly
    /// greater than the threshold. Fewer than two entries never alert.
    ///
    /// ```
    /// use stride_core::inactivity::InactivityRule;
    /// use stride_types::ActivityEntry;
    /// use time::macros::datetime;
    ///
    /// let rule = InactivityRule::default();
    /// let entries = [
    ///     ActivityEntry::new(datetime!(2025-06-01 10:00 UTC), 10),
    ///     ActivityEntry::new(datetime!(2025-06-01 10:05 UTC), 4),
    /// ];
    /// assert!(rule.evaluate(&entries).is_some());
    /// ```
    pub fn evaluate(&self, entries: &[ActivityEntry]) -> Option<&str> {
        let [.., previous, last] = entries else {
            return None;
        };
        let gap = (last.timestamp - previous.timestamp).whole_nanoseconds();
        if gap > self.threshold.as_nanos() as i128 {
            Some(&self.message)
        } else {
            None
        }
    }
}
