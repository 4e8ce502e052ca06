//! Core types for step tracking data.

use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};

use crate::error::ParseError;

/// Maximum length of a device identifier in bytes.
pub const MAX_DEVICE_ID_LEN: usize = 128;

/// A single tri-axial accelerometer reading.
///
/// Units are whatever the sensor reports (typically m/s²) as long as all
/// samples fed to one detector agree. Samples carry no timestamp of their
/// own; their arrival order is their identity.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AccelerationSample {
    /// Acceleration along the x axis.
    pub x: f64,
    /// Acceleration along the y axis.
    pub y: f64,
    /// Acceleration along the z axis.
    pub z: f64,
}

impl AccelerationSample {
    /// Create a sample from its three axes.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm of the three axes.
    ///
    /// ```
    /// use stride_types::AccelerationSample;
    ///
    /// let sample = AccelerationSample::new(3.0, 4.0, 0.0);
    /// assert_eq!(sample.magnitude(), 5.0);
    /// ```
    #[must_use]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Whether all three axes are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<(f64, f64, f64)> for AccelerationSample {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

/// One stored step-count delta for a device.
///
/// `steps` is the number of steps accumulated since the previous send, not
/// a running total. Entries are immutable once created and are ordered by
/// timestamp, then by step count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActivityEntry {
    /// When the delta was reported (UTC).
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
    /// Steps accumulated since the previous report.
    pub steps: u32,
}

impl ActivityEntry {
    /// Create an entry, normalizing the timestamp to UTC.
    ///
    /// ```
    /// use stride_types::ActivityEntry;
    /// use time::macros::datetime;
    ///
    /// let entry = ActivityEntry::new(datetime!(2025-03-01 10:00 +02:00), 12);
    /// assert_eq!(entry.timestamp, datetime!(2025-03-01 08:00 UTC));
    /// ```
    #[must_use]
    pub fn new(timestamp: OffsetDateTime, steps: u32) -> Self {
        Self {
            timestamp: timestamp.to_offset(UtcOffset::UTC),
            steps,
        }
    }

    /// The UTC calendar day this entry falls on.
    #[must_use]
    pub fn date(&self) -> Date {
        self.timestamp.to_offset(UtcOffset::UTC).date()
    }
}

impl fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} steps at {}", self.steps, self.timestamp)
    }
}

/// A step-count delta as posted by a sample source.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepPacket {
    /// Identifier of the reporting device.
    pub device_id: String,
    /// Steps accumulated since the previous packet.
    pub steps: u32,
    /// When the packet was produced.
    #[cfg_attr(feature = "serde", serde(with = "time::serde::rfc3339"))]
    pub timestamp: OffsetDateTime,
}

impl StepPacket {
    /// Create a new packet.
    pub fn new(device_id: impl Into<String>, steps: u32, timestamp: OffsetDateTime) -> Self {
        Self {
            device_id: device_id.into(),
            steps,
            timestamp,
        }
    }

    /// Check that the packet can be stored.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidDeviceId`] if the device id is empty,
    /// blank, or longer than [`MAX_DEVICE_ID_LEN`] bytes.
    pub fn validate(&self) -> Result<(), ParseError> {
        validate_device_id(&self.device_id)
    }

    /// Convert into the entry that gets stored for the device.
    #[must_use]
    pub fn to_entry(&self) -> ActivityEntry {
        ActivityEntry::new(self.timestamp, self.steps)
    }
}

/// Validate a device identifier.
///
/// # Errors
///
/// Returns [`ParseError::InvalidDeviceId`] if the id is blank or longer than
/// [`MAX_DEVICE_ID_LEN`] bytes.
pub fn validate_device_id(device_id: &str) -> Result<(), ParseError> {
    if device_id.trim().is_empty() {
        return Err(ParseError::InvalidDeviceId(
            "device id cannot be empty".to_string(),
        ));
    }
    if device_id.len() > MAX_DEVICE_ID_LEN {
        return Err(ParseError::InvalidDeviceId(format!(
            "device id is {} bytes, maximum is {}",
            device_id.len(),
            MAX_DEVICE_ID_LEN
        )));
    }
    Ok(())
}

/// A time window and page over one device's timeline.
///
/// Bounds are inclusive and select on the reported timestamp; the page is
/// taken in arrival order. The default selects everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActivityRange {
    /// Only entries stamped at or after this time.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            with = "time::serde::rfc3339::option",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub since: Option<OffsetDateTime>,
    /// Only entries stamped at or before this time.
    #[cfg_attr(
        feature = "serde",
        serde(
            default,
            with = "time::serde::rfc3339::option",
            skip_serializing_if = "Option::is_none"
        )
    )]
    pub until: Option<OffsetDateTime>,
    /// At most this many entries.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub limit: Option<u32>,
    /// Skip this many entries first.
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub offset: Option<u32>,
}

impl ActivityRange {
    /// Whether no bound or page is set.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        *self == Self::default()
    }
}

/// Total steps for one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DailyTotal {
    /// The calendar day.
    pub date: Date,
    /// Sum of all deltas reported on that day.
    pub steps: u64,
}

/// Derived metrics for one device, recomputed on every request.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalyticsReport {
    /// Steps per minute over the trailing pace window.
    pub pace_spm: f64,
    /// Sum of today's raw deltas.
    pub raw_steps_today: u64,
    /// Today's count after undercount correction.
    pub corrected_steps_today: u64,
    /// Estimated kilocalories burned today.
    pub calories_today: f64,
    /// Forecast of today's final step count.
    pub predicted_daily_steps: u64,
}
