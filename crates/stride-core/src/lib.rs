//! Step detection and activity analytics for the Stride step tracker.
//!
//! This crate holds the two computational engines of Stride, plus the small
//! pieces that drive them:
//!
//! # Features
//!
//! - **Step detection**: moving-average high-pass filter with threshold and
//!   debounce over a live accelerometer stream
//! - **Step sessions**: accumulate detected steps and flush per-send deltas
//! - **Analytics**: pace, MET-based calories, undercount correction and a
//!   same-day forecast over a device's activity timeline
//! - **Inactivity alerts**: flag devices that report after a long pause
//! - **Simulation**: synthetic walking accelerometer data
//! - **Service client** (feature `service-client`): HTTP client for
//!   stride-service
//!
//! Time is read through the [`Clock`] trait everywhere, so all of the above
//! can be driven by a fixed or manual clock in tests.
//!
//! # Quick Start
//!
//! ```
//! use stride_core::{ActivityAnalytics, AnalyticsConfig, DetectorConfig, StepDetector};
//! use stride_core::clock::FixedClock;
//! use stride_types::ActivityEntry;
//! use time::macros::datetime;
//!
//! // Detect steps from a live stream.
//! let mut detector = StepDetector::new(DetectorConfig::default())?;
//! let steps = detector.update(0.1, 0.2, 9.8);
//! assert_eq!(steps, 0);
//!
//! // Derive metrics from a stored timeline.
//! let now = datetime!(2025-06-01 06:00 UTC);
//! let analytics = ActivityAnalytics::with_clock(AnalyticsConfig::default(), FixedClock::new(now));
//! let entries = vec![ActivityEntry::new(datetime!(2025-06-01 05:59:30 UTC), 40)];
//! let report = analytics.report(&entries, 75.0);
//! assert_eq!(report.pace_spm, 40.0);
//! # Ok::<(), stride_core::Error>(())
//! ```

pub mod analytics;
pub mod clock;
pub mod detector;
pub mod error;
pub mod inactivity;
pub mod session;
pub mod simulate;
pub mod traits;

#[cfg(feature = "service-client")]
pub mod service_client;

pub use analytics::{ActivityAnalytics, AnalyticsConfig, DeviceAnalytics};
pub use clock::{Clock, FixedClock, ManualClock, SharedClock, SystemClock};
pub use detector::{DetectorConfig, StepDetector};
pub use error::{Error, Result};
pub use inactivity::InactivityRule;
pub use session::{SessionConfig, StepSession};
pub use simulate::{WalkingProfile, WalkingSimulator};
pub use traits::ActivitySource;

// Re-export from stride-types
pub use stride_types::{
    AccelerationSample, ActivityEntry, AnalyticsReport, DailyTotal, ParseError, StepPacket,
};
