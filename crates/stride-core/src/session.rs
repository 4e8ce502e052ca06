//! Step sessions.
//!
//! A [`StepSession`] is the sampling loop of a phone-side client without the
//! I/O: it feeds samples into a [`StepDetector`], accumulates the steps not
//! yet reported, and hands out one [`StepPacket`] delta per send interval.
//! What to do with the packet (post it, queue it, drop it) is up to the
//! caller.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use stride_core::clock::ManualClock;
//! use stride_core::detector::{DetectorConfig, StepDetector};
//! use stride_core::session::{SessionConfig, StepSession};
//! use time::macros::datetime;
//!
//! let clock = ManualClock::new(datetime!(2025-06-01 10:00 UTC));
//! let detector = StepDetector::with_clock(DetectorConfig::default(), &clock).unwrap();
//! let mut session = StepSession::new(SessionConfig::new("phone_1"), detector).unwrap();
//!
//! assert!(session.push((0.0, 0.0, 9.8).into()).is_none());
//! assert_eq!(session.pending_steps(), 0);
//! ```

use std::time::Duration;

use time::OffsetDateTime;
use tracing::debug;

use stride_types::{AccelerationSample, StepPacket, validate_device_id};

use crate::clock::{Clock, SystemClock};
use crate::detector::StepDetector;
use crate::error::{Error, Result};

/// Default time between two flushes.
pub const DEFAULT_SEND_INTERVAL: Duration = Duration::from_secs(5);

/// Session parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Device id stamped on every packet.
    pub device_id: String,
    /// Minimum time between two flushes.
    pub send_interval: Duration,
}

impl SessionConfig {
    /// Configuration for `device_id` with the default send interval.
    pub fn new(device_id: impl Into<String>) -> Self {
        Self {
            device_id: device_id.into(),
            send_interval: DEFAULT_SEND_INTERVAL,
        }
    }

    /// Set the send interval.
    #[must_use]
    pub fn send_interval(mut self, interval: Duration) -> Self {
        self.send_interval = interval;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidData`] for an unusable device id and
    /// [`Error::InvalidConfig`] for a zero send interval.
    pub fn validate(&self) -> Result<()> {
        validate_device_id(&self.device_id)?;
        if self.send_interval.is_zero() {
            return Err(Error::InvalidConfig(
                "send_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Accumulates detected steps and flushes them as per-send deltas.
#[derive(Debug)]
pub struct StepSession<C: Clock = SystemClock> {
    config: SessionConfig,
    detector: StepDetector<C>,
    pending: u32,
    sent: u64,
    last_flush: OffsetDateTime,
}

impl<C: Clock> StepSession<C> {
    /// Start a session around `detector`. The first send interval starts now.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(config: SessionConfig, detector: StepDetector<C>) -> Result<Self> {
        config.validate()?;
        let last_flush = detector.clock().now();
        Ok(Self {
            config,
            detector,
            pending: 0,
            sent: 0,
            last_flush,
        })
    }

    /// Feed one sample, timestamped by the detector's clock.
    ///
    /// Returns a packet when the send interval has elapsed and at least one
    /// step is pending. The interval restarts whenever it elapses, whether
    /// or not a packet was produced.
    pub fn push(&mut self, sample: AccelerationSample) -> Option<StepPacket> {
        let now = self.detector.clock().now();
        self.push_at(sample, now)
    }

    /// Feed one sample observed at `at`.
    pub fn push_at(&mut self, sample: AccelerationSample, at: OffsetDateTime) -> Option<StepPacket> {
        let steps = self.detector.update_at(sample, at);
        self.pending = self.pending.saturating_add(steps);

        let elapsed = (at - self.last_flush).whole_nanoseconds();
        if elapsed < self.config.send_interval.as_nanos() as i128 {
            return None;
        }
        self.last_flush = at;
        self.take(at)
    }

    /// Emit whatever is pending right away, e.g. when the session stops.
    pub fn flush(&mut self) -> Option<StepPacket> {
        let now = self.detector.clock().now();
        self.last_flush = now;
        self.take(now)
    }

    fn take(&mut self, at: OffsetDateTime) -> Option<StepPacket> {
        if self.pending == 0 {
            return None;
        }
        let steps = std::mem::take(&mut self.pending);
        self.sent += u64::from(steps);
        debug!(device_id = %self.config.device_id, steps, "Flushing step delta");
        Some(StepPacket::new(self.config.device_id.clone(), steps, at))
    }

    /// Steps detected but not yet flushed.
    pub fn pending_steps(&self) -> u32 {
        self.pending
    }

    /// Steps handed out in packets so far.
    pub fn sent_steps(&self) -> u64 {
        self.sent
    }

    /// The underlying detector.
    pub fn detector(&self) -> &StepDetector<C> {
        &self.detector
    }

    /// The session's configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}
