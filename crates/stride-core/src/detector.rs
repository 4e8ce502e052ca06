//! Streaming step detection.
//!
//! [`StepDetector`] turns a stream of accelerometer samples into discrete
//! step events. Each sample's magnitude goes into a fixed-size sliding
//! window; once the window is full the window mean is subtracted (removing
//! gravity and slow drift) and a step is accepted when the remainder exceeds
//! the threshold and at least `min_step_interval` has passed since the last
//! accepted step.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use stride_core::detector::{DetectorConfig, StepDetector};
//! use stride_core::clock::ManualClock;
//! use time::macros::datetime;
//!
//! let clock = ManualClock::new(datetime!(2025-06-01 10:00 UTC));
//! let mut detector = StepDetector::with_clock(DetectorConfig::default(), &clock).unwrap();
//!
//! // Warm-up: no step can be emitted until the window is full.
//! for _ in 0..20 {
//!     assert_eq!(detector.update(0.0, 0.0, 9.8), 0);
//!     clock.advance(detector.sample_period());
//! }
//! assert!(detector.is_warmed_up());
//!
//! // A spike well above the window mean is a step.
//! assert_eq!(detector.update(0.0, 0.0, 12.0), 1);
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use time::OffsetDateTime;
use tracing::trace;

use stride_types::AccelerationSample;

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};

/// Default sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE_HZ: f64 = 50.0;

/// Default sliding window length in samples.
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// Default detection threshold, in the units of the sample magnitude.
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Default minimum time between two accepted steps.
pub const DEFAULT_MIN_STEP_INTERVAL: Duration = Duration::from_millis(300);

/// Construction parameters for a [`StepDetector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorConfig {
    /// Rate at which the caller feeds samples. Only used to derive
    /// [`StepDetector::sample_period`]; the detector never paces itself.
    pub sample_rate_hz: f64,
    /// Number of magnitudes in the moving-average window.
    pub window_size: usize,
    /// Minimum mean-removed magnitude for a step.
    pub threshold: f64,
    /// Debounce interval between accepted steps.
    pub min_step_interval: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: DEFAULT_SAMPLE_RATE_HZ,
            window_size: DEFAULT_WINDOW_SIZE,
            threshold: DEFAULT_THRESHOLD,
            min_step_interval: DEFAULT_MIN_STEP_INTERVAL,
        }
    }
}

impl DetectorConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the sample rate in Hz.
    #[must_use]
    pub fn sample_rate_hz(mut self, rate: f64) -> Self {
        self.sample_rate_hz = rate;
        self
    }

    /// Set the window size in samples.
    #[must_use]
    pub fn window_size(mut self, size: usize) -> Self {
        self.window_size = size;
        self
    }

    /// Set the detection threshold.
    #[must_use]
    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the debounce interval.
    #[must_use]
    pub fn min_step_interval(mut self, interval: Duration) -> Self {
        self.min_step_interval = interval;
        self
    }

    /// Check the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the sample rate is not a finite
    /// positive number, the window is empty, or the threshold is not finite.
    pub fn validate(&self) -> Result<()> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "sample_rate_hz must be a positive number, got {}",
                self.sample_rate_hz
            )));
        }
        if self.window_size == 0 {
            return Err(Error::InvalidConfig(
                "window_size must be at least 1".to_string(),
            ));
        }
        if !self.threshold.is_finite() {
            return Err(Error::InvalidConfig(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Moving-average step detector.
///
/// One detector belongs to one sampling session; it is `&mut self` only and
/// does no locking. The clock is read once per [`update`](Self::update).
#[derive(Debug)]
pub struct StepDetector<C: Clock = SystemClock> {
    config: DetectorConfig,
    window: VecDeque<f64>,
    last_step: Option<OffsetDateTime>,
    clock: C,
    total_steps: u64,
    rejected_samples: u64,
}

impl StepDetector<SystemClock> {
    /// Create a detector reading the system clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is invalid.
    pub fn new(config: DetectorConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> StepDetector<C> {
    /// Create a detector reading the given clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration is invalid.
    pub fn with_clock(config: DetectorConfig, clock: C) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            window: VecDeque::with_capacity(config.window_size),
            config,
            last_step: None,
            clock,
            total_steps: 0,
            rejected_samples: 0,
        })
    }

    /// Feed one sample, timestamped by the detector's clock.
    ///
    /// Returns 1 if a step was accepted, 0 otherwise.
    pub fn update(&mut self, ax: f64, ay: f64, az: f64) -> u32 {
        self.update_sample(AccelerationSample::new(ax, ay, az))
    }

    /// Feed one sample, timestamped by the detector's clock.
    pub fn update_sample(&mut self, sample: AccelerationSample) -> u32 {
        let now = self.clock.now();
        self.update_at(sample, now)
    }

    /// Feed one sample observed at `at`.
    ///
    /// A sample with a non-finite magnitude is rejected: it is not added to
    /// the window, the rejection counter is incremented, and 0 is returned.
    pub fn update_at(&mut self, sample: AccelerationSample, at: OffsetDateTime) -> u32 {
        let magnitude = sample.magnitude();
        if !magnitude.is_finite() {
            self.rejected_samples += 1;
            trace!(
                rejected = self.rejected_samples,
                "Rejected non-finite accelerometer sample"
            );
            return 0;
        }

        if self.window.len() == self.config.window_size {
            self.window.pop_front();
        }
        self.window.push_back(magnitude);

        if !self.is_warmed_up() {
            return 0;
        }

        let mean = self.window.iter().sum::<f64>() / self.window.len() as f64;
        let filtered = magnitude - mean;
        if filtered <= self.config.threshold {
            return 0;
        }

        if let Some(last) = self.last_step {
            let elapsed = (at - last).whole_nanoseconds();
            if elapsed < self.config.min_step_interval.as_nanos() as i128 {
                trace!(filtered, "Step suppressed by debounce");
                return 0;
            }
        }

        self.last_step = Some(at);
        self.total_steps += 1;
        trace!(filtered, total = self.total_steps, "Step detected");
        1
    }

    /// The intended time between two samples (`1 / sample_rate_hz`).
    pub fn sample_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.config.sample_rate_hz)
    }

    /// Whether the window is full and detection is active.
    pub fn is_warmed_up(&self) -> bool {
        self.window.len() >= self.config.window_size
    }

    /// Steps accepted since construction or the last [`reset`](Self::reset).
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Non-finite samples rejected since construction or the last reset.
    pub fn rejected_samples(&self) -> u64 {
        self.rejected_samples
    }

    /// When the last step was accepted.
    pub fn last_step(&self) -> Option<OffsetDateTime> {
        self.last_step
    }

    /// Number of magnitudes currently in the window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// The detector's configuration.
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// The detector's clock.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Clear the window, the last-step time and the counters.
    pub fn reset(&mut self) {
        self.window.clear();
        self.last_step = None;
        self.total_steps = 0;
        self.rejected_samples = 0;
    }
}
