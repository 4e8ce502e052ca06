//! Synthetic accelerometer data.
//!
//! [`WalkingSimulator`] produces the kind of stream a phone in a pocket
//! would: gravity plus a sinusoidal bounce at the step frequency, with
//! uniform noise on the magnitude and on each axis. Useful for demos and
//! for exercising the detector end to end.
//!
//! # Example
//!
//! ```
//! use stride_core::simulate::{WalkingProfile, WalkingSimulator};
//!
//! let mut sim = WalkingSimulator::seeded(WalkingProfile::default(), 7);
//! let sample = sim.sample_at(0.125);
//! assert!(sample.magnitude() > 5.0);
//! ```

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use stride_types::AccelerationSample;

/// Shape of the simulated gait.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WalkingProfile {
    /// Steps per second.
    pub step_frequency_hz: f64,
    /// Resting magnitude.
    pub gravity: f64,
    /// Peak bounce above and below gravity.
    pub amplitude: f64,
    /// Half-width of the uniform noise added to the magnitude.
    pub magnitude_noise: f64,
    /// Half-width of the uniform noise added to each axis.
    pub axis_noise: f64,
}

impl Default for WalkingProfile {
    fn default() -> Self {
        Self {
            step_frequency_hz: 2.0,
            gravity: 9.8,
            amplitude: 1.5,
            magnitude_noise: 0.3,
            axis_noise: 0.2,
        }
    }
}

impl WalkingProfile {
    /// A phone lying still: no bounce, sensor noise only.
    pub fn idle() -> Self {
        Self {
            amplitude: 0.0,
            ..Self::default()
        }
    }
}

/// How the magnitude is split over the axes (x, y, z).
const AXIS_WEIGHTS: [f64; 3] = [0.6, 0.3, 0.1];

/// Generator of walking-like accelerometer samples.
#[derive(Debug, Clone)]
pub struct WalkingSimulator {
    profile: WalkingProfile,
    rng: StdRng,
}

impl WalkingSimulator {
    /// Reproducible simulator.
    pub fn seeded(profile: WalkingProfile, seed: u64) -> Self {
        Self {
            profile,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Simulator seeded from the operating system.
    pub fn from_entropy(profile: WalkingProfile) -> Self {
        Self {
            profile,
            rng: StdRng::from_os_rng(),
        }
    }

    /// The gait being simulated.
    pub fn profile(&self) -> &WalkingProfile {
        &self.profile
    }

    /// The sample at `t_secs` seconds into the walk.
    pub fn sample_at(&mut self, t_secs: f64) -> AccelerationSample {
        let p = self.profile;
        let phase = 2.0 * std::f64::consts::PI * p.step_frequency_hz * t_secs;
        let magnitude = p.gravity + p.amplitude * phase.sin() + self.jitter(p.magnitude_noise);

        let [wx, wy, wz] = AXIS_WEIGHTS;
        AccelerationSample::new(
            magnitude * wx + self.jitter(p.axis_noise),
            magnitude * wy + self.jitter(p.axis_noise),
            magnitude * wz + self.jitter(p.axis_noise),
        )
    }

    /// An endless stream of samples spaced `1 / sample_rate_hz` apart.
    pub fn samples(
        &mut self,
        sample_rate_hz: f64,
    ) -> impl Iterator<Item = AccelerationSample> + '_ {
        let period = 1.0 / sample_rate_hz;
        (0u64..).map(move |i| self.sample_at(i as f64 * period))
    }

    fn jitter(&mut self, half_width: f64) -> f64 {
        if half_width > 0.0 {
            self.rng.random_range(-half_width..=half_width)
        } else {
            0.0
        }
    }
}
