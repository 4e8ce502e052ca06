//! Simulate command implementation.
//!
//! Plays the part of a phone: synthetic accelerometer samples go through the
//! step detector, the session batches detected steps into deltas on the send
//! interval, and the deltas are posted to the service. Pending alerts are
//! polled on their own interval, like the phone client does.
//!
//! In `--fast` mode the whole duration is generated at once against a manual
//! clock, ending at the current time, so a day's worth of walking can be
//! seeded in seconds.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use stride_core::service_client::ServiceClient;
use stride_core::{
    DetectorConfig, ManualClock, SessionConfig, StepDetector, StepSession, WalkingProfile,
    WalkingSimulator,
};
use stride_types::StepPacket;
use time::OffsetDateTime;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::commands::alert::format_alert_text;
use crate::util::{connect, format_timestamp, require_device};

/// Arguments for the simulate command.
pub struct SimulateArgs {
    pub device: Option<String>,
    pub duration: Option<Duration>,
    pub rate_hz: f64,
    pub send_interval: Duration,
    pub alert_interval: Duration,
    pub profile: WalkingProfile,
    pub seed: Option<u64>,
    pub fast: bool,
    pub quiet: bool,
    pub no_color: bool,
}

/// Totals for one simulated session.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    pub samples: u64,
    pub steps_detected: u64,
    pub packets_sent: u64,
    pub steps_sent: u64,
    pub send_failures: u64,
    pub alerts: u64,
}

pub async fn cmd_simulate(server: &str, args: SimulateArgs) -> Result<()> {
    let device_id = require_device(args.device.clone())?;
    let client = connect(server)?;

    if !client.is_reachable().await {
        bail!(
            "Service not reachable at {}.\n\
             Start it with 'stride-service' or point --server at a running instance.",
            client.base_url()
        );
    }

    if !args.quiet {
        eprintln!(
            "Simulating {} -> {} ({} Hz, deltas every {}s{})",
            device_id,
            client.base_url(),
            args.rate_hz,
            args.send_interval.as_secs(),
            if args.fast { ", fast" } else { ", Ctrl+C to stop" }
        );
    }

    let stats = run_simulation(&client, &device_id, &args).await?;

    if !args.quiet {
        eprintln!(
            "Detected {} steps from {} samples; sent {} steps in {} packets ({} failed), {} alerts",
            stats.steps_detected,
            stats.samples,
            stats.steps_sent,
            stats.packets_sent,
            stats.send_failures,
            stats.alerts
        );
    }
    Ok(())
}

/// Run a session against `client` until the duration ends or Ctrl+C.
pub async fn run_simulation(
    client: &ServiceClient,
    device_id: &str,
    args: &SimulateArgs,
) -> Result<SimulationStats> {
    let detector_config = DetectorConfig::new().sample_rate_hz(args.rate_hz);
    let session_config = SessionConfig::new(device_id).send_interval(args.send_interval);
    let mut simulator = match args.seed {
        Some(seed) => WalkingSimulator::seeded(args.profile, seed),
        None => WalkingSimulator::from_entropy(args.profile),
    };
    let mut uplink = Uplink {
        client,
        device_id,
        quiet: args.quiet,
        no_color: args.no_color,
        stats: SimulationStats::default(),
    };

    if args.fast {
        let duration = args
            .duration
            .context("--fast needs a --duration to simulate")?;
        let start = OffsetDateTime::now_utc() - duration;
        let clock = Arc::new(ManualClock::new(start));
        let detector = StepDetector::with_clock(detector_config, Arc::clone(&clock))?;
        let mut session = StepSession::new(session_config, detector)?;

        let total_samples = (duration.as_secs_f64() * args.rate_hz).round() as u64;
        let mut last_alert_poll = start;
        for (i, sample) in simulator.samples(args.rate_hz).take(total_samples as usize).enumerate() {
            let now = start + Duration::from_secs_f64(i as f64 / args.rate_hz);
            clock.set(now);
            uplink.stats.samples += 1;

            if let Some(packet) = session.push(sample) {
                uplink.send(&packet).await;
            }
            if now - last_alert_poll >= args.alert_interval {
                uplink.poll_alert().await;
                last_alert_poll = now;
            }
        }

        if let Some(packet) = session.flush() {
            uplink.send(&packet).await;
        }
        uplink.poll_alert().await;
        uplink.stats.steps_detected = session.detector().total_steps();
    } else {
        let detector = StepDetector::new(detector_config)?;
        let mut ticker = tokio::time::interval(detector.sample_period());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut session = StepSession::new(session_config, detector)?;

        let deadline = args.duration.map(|d| Instant::now() + d);
        let mut last_alert_poll = Instant::now();
        let mut samples = simulator.samples(args.rate_hz);

        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);

        loop {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            tokio::select! {
                _ = &mut ctrl_c => {
                    if !args.quiet {
                        eprintln!("\nStopping...");
                    }
                    break;
                }
                _ = ticker.tick() => {}
            }

            let Some(sample) = samples.next() else {
                break;
            };
            uplink.stats.samples += 1;

            if let Some(packet) = session.push(sample) {
                uplink.send(&packet).await;
            }
            if last_alert_poll.elapsed() >= args.alert_interval {
                uplink.poll_alert().await;
                last_alert_poll = Instant::now();
            }
        }

        if let Some(packet) = session.flush() {
            uplink.send(&packet).await;
        }
        uplink.stats.steps_detected = session.detector().total_steps();
    }

    Ok(uplink.stats)
}

/// Posts deltas and polls alerts, keeping count.
struct Uplink<'a> {
    client: &'a ServiceClient,
    device_id: &'a str,
    quiet: bool,
    no_color: bool,
    stats: SimulationStats,
}

impl Uplink<'_> {
    /// Send one delta. Failed sends are reported and their steps dropped.
    async fn send(&mut self, packet: &StepPacket) {
        match self.client.send_steps(packet).await {
            Ok(_) => {
                self.stats.packets_sent += 1;
                self.stats.steps_sent += u64::from(packet.steps);
                if !self.quiet {
                    println!(
                        "Sent {} steps at {}",
                        packet.steps,
                        format_timestamp(packet.timestamp)
                    );
                }
            }
            Err(e) => {
                self.stats.send_failures += 1;
                warn!("Error sending data: {}", e);
            }
        }
    }

    async fn poll_alert(&mut self) {
        match self.client.alert(self.device_id).await {
            Ok(Some(message)) => {
                self.stats.alerts += 1;
                print!("{}", format_alert_text(Some(&message), self.no_color));
            }
            Ok(None) => debug!(device_id = self.device_id, "No pending alerts"),
            Err(e) => warn!("Error checking alerts: {}", e),
        }
    }
}
