//! CLI argument definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use stride_types::ActivityRange;
use time::OffsetDateTime;

use crate::util::parse_timestamp;

/// Default service URL, matching the service's default bind address.
pub const DEFAULT_SERVER: &str = "http://127.0.0.1:8000";

/// Output format for commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Reusable device arguments
#[derive(Debug, Clone, Args)]
pub struct DeviceArgs {
    /// Device identifier, or use STRIDE_DEVICE env var
    #[arg(short, long, env = "STRIDE_DEVICE")]
    pub device: Option<String>,
}

/// Reusable output format arguments
#[derive(Debug, Clone, Args)]
pub struct OutputArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

impl OutputArgs {
    /// Resolve the format: the global `--json` flag wins.
    pub fn resolve(&self, json: bool) -> OutputFormat {
        if json { OutputFormat::Json } else { self.format }
    }
}

/// Timeline window and paging arguments
#[derive(Debug, Clone, Default, Args)]
pub struct RangeArgs {
    /// Only entries stamped at or after this RFC 3339 time
    #[arg(long, value_parser = parse_timestamp)]
    pub since: Option<OffsetDateTime>,

    /// Only entries stamped at or before this RFC 3339 time
    #[arg(long, value_parser = parse_timestamp)]
    pub until: Option<OffsetDateTime>,

    /// Show at most this many entries
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,

    /// Skip this many entries first
    #[arg(long)]
    pub offset: Option<u32>,
}

impl RangeArgs {
    pub fn to_range(&self) -> ActivityRange {
        ActivityRange {
            since: self.since,
            until: self.until,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

#[derive(Parser)]
#[command(name = "stride")]
#[command(author, version, about = "CLI for the Stride step tracker", long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output as JSON (shorthand for --format json)
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Base URL of the stride-service
    #[arg(
        short,
        long,
        global = true,
        env = "STRIDE_SERVER",
        default_value = DEFAULT_SERVER
    )]
    pub server: String,

    /// Write output to file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Stream a simulated walk through the step detector and post the deltas
    Simulate {
        #[command(flatten)]
        device: DeviceArgs,

        /// Stop after this many seconds (runs until Ctrl+C when omitted)
        #[arg(short = 't', long)]
        duration: Option<u64>,

        /// Accelerometer sample rate in Hz
        #[arg(short, long, default_value = "50")]
        rate: f64,

        /// Seconds between step deltas sent to the service
        #[arg(short = 'i', long, default_value = "5")]
        send_interval: u64,

        /// Seconds between alert polls
        #[arg(long, default_value = "10")]
        alert_interval: u64,

        /// Walking cadence in steps per second
        #[arg(long, default_value = "2.0")]
        cadence: f64,

        /// Simulate a phone lying still instead of walking
        #[arg(long, conflicts_with = "cadence")]
        idle: bool,

        /// Seed for reproducible sensor noise
        #[arg(long)]
        seed: Option<u64>,

        /// Generate the whole duration at once, with simulated timestamps
        #[arg(long, requires = "duration")]
        fast: bool,
    },

    /// Show a device's activity timeline, in arrival order
    Activity {
        #[command(flatten)]
        device: DeviceArgs,

        #[command(flatten)]
        range: RangeArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Show today's analytics for a device
    Report {
        #[command(flatten)]
        device: DeviceArgs,

        /// Body weight in kilograms (service default when omitted)
        #[arg(short, long)]
        weight: Option<f64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Pop the oldest pending alert for a device
    Alert {
        #[command(flatten)]
        device: DeviceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Delete everything the service stores for a device
    Reset {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// List devices known to the service
    Devices {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Check that the service is up
    Health {
        #[command(flatten)]
        output: OutputArgs,
    },
}
