//! Stride CLI - drive a simulated phone and query the stride-service.

mod cli;
mod commands;
mod util;

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use stride_core::WalkingProfile;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use commands::SimulateArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // When quiet mode is enabled, suppress info-level logging
    let filter = if cli.quiet {
        EnvFilter::new("warn")
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let server = cli.server.as_str();
    let output = cli.output.as_ref();

    match cli.command {
        Commands::Simulate {
            device,
            duration,
            rate,
            send_interval,
            alert_interval,
            cadence,
            idle,
            seed,
            fast,
        } => {
            let profile = if idle {
                WalkingProfile::idle()
            } else {
                WalkingProfile {
                    step_frequency_hz: cadence,
                    ..WalkingProfile::default()
                }
            };
            commands::cmd_simulate(
                server,
                SimulateArgs {
                    device: device.device,
                    duration: duration.map(Duration::from_secs),
                    rate_hz: rate,
                    send_interval: Duration::from_secs(send_interval),
                    alert_interval: Duration::from_secs(alert_interval),
                    profile,
                    seed,
                    fast,
                    quiet: cli.quiet,
                    no_color: cli.no_color,
                },
            )
            .await
        }
        Commands::Activity {
            device,
            range,
            output: fmt,
        } => {
            commands::cmd_activity(
                server,
                device.device,
                range.to_range(),
                fmt.resolve(cli.json),
                output,
            )
            .await
        }
        Commands::Report {
            device,
            weight,
            output: fmt,
        } => {
            commands::cmd_report(
                server,
                device.device,
                weight,
                fmt.resolve(cli.json),
                output,
                cli.no_color,
            )
            .await
        }
        Commands::Alert { device, output: fmt } => {
            commands::cmd_alert(
                server,
                device.device,
                fmt.resolve(cli.json),
                output,
                cli.no_color,
            )
            .await
        }
        Commands::Reset { device } => commands::cmd_reset(server, device.device, cli.quiet).await,
        Commands::Devices { output: fmt } => {
            commands::cmd_devices(server, fmt.resolve(cli.json), output).await
        }
        Commands::Health { output: fmt } => {
            commands::cmd_health(server, fmt.resolve(cli.json), output, cli.no_color).await
        }
    }
}
