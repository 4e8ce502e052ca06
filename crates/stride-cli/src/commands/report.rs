//! Report command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use owo_colors::OwoColorize;
use stride_types::AnalyticsReport;

use crate::cli::OutputFormat;
use crate::util::{connect, require_device, to_json, write_output};

pub async fn cmd_report(
    server: &str,
    device: Option<String>,
    weight_kg: Option<f64>,
    format: OutputFormat,
    output: Option<&PathBuf>,
    no_color: bool,
) -> Result<()> {
    let device_id = require_device(device)?;
    if let Some(weight) = weight_kg
        && (!weight.is_finite() || weight <= 0.0)
    {
        bail!("Invalid weight {}: must be a positive number of kilograms", weight);
    }

    let client = connect(server)?;
    let report = client
        .analytics(&device_id, weight_kg)
        .await
        .context("Failed to fetch analytics")?;

    let content = match format {
        OutputFormat::Json => to_json(&report)?,
        OutputFormat::Text => format_report_text(&device_id, &report, no_color),
    };

    write_output(output, &content)
}

fn format_report_text(device_id: &str, report: &AnalyticsReport, no_color: bool) -> String {
    let name = if no_color {
        device_id.to_string()
    } else {
        device_id.cyan().to_string()
    };

    format!(
        "{} today\n\
         \x20 Pace:        {:.1} steps/min\n\
         \x20 Raw steps:   {}\n\
         \x20 Steps:       {}\n\
         \x20 Calories:    {:.2} kcal\n\
         \x20 Predicted:   {} steps\n",
        name,
        report.pace_spm,
        report.raw_steps_today,
        report.corrected_steps_today,
        report.calories_today,
        report.predicted_daily_steps,
    )
}
