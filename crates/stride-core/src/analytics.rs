//! Activity analytics.
//!
//! Derived metrics computed from a device's activity timeline: pace, MET,
//! calories, undercount correction and a same-day forecast. Nothing here is
//! cached; every metric is recomputed from the entries it is handed.
//!
//! The free functions take "now" explicitly and are the clock-free core.
//! [`ActivityAnalytics`] binds them to a [`Clock`] and an
//! [`AnalyticsConfig`], and [`DeviceAnalytics`] further binds them to an
//! [`ActivitySource`] so metrics can be requested by device id.
//!
//! "Today" and "the current hour" are always taken from the UTC calendar,
//! matching how entries are stored.
//!
//! # Example
//!
//! ```
//! use stride_core::analytics::{ActivityAnalytics, AnalyticsConfig};
//! use stride_core::clock::FixedClock;
//! use stride_types::ActivityEntry;
//! use time::macros::datetime;
//!
//! let clock = FixedClock::new(datetime!(2025-06-01 12:00:10 UTC));
//! let analytics = ActivityAnalytics::with_clock(AnalyticsConfig::default(), clock);
//!
//! let entries = vec![
//!     ActivityEntry::new(datetime!(2025-06-01 12:00:00 UTC), 5),
//!     ActivityEntry::new(datetime!(2025-06-01 12:00:10 UTC), 3),
//! ];
//!
//! let report = analytics.report(&entries, 75.0);
//! assert_eq!(report.raw_steps_today, 8);
//! assert_eq!(report.calories_today, 1.97);
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime, UtcOffset};
use tracing::debug;

use stride_types::{ActivityEntry, AnalyticsReport, DailyTotal};

use crate::clock::{Clock, SystemClock};
use crate::traits::ActivitySource;

/// Default trailing window for pace.
pub const DEFAULT_PACE_WINDOW: Duration = Duration::from_secs(60);

/// Trailing window for the pace that drives the calorie estimate.
pub const CALORIE_PACE_WINDOW: Duration = Duration::from_secs(300);

/// Number of past days considered by the forecast.
pub const HISTORY_DAYS: u32 = 21;

/// Default body weight for calorie estimates.
pub const DEFAULT_WEIGHT_KG: f64 = 75.0;

/// Correction gain per unit of per-minute variance.
pub const VARIANCE_GAIN: f64 = 0.02;

/// Upper bound of the undercount correction (+30%).
pub const MAX_CORRECTION: f64 = 0.30;

/// Pace below which activity counts as sedentary.
pub const SEDENTARY_PACE_SPM: f64 = 20.0;

/// Pace at which the MET curve switches to its running slope.
pub const RUNNING_PACE_SPM: f64 = 100.0;

/// Tunable windows and defaults for the analytics engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Trailing window for the reported pace, in seconds.
    pub pace_window_secs: u64,
    /// Trailing window for the calorie pace, in seconds.
    pub calorie_window_secs: u64,
    /// Days of history for the forecast.
    pub history_days: u32,
    /// Weight used when the caller does not supply one.
    pub default_weight_kg: f64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            pace_window_secs: DEFAULT_PACE_WINDOW.as_secs(),
            calorie_window_secs: CALORIE_PACE_WINDOW.as_secs(),
            history_days: HISTORY_DAYS,
            default_weight_kg: DEFAULT_WEIGHT_KG,
        }
    }
}

impl AnalyticsConfig {
    /// The pace window as a [`Duration`].
    pub fn pace_window(&self) -> Duration {
        Duration::from_secs(self.pace_window_secs)
    }

    /// The calorie pace window as a [`Duration`].
    pub fn calorie_window(&self) -> Duration {
        Duration::from_secs(self.calorie_window_secs)
    }
}

/// Two decimals, halves to even.
fn round2(value: f64) -> f64 {
    (value * 100.0).round_ties_even() / 100.0
}

fn utc_date(at: OffsetDateTime) -> Date {
    at.to_offset(UtcOffset::UTC).date()
}

/// Steps per minute over the trailing `window` ending at `now`.
///
/// Counts every entry stamped at or after `now - window`, including entries
/// stamped after `now`. A window reaching past the representable range
/// covers the whole timeline. The window length is floored at one second.
/// Rounded to 2 decimals; 0.0 when no entry falls in the window.
pub fn pace_over(entries: &[ActivityEntry], window: Duration, now: OffsetDateTime) -> f64 {
    let cutoff = time::Duration::try_from(window)
        .ok()
        .and_then(|w| now.checked_sub(w));
    let steps: u64 = entries
        .iter()
        .filter(|e| cutoff.is_none_or(|c| e.timestamp >= c))
        .map(|e| u64::from(e.steps))
        .sum();
    if steps == 0 {
        return 0.0;
    }
    let window_secs = window.as_secs_f64().max(1.0);
    round2(steps as f64 / window_secs * 60.0)
}

/// Metabolic equivalent for a walking pace.
///
/// ```
/// use stride_core::analytics::met_for_pace;
///
/// assert_eq!(met_for_pace(10.0), 1.5);
/// assert_eq!(met_for_pace(20.0), 2.0);
/// assert_eq!(met_for_pace(60.0), 3.5);
/// assert_eq!(met_for_pace(100.0), 6.0);
/// ```
pub fn met_for_pace(pace_spm: f64) -> f64 {
    if pace_spm < SEDENTARY_PACE_SPM {
        1.5
    } else if pace_spm < RUNNING_PACE_SPM {
        2.0 + (pace_spm - SEDENTARY_PACE_SPM) * (3.0 / (RUNNING_PACE_SPM - SEDENTARY_PACE_SPM))
    } else {
        6.0 + (pace_spm - RUNNING_PACE_SPM) * 0.02
    }
}

/// Sum of the deltas reported on `date` (UTC).
pub fn raw_steps_on(entries: &[ActivityEntry], date: Date) -> u64 {
    entries
        .iter()
        .filter(|e| e.date() == date)
        .map(|e| u64::from(e.steps))
        .sum()
}

/// Estimated kilocalories burned on the UTC day of `now`.
///
/// The duration is the span between the earliest and latest entry of the
/// day, floored at one minute. The MET comes from the pace over
/// `calorie_window` across the whole timeline. 0.0 when the day has no
/// entries.
pub fn calories_on_day(
    entries: &[ActivityEntry],
    weight_kg: f64,
    calorie_window: Duration,
    now: OffsetDateTime,
) -> f64 {
    let today = utc_date(now);
    let mut todays = entries.iter().filter(|e| e.date() == today);
    let Some(first) = todays.next() else {
        return 0.0;
    };
    let (earliest, latest) = todays.fold((first.timestamp, first.timestamp), |(lo, hi), e| {
        (lo.min(e.timestamp), hi.max(e.timestamp))
    });

    let duration_minutes = ((latest - earliest).as_seconds_f64() / 60.0).max(1.0);
    let met = met_for_pace(pace_over(entries, calorie_window, now));
    let kcal_per_minute = met * 3.5 * weight_kg / 200.0;
    round2(kcal_per_minute * duration_minutes)
}

/// Sample variance of the per-minute step totals across the timeline.
///
/// Entries are grouped by the UTC minute they fall in. Fewer than two
/// distinct minutes gives 0.0.
pub fn variance_proxy(entries: &[ActivityEntry]) -> f64 {
    let mut per_minute: BTreeMap<i64, u64> = BTreeMap::new();
    for entry in entries {
        let minute = entry.timestamp.unix_timestamp().div_euclid(60);
        *per_minute.entry(minute).or_default() += u64::from(entry.steps);
    }
    if per_minute.len() < 2 {
        return 0.0;
    }

    let n = per_minute.len() as f64;
    let mean = per_minute.values().map(|&v| v as f64).sum::<f64>() / n;
    per_minute
        .values()
        .map(|&v| {
            let d = v as f64 - mean;
            d * d
        })
        .sum::<f64>()
        / (n - 1.0)
}

/// Multiplicative undercount correction for a variance proxy.
///
/// ```
/// use stride_core::analytics::correction_factor;
///
/// assert_eq!(correction_factor(0.0), 1.0);
/// assert_eq!(correction_factor(5.0), 1.1);
/// assert_eq!(correction_factor(1_000.0), 1.3);
/// ```
pub fn correction_factor(variance: f64) -> f64 {
    1.0 + (variance * VARIANCE_GAIN).min(MAX_CORRECTION)
}

/// Apply the undercount correction derived from `entries` to `raw_steps`.
///
/// Rounds half to even. A raw count of zero always stays zero.
pub fn correct_steps(entries: &[ActivityEntry], raw_steps: u64) -> u64 {
    let factor = correction_factor(variance_proxy(entries));
    (raw_steps as f64 * factor).round_ties_even() as u64
}

/// Per-day totals for the days aged `0..=days_back` relative to `today`.
///
/// Sorted ascending by date. Today is included when it has entries; days in
/// the future are not.
pub fn daily_totals(entries: &[ActivityEntry], today: Date, days_back: u32) -> Vec<DailyTotal> {
    let mut by_day: BTreeMap<Date, u64> = BTreeMap::new();
    for entry in entries {
        *by_day.entry(entry.date()).or_default() += u64::from(entry.steps);
    }
    by_day
        .into_iter()
        .filter(|(date, _)| {
            let age = (today - *date).whole_days();
            (0..=i64::from(days_back)).contains(&age)
        })
        .map(|(date, steps)| DailyTotal { date, steps })
        .collect()
}

/// Forecast today's final step count.
///
/// Without history, today's corrected count is extrapolated linearly over
/// 24 hours using whole elapsed hours (at least 1). With history, the
/// average of past days (or, if only today has data, of today) is blended
/// 50/50 with that extrapolation using fractional hours. The forecast is
/// never below `corrected_today`.
///
/// ```
/// use stride_core::analytics::project_daily_total;
/// use time::macros::datetime;
///
/// let predicted = project_daily_total(1200, &[], datetime!(2025-06-01 06:30 UTC));
/// assert_eq!(predicted, 4800);
/// ```
pub fn project_daily_total(
    corrected_today: u64,
    history: &[DailyTotal],
    now: OffsetDateTime,
) -> u64 {
    let now = now.to_offset(UtcOffset::UTC);

    let predicted = if history.is_empty() {
        let hour = u64::from(now.hour()).max(1);
        corrected_today.saturating_mul(24) / hour
    } else {
        let today = now.date();
        let past: Vec<u64> = history
            .iter()
            .filter(|d| d.date != today)
            .map(|d| d.steps)
            .collect();
        let totals: Vec<u64> = if past.is_empty() {
            history.iter().map(|d| d.steps).collect()
        } else {
            past
        };

        let average = totals.iter().map(|&t| t as f64).sum::<f64>() / totals.len() as f64;
        let hour = (f64::from(now.hour()) + f64::from(now.minute()) / 60.0).max(1.0);
        let projected = corrected_today as f64 * 24.0 / hour;
        (0.5 * average + 0.5 * projected).round_ties_even() as u64
    };

    predicted.max(corrected_today)
}

/// Analytics bound to a clock and a configuration.
///
/// Every method reads the clock once, so all the parts of one
/// [`report`](Self::report) agree on "now".
#[derive(Debug, Clone)]
pub struct ActivityAnalytics<C: Clock = SystemClock> {
    config: AnalyticsConfig,
    clock: C,
}

impl Default for ActivityAnalytics<SystemClock> {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl ActivityAnalytics<SystemClock> {
    /// Analytics reading the system clock.
    pub fn new(config: AnalyticsConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> ActivityAnalytics<C> {
    /// Analytics reading the given clock.
    pub fn with_clock(config: AnalyticsConfig, clock: C) -> Self {
        Self { config, clock }
    }

    /// The engine's configuration.
    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// The current instant according to the engine's clock.
    pub fn now(&self) -> OffsetDateTime {
        self.clock.now()
    }

    /// Steps per minute over the trailing `window`.
    pub fn pace(&self, entries: &[ActivityEntry], window: Duration) -> f64 {
        pace_over(entries, window, self.now())
    }

    /// Sum of today's deltas.
    pub fn raw_steps_today(&self, entries: &[ActivityEntry]) -> u64 {
        raw_steps_on(entries, utc_date(self.now()))
    }

    /// Kilocalories burned today.
    pub fn calories_today(&self, entries: &[ActivityEntry], weight_kg: f64) -> f64 {
        calories_on_day(entries, weight_kg, self.config.calorie_window(), self.now())
    }

    /// Corrected count for `raw_steps`.
    pub fn corrected_steps(&self, entries: &[ActivityEntry], raw_steps: u64) -> u64 {
        correct_steps(entries, raw_steps)
    }

    /// Forecast of today's final step count.
    pub fn predicted_daily_steps(&self, entries: &[ActivityEntry]) -> u64 {
        self.predicted_at(entries, self.now())
    }

    fn predicted_at(&self, entries: &[ActivityEntry], now: OffsetDateTime) -> u64 {
        let today = utc_date(now);
        let history = daily_totals(entries, today, self.config.history_days);
        let corrected = correct_steps(entries, raw_steps_on(entries, today));
        project_daily_total(corrected, &history, now)
    }

    /// All metrics for one timeline at one instant.
    ///
    /// Never fails; an empty timeline gives an all-zero report.
    pub fn report(&self, entries: &[ActivityEntry], weight_kg: f64) -> AnalyticsReport {
        let now = self.now();
        let raw = raw_steps_on(entries, utc_date(now));
        AnalyticsReport {
            pace_spm: pace_over(entries, self.config.pace_window(), now),
            raw_steps_today: raw,
            corrected_steps_today: correct_steps(entries, raw),
            calories_today: calories_on_day(
                entries,
                weight_kg,
                self.config.calorie_window(),
                now,
            ),
            predicted_daily_steps: self.predicted_at(entries, now),
        }
    }

    /// Bind the engine to a store so metrics can be requested by device id.
    pub fn for_source<'a, S: ActivitySource>(&'a self, source: &'a S) -> DeviceAnalytics<'a, S, C> {
        DeviceAnalytics {
            analytics: self,
            source,
        }
    }
}

/// Device-keyed analytics over an [`ActivitySource`].
///
/// Each call loads one snapshot of the device's timeline. An unknown device
/// has an empty timeline, so every metric is zero; only storage failures
/// are errors.
#[derive(Debug)]
pub struct DeviceAnalytics<'a, S, C: Clock = SystemClock> {
    analytics: &'a ActivityAnalytics<C>,
    source: &'a S,
}

impl<S: ActivitySource, C: Clock> DeviceAnalytics<'_, S, C> {
    /// Steps per minute for `device_id` over the trailing `window`.
    pub fn pace(&self, device_id: &str, window: Duration) -> Result<f64, S::Error> {
        let entries = self.source.activity(device_id)?;
        Ok(self.analytics.pace(&entries, window))
    }

    /// Kilocalories burned today by `device_id`.
    pub fn calories_today(&self, device_id: &str, weight_kg: f64) -> Result<f64, S::Error> {
        let entries = self.source.activity(device_id)?;
        Ok(self.analytics.calories_today(&entries, weight_kg))
    }

    /// Corrected count for `raw_steps` using `device_id`'s timeline.
    pub fn corrected_steps(&self, device_id: &str, raw_steps: u64) -> Result<u64, S::Error> {
        let entries = self.source.activity(device_id)?;
        Ok(self.analytics.corrected_steps(&entries, raw_steps))
    }

    /// Forecast of today's final step count for `device_id`.
    pub fn predicted_daily_steps(&self, device_id: &str) -> Result<u64, S::Error> {
        let entries = self.source.activity(device_id)?;
        Ok(self.analytics.predicted_daily_steps(&entries))
    }

    /// All metrics for `device_id`.
    pub fn report(&self, device_id: &str, weight_kg: f64) -> Result<AnalyticsReport, S::Error> {
        let entries = self.source.activity(device_id)?;
        debug!(device_id, entries = entries.len(), "Computing analytics report");
        Ok(self.analytics.report(&entries, weight_kg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use std::collections::HashMap;
    use time::macros::{date, datetime};

    fn entry(at: OffsetDateTime, steps: u32) -> ActivityEntry {
        ActivityEntry::new(at, steps)
    }

    fn analytics_at(now: OffsetDateTime) -> ActivityAnalytics<FixedClock> {
        ActivityAnalytics::with_clock(AnalyticsConfig::default(), FixedClock::new(now))
    }

    // --- Pace tests ---

    #[test]
    fn test_pace_empty_is_zero() {
        assert_eq!(pace_over(&[], DEFAULT_PACE_WINDOW, datetime!(2025-06-01 12:00 UTC)), 0.0);
    }

    #[test]
    fn test_pace_counts_trailing_window_only() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let entries = [
            entry(datetime!(2025-06-01 11:58 UTC), 100),
            entry(datetime!(2025-06-01 11:59:30 UTC), 30),
            entry(datetime!(2025-06-01 11:59:50 UTC), 20),
        ];
        assert_eq!(pace_over(&entries, DEFAULT_PACE_WINDOW, now), 50.0);
    }

    #[test]
    fn test_pace_window_start_is_inclusive() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let entries = [entry(datetime!(2025-06-01 11:59 UTC), 10)];
        assert_eq!(pace_over(&entries, DEFAULT_PACE_WINDOW, now), 10.0);
    }

    #[test]
    fn test_pace_counts_future_entries() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let entries = [entry(datetime!(2025-06-01 12:00:05 UTC), 6)];
        assert_eq!(pace_over(&entries, DEFAULT_PACE_WINDOW, now), 6.0);
    }

    #[test]
    fn test_pace_rounds_to_two_decimals() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let entries = [entry(now, 1)];
        // 1 / 7 * 60 = 8.571428...
        assert_eq!(pace_over(&entries, Duration::from_secs(7), now), 8.57);
    }

    #[test]
    fn test_pace_zero_window_is_floored() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let entries = [entry(now, 2)];
        assert_eq!(pace_over(&entries, Duration::ZERO, now), 120.0);
    }

    #[test]
    fn test_pace_rounds_halves_to_even() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let entries = [entry(now, 1)];
        // 1 / 480 * 60 = 0.125 exactly.
        assert_eq!(pace_over(&entries, Duration::from_secs(480), now), 0.12);
    }

    #[test]
    fn test_pace_window_beyond_time_range_covers_everything() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let entries = [entry(datetime!(1990-01-01 00:00 UTC), 600)];
        assert_eq!(pace_over(&[], Duration::MAX, now), 0.0);
        assert_eq!(pace_over(&entries, Duration::MAX, now), 0.0);
        assert_eq!(
            pace_over(&entries, Duration::from_secs(1_000_000_000_000), now),
            0.0
        );
    }

    // --- MET tests ---

    #[test]
    fn test_met_breakpoints() {
        assert_eq!(met_for_pace(0.0), 1.5);
        assert_eq!(met_for_pace(19.99), 1.5);
        assert_eq!(met_for_pace(20.0), 2.0);
        assert_eq!(met_for_pace(100.0), 6.0);
        assert_eq!(met_for_pace(150.0), 7.0);
    }

    #[test]
    fn test_met_walking_interpolation() {
        assert!((met_for_pace(99.999) - 4.99996).abs() < 1e-4);
        assert_eq!(met_for_pace(40.0), 2.75);
    }

    // --- Calorie tests ---

    #[test]
    fn test_calories_two_entries_ten_seconds_apart() {
        let now = datetime!(2025-06-01 12:00:10 UTC);
        let entries = [
            entry(datetime!(2025-06-01 12:00:00 UTC), 5),
            entry(datetime!(2025-06-01 12:00:10 UTC), 3),
        ];
        assert_eq!(calories_on_day(&entries, 75.0, CALORIE_PACE_WINDOW, now), 1.97);
    }

    #[test]
    fn test_calories_use_span_of_todays_entries() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let entries = [
            entry(datetime!(2025-05-31 23:00 UTC), 500),
            entry(datetime!(2025-06-01 11:00 UTC), 10),
            entry(datetime!(2025-06-01 11:30 UTC), 10),
        ];
        // Pace over the last 5 minutes is 0, MET 1.5, 30 minutes of activity.
        let expected = round2(1.5 * 3.5 * 70.0 / 200.0 * 30.0);
        assert_eq!(calories_on_day(&entries, 70.0, CALORIE_PACE_WINDOW, now), expected);
    }

    #[test]
    fn test_calories_none_today_is_zero() {
        let now = datetime!(2025-06-02 08:00 UTC);
        let entries = [entry(datetime!(2025-06-01 11:00 UTC), 10)];
        assert_eq!(calories_on_day(&entries, 75.0, CALORIE_PACE_WINDOW, now), 0.0);
    }

    // --- Correction tests ---

    #[test]
    fn test_variance_single_minute_is_zero() {
        let entries = [
            entry(datetime!(2025-06-01 12:00:05 UTC), 30),
            entry(datetime!(2025-06-01 12:00:55 UTC), 40),
        ];
        assert_eq!(variance_proxy(&entries), 0.0);
        assert_eq!(correct_steps(&entries, 50), 50);
    }

    #[test]
    fn test_variance_is_sample_variance() {
        let entries = [
            entry(datetime!(2025-06-01 12:00:05 UTC), 2),
            entry(datetime!(2025-06-01 12:01:05 UTC), 4),
            entry(datetime!(2025-06-01 12:02:05 UTC), 6),
        ];
        // Mean 4, squared deviations 4 + 0 + 4, divided by n - 1 = 2.
        assert_eq!(variance_proxy(&entries), 4.0);
    }

    #[test]
    fn test_variance_groups_by_minute() {
        let entries = [
            entry(datetime!(2025-06-01 12:00:05 UTC), 1),
            entry(datetime!(2025-06-01 12:00:45 UTC), 1),
            entry(datetime!(2025-06-01 12:01:00 UTC), 4),
        ];
        // Minutes total 2 and 4: mean 3, variance (1 + 1) / 1.
        assert_eq!(variance_proxy(&entries), 2.0);
    }

    #[test]
    fn test_correction_is_capped() {
        let entries = [
            entry(datetime!(2025-06-01 12:00 UTC), 0),
            entry(datetime!(2025-06-01 12:01 UTC), 200),
        ];
        assert_eq!(correct_steps(&entries, 1000), 1300);
    }

    #[test]
    fn test_correction_rounds_half_to_even() {
        let entries = [
            entry(datetime!(2025-06-01 12:00 UTC), 0),
            entry(datetime!(2025-06-01 12:01 UTC), 5),
        ];
        // variance 12.5 -> factor 1.25; 2 * 1.25 = 2.5 rounds to 2.
        assert_eq!(variance_proxy(&entries), 12.5);
        assert_eq!(correct_steps(&entries, 2), 2);
        // 6 * 1.25 = 7.5 rounds to 8.
        assert_eq!(correct_steps(&entries, 6), 8);
    }

    #[test]
    fn test_correction_of_zero_is_zero() {
        let entries = [
            entry(datetime!(2025-06-01 12:00 UTC), 0),
            entry(datetime!(2025-06-01 12:01 UTC), 200),
        ];
        assert_eq!(correct_steps(&entries, 0), 0);
    }

    // --- Daily totals tests ---

    #[test]
    fn test_daily_totals_window_and_order() {
        let today = date!(2025 - 06 - 22);
        let entries = [
            entry(datetime!(2025-06-22 09:00 UTC), 7),
            entry(datetime!(2025-05-31 09:00 UTC), 1000),
            entry(datetime!(2025-06-01 09:00 UTC), 300),
            entry(datetime!(2025-06-01 18:00 UTC), 200),
            entry(datetime!(2025-06-23 09:00 UTC), 99),
        ];
        let totals = daily_totals(&entries, today, HISTORY_DAYS);
        assert_eq!(
            totals,
            vec![
                DailyTotal {
                    date: date!(2025 - 06 - 01),
                    steps: 500
                },
                DailyTotal {
                    date: date!(2025 - 06 - 22),
                    steps: 7
                },
            ]
        );
    }

    // --- Forecast tests ---

    #[test]
    fn test_projection_without_history() {
        let now = datetime!(2025-06-01 06:00 UTC);
        assert_eq!(project_daily_total(1200, &[], now), 4800);
    }

    #[test]
    fn test_projection_before_first_hour_uses_one_hour() {
        let now = datetime!(2025-06-01 00:40 UTC);
        assert_eq!(project_daily_total(10, &[], now), 240);
    }

    #[test]
    fn test_projection_truncates_without_history() {
        let now = datetime!(2025-06-01 07:00 UTC);
        // 100 * 24 / 7 = 342.86
        assert_eq!(project_daily_total(100, &[], now), 342);
    }

    #[test]
    fn test_projection_blends_history() {
        let now = datetime!(2025-06-10 12:00 UTC);
        let history = [
            DailyTotal {
                date: date!(2025 - 06 - 08),
                steps: 8000,
            },
            DailyTotal {
                date: date!(2025 - 06 - 09),
                steps: 10000,
            },
            DailyTotal {
                date: date!(2025 - 06 - 10),
                steps: 3000,
            },
        ];
        // 0.5 * 9000 + 0.5 * 3000 * 24 / 12
        assert_eq!(project_daily_total(3000, &history, now), 7500);
    }

    #[test]
    fn test_projection_falls_back_to_today() {
        let now = datetime!(2025-06-10 06:00 UTC);
        let history = [DailyTotal {
            date: date!(2025 - 06 - 10),
            steps: 1200,
        }];
        // 0.5 * 1200 + 0.5 * 1200 * 4
        assert_eq!(project_daily_total(1200, &history, now), 3000);
    }

    #[test]
    fn test_projection_never_below_corrected() {
        let now = datetime!(2025-06-10 23:30 UTC);
        let history = [DailyTotal {
            date: date!(2025 - 06 - 09),
            steps: 0,
        }];
        assert_eq!(project_daily_total(5000, &history, now), 5000);
    }

    // --- ActivityAnalytics tests ---

    #[test]
    fn test_report_empty_timeline_is_zero() {
        let analytics = analytics_at(datetime!(2025-06-01 12:00 UTC));
        assert_eq!(analytics.report(&[], 75.0), AnalyticsReport::default());
    }

    #[test]
    fn test_report_with_huge_windows() {
        let now = datetime!(2025-06-01 12:00 UTC);
        let config = AnalyticsConfig {
            pace_window_secs: 1_000_000_000_000,
            calorie_window_secs: u64::MAX,
            ..AnalyticsConfig::default()
        };
        let analytics = ActivityAnalytics::with_clock(config, FixedClock::new(now));
        assert_eq!(analytics.report(&[], 75.0), AnalyticsReport::default());

        let report = analytics.report(&[entry(now, 30)], 75.0);
        assert_eq!(report.raw_steps_today, 30);
        assert_eq!(report.pace_spm, 0.0);
        // Sedentary MET over the one-minute floor.
        assert_eq!(report.calories_today, round2(1.5 * 3.5 * 75.0 / 200.0));
    }

    #[test]
    fn test_report_combines_metrics() {
        let now = datetime!(2025-06-01 06:00 UTC);
        let analytics = analytics_at(now);
        let entries = [
            entry(datetime!(2025-06-01 05:59:20 UTC), 60),
            entry(datetime!(2025-06-01 05:59:40 UTC), 60),
        ];

        let report = analytics.report(&entries, 75.0);
        assert_eq!(report.pace_spm, 120.0);
        assert_eq!(report.raw_steps_today, 120);
        assert_eq!(report.corrected_steps_today, 120);
        // Pace over 5 minutes is 24 spm -> MET 2.15, one-minute floor.
        assert_eq!(report.calories_today, round2(met_for_pace(24.0) * 3.5 * 75.0 / 200.0));
        // Only today in history: 0.5 * 120 + 0.5 * 120 * 4.
        assert_eq!(report.predicted_daily_steps, 300);
    }

    #[test]
    fn test_raw_steps_today_ignores_other_days() {
        let analytics = analytics_at(datetime!(2025-06-02 00:05 UTC));
        let entries = [
            entry(datetime!(2025-06-01 23:59 UTC), 40),
            entry(datetime!(2025-06-02 00:01 UTC), 2),
        ];
        assert_eq!(analytics.raw_steps_today(&entries), 2);
    }

    #[test]
    fn test_config_defaults_and_windows() {
        let config = AnalyticsConfig::default();
        assert_eq!(config.pace_window(), Duration::from_secs(60));
        assert_eq!(config.calorie_window(), Duration::from_secs(300));
        assert_eq!(config.history_days, 21);
        assert_eq!(config.default_weight_kg, 75.0);
    }

    #[test]
    fn test_config_partial_deserialization() {
        let config: AnalyticsConfig = serde_json::from_str(r#"{"history_days": 7}"#).unwrap();
        assert_eq!(config.history_days, 7);
        assert_eq!(config.pace_window_secs, 60);
    }

    // --- DeviceAnalytics tests ---

    #[test]
    fn test_device_analytics_unknown_device() {
        let analytics = analytics_at(datetime!(2025-06-01 12:00 UTC));
        let source: HashMap<String, Vec<ActivityEntry>> = HashMap::new();
        let device = analytics.for_source(&source);

        assert_eq!(device.pace("nobody", DEFAULT_PACE_WINDOW).unwrap(), 0.0);
        assert_eq!(device.calories_today("nobody", 75.0).unwrap(), 0.0);
        assert_eq!(device.corrected_steps("nobody", 0).unwrap(), 0);
        assert_eq!(device.predicted_daily_steps("nobody").unwrap(), 0);
        assert_eq!(
            device.report("nobody", 75.0).unwrap(),
            AnalyticsReport::default()
        );
    }

    #[test]
    fn test_device_analytics_reads_device_timeline() {
        let now = datetime!(2025-06-01 12:00:10 UTC);
        let analytics = analytics_at(now);
        let mut source: HashMap<String, Vec<ActivityEntry>> = HashMap::new();
        source.insert(
            "phone_1".to_string(),
            vec![
                entry(datetime!(2025-06-01 12:00:00 UTC), 5),
                entry(datetime!(2025-06-01 12:00:10 UTC), 3),
            ],
        );
        source.insert(
            "phone_2".to_string(),
            vec![entry(datetime!(2025-06-01 12:00:00 UTC), 500)],
        );

        let device = analytics.for_source(&source);
        let report = device.report("phone_1", 75.0).unwrap();
        assert_eq!(report.raw_steps_today, 8);
        assert_eq!(report.calories_today, 1.97);
        assert_eq!(device.corrected_steps("phone_1", 50).unwrap(), 50);
    }
}
