//! Shared domain types.
//!
//! Series and fit outputs are plain owned data: the numerical routines take
//! slices and return new values, so the same series can be fitted and
//! smoothed from several worker threads at once.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Values below this are dominated by small-number noise in phase plots.
pub const NOISE_FLOOR: f64 = 10.0;

/// One reporting day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    pub date: NaiveDate,
    /// Cumulative count. Reporting corrections can make it dip.
    pub count: i64,
}

/// A cumulative daily series for one geography and one metric.
///
/// Observations are ordered by date (non-decreasing).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeries {
    pub observations: Vec<Observation>,
}

impl TimeSeries {
    pub fn new(observations: Vec<Observation>) -> Self {
        Self { observations }
    }

    /// Build from parallel date/count vectors (zipped, extra entries ignored).
    pub fn from_parts(dates: &[NaiveDate], counts: &[i64]) -> Self {
        let observations = dates
            .iter()
            .zip(counts.iter())
            .map(|(&date, &count)| Observation { date, count })
            .collect();
        Self { observations }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.observations.iter().map(|o| o.date).collect()
    }

    pub fn counts(&self) -> Vec<i64> {
        self.observations.iter().map(|o| o.count).collect()
    }

    /// Counts as floats (for smoothing and plotting).
    pub fn values(&self) -> Vec<f64> {
        self.observations.iter().map(|o| o.count as f64).collect()
    }

    /// Earliest date in the series.
    pub fn first_date(&self) -> Option<NaiveDate> {
        self.observations.iter().map(|o| o.date).min()
    }

    /// Day-over-day differences, dated by the later day.
    pub fn daily_changes(&self) -> Vec<(NaiveDate, i64)> {
        self.observations
            .windows(2)
            .map(|w| (w[1].date, w[1].count - w[0].count))
            .collect()
    }
}

/// Trailing window selection for an exponential fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitWindow {
    /// Number of observations in the window.
    pub npoints: usize,
    /// How many of the most recent observations to leave out.
    pub days_back: usize,
}

impl FitWindow {
    pub const DEFAULT_NPOINTS: usize = 10;

    pub fn new(npoints: usize, days_back: usize) -> Self {
        Self { npoints, days_back }
    }

    /// Observations a series needs for this window.
    pub fn required_len(&self) -> usize {
        self.npoints + self.days_back
    }
}

impl Default for FitWindow {
    fn default() -> Self {
        Self::new(Self::DEFAULT_NPOINTS, 0)
    }
}

/// Exponential growth fitted to a window: `y = exp(growth_rate·x + intercept)`,
/// where `x` is days since the series' first date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub growth_rate: f64,
    pub intercept: f64,
    /// `ln 2 / growth_rate`; negative or huge when the series is not growing.
    pub doubling_time: f64,
    pub window: FitWindow,
    /// The fitted curve evaluated on every date of the source series.
    pub fitted_curve: Vec<(NaiveDate, f64)>,
}

impl FitResult {
    /// Evaluate the fitted curve at a day offset.
    pub fn predict(&self, day_offset: f64) -> f64 {
        (self.growth_rate * day_offset + self.intercept).exp()
    }
}

/// One point of a phase trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrajectoryPoint {
    /// Cumulative level at the later of the two days.
    pub level: f64,
    /// Change from the previous level.
    pub delta: f64,
}

/// `(level, delta)` pairs for a log-log "cases vs. new cases" plot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SmoothedTrajectory {
    pub points: Vec<TrajectoryPoint>,
}

impl SmoothedTrajectory {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn levels(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.level).collect()
    }

    pub fn deltas(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.delta).collect()
    }
}

/// Savitzky–Golay settings for the trajectory smoother.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmoothConfig {
    /// Filter window (odd).
    pub window_size: usize,
    /// Polynomial order (< window size).
    pub poly_order: usize,
    /// When false the retained values are differenced without filtering.
    pub apply_smoothing: bool,
}

impl SmoothConfig {
    /// Unfiltered trajectory.
    pub fn raw() -> Self {
        Self {
            apply_smoothing: false,
            ..Self::default()
        }
    }
}

impl Default for SmoothConfig {
    fn default() -> Self {
        Self {
            window_size: 15,
            poly_order: 3,
            apply_smoothing: true,
        }
    }
}

/// Report language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    It,
    En,
}

/// Which dataset layout a report is built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Italia,
    World,
    Us,
}

impl Source {
    /// Directory name used for the default output location.
    pub fn dir_name(self) -> &'static str {
        match self {
            Source::Italia => "italia",
            Source::World => "world",
            Source::Us => "us",
        }
    }

    /// Report language when none is given.
    pub fn default_lang(self) -> Lang {
        match self {
            Source::Italia => Lang::It,
            Source::World | Source::Us => Lang::En,
        }
    }

    /// Default input directory (relative to the working directory).
    pub fn default_csv_dir(self) -> &'static str {
        match self {
            Source::Italia => "../COVID-19-italia",
            Source::World => "../COVID-19-world/csse_covid_19_data/csse_covid_19_time_series",
            Source::Us => "../COVID-19-world/csse_covid_19_data/csse_covid_19_daily_reports",
        }
    }
}

/// Chart canvas settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// Upper bound of the log y-axis on cumulative charts (grown to fit data).
    pub ymax: f64,
}

impl ChartConfig {
    /// Same canvas with a different cumulative y-limit.
    pub fn with_ymax(self, ymax: f64) -> Self {
        Self { ymax, ..self }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            ymax: 1e6,
        }
    }
}

/// A full report run's configuration.
///
/// Derived from CLI flags, `.env`/environment and built-in defaults.
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub source: Source,
    pub csv_dir: PathBuf,
    pub outdir: PathBuf,
    /// Worker threads for per-geography rendering.
    pub jobs: usize,
    pub lang: Lang,
    /// Free text shown at the top of the page.
    pub last_update: String,
    /// HTML appended verbatim at the end of the page.
    pub footer: Option<PathBuf>,
    pub chart: ChartConfig,
    /// Main exponential-fit window.
    pub fit_window: FitWindow,
    pub smooth: SmoothConfig,
    /// Last day of daily report files to read (US layout).
    pub until: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, day).unwrap()
    }

    #[test]
    fn daily_changes_keep_corrections() {
        let s = TimeSeries::from_parts(&[d(1), d(2), d(3)], &[10, 15, 12]);
        assert_eq!(s.daily_changes(), vec![(d(2), 5), (d(3), -3)]);
    }

    #[test]
    fn fit_window_required_len() {
        assert_eq!(FitWindow::new(10, 7).required_len(), 17);
        assert_eq!(FitWindow::default().npoints, 10);
    }
}
