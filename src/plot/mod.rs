//! SVG chart rendering.
//!
//! Charts are described as plain data (`PlotSeries`, `BarSeries`,
//! `ChartText`) computed outside the render call, then drawn with Plotters'
//! SVG backend. Keeping the description data-driven lets the pipeline decide
//! *what* goes on a chart while `charts` only decides *how* it is drawn.
//!
//! The x-axis of time charts is a day number (days since the common era) so
//! both line and bar series share one `f64` coordinate system; tick labels
//! are formatted back to dates.

use chrono::{Datelike, NaiveDate};

use crate::domain::SeriesStyle;

pub mod charts;

pub use charts::*;

/// One line/marker series.
#[derive(Debug, Clone)]
pub struct PlotSeries {
    /// Legend entry; `None` keeps the series out of the legend.
    pub label: Option<String>,
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
}

impl PlotSeries {
    pub fn new(label: Option<String>, points: Vec<(f64, f64)>, style: SeriesStyle) -> Self {
        Self { label, points, style }
    }

    /// A dated series on the day-number axis.
    pub fn dated<I>(label: Option<String>, values: I, style: SeriesStyle) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let points = values.into_iter().map(|(d, v)| (day_number(d), v)).collect();
        Self::new(label, points, style)
    }
}

/// One bar series on the day-number axis.
#[derive(Debug, Clone)]
pub struct BarSeries {
    pub label: String,
    pub points: Vec<(f64, f64)>,
    pub style: SeriesStyle,
    /// Horizontal shift of each bar (days), so paired series sit side by side.
    pub offset: f64,
    /// Bar width (days).
    pub width: f64,
}

/// Title and axis labels.
#[derive(Debug, Clone)]
pub struct ChartText {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
}

impl ChartText {
    pub fn new(title: impl Into<String>, x_label: impl Into<String>, y_label: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
        }
    }
}

/// Position of a date on the time axis.
pub fn day_number(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

/// Tick label for a time-axis position (`Mar 05`).
pub fn format_day(x: f64) -> String {
    NaiveDate::from_num_days_from_ce_opt(x.round() as i32)
        .map(|d| d.format("%b %d").to_string())
        .unwrap_or_default()
}

/// Split `points` into runs that can be drawn on log axes.
///
/// Non-finite points always break a run; non-positive y (and x when
/// `log_x`) do too, the way a log plot masks them.
pub fn drawable_runs(points: &[(f64, f64)], log_x: bool) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();

    for &(x, y) in points {
        let ok = x.is_finite() && y.is_finite() && y > 0.0 && (!log_x || x > 0.0);
        if ok {
            current.push((x, y));
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }

    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_number_round_trips_through_tick_labels() {
        let d = NaiveDate::from_ymd_opt(2020, 3, 5).unwrap();
        assert_eq!(format_day(day_number(d)), "Mar 05");
        assert_eq!(format_day(day_number(d) + 0.4), "Mar 05");
    }

    #[test]
    fn drawable_runs_break_on_masked_points() {
        let pts = [(1.0, 5.0), (2.0, 0.0), (3.0, 7.0), (4.0, 8.0), (5.0, f64::NAN)];
        let runs = drawable_runs(&pts, false);
        assert_eq!(runs, vec![vec![(1.0, 5.0)], vec![(3.0, 7.0), (4.0, 8.0)]]);

        let runs = drawable_runs(&[(0.0, 1.0), (2.0, 3.0)], true);
        assert_eq!(runs, vec![vec![(2.0, 3.0)]]);
    }
}
