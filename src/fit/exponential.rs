//! Exponential growth fit over a trailing window.
//!
//! Given a cumulative series and a window (`npoints` observations ending
//! `days_back` observations before the last one) we solve
//!
//! ```text
//! ln y_i ≈ a·x_i + b
//! ```
//!
//! where `x_i` is the number of days since the series' first date. The growth
//! rate `a` gives the doubling time `ln 2 / a`.
//!
//! Fitting is best-effort: a short series or a non-positive count in the
//! window yields no result rather than an error, because daily feeds are
//! sparse and dirty and the caller simply omits the overlay.

use crate::domain::{FitResult, FitWindow, TimeSeries};
use crate::math::fit_line;

/// Why a fit produced no result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitSkip {
    /// The series is shorter than the window needs.
    InsufficientData { required: usize, available: usize },
    /// A count inside the window is zero or negative (no logarithm).
    NonPositiveValue { index: usize, count: i64 },
    /// The least-squares solve found no finite solution.
    Degenerate,
}

impl std::fmt::Display for FitSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FitSkip::InsufficientData {
                required,
                available,
            } => write!(f, "insufficient data: need {required} observations, have {available}"),
            FitSkip::NonPositiveValue { index, count } => {
                write!(f, "non-positive count {count} at index {index}")
            }
            FitSkip::Degenerate => write!(f, "least-squares solve failed"),
        }
    }
}

/// Fit exponential growth to `window` of `series`, or `None` if not possible.
pub fn fit_exponential(series: &TimeSeries, window: FitWindow) -> Option<FitResult> {
    try_fit_exponential(series, window).ok()
}

/// Same as [`fit_exponential`], reporting why a fit was skipped.
pub fn try_fit_exponential(series: &TimeSeries, window: FitWindow) -> Result<FitResult, FitSkip> {
    let n = series.len();
    let required = window.required_len();
    // A line needs at least two points.
    if n < required || window.npoints < 2 {
        return Err(FitSkip::InsufficientData {
            required,
            available: n,
        });
    }

    let Some(origin) = series.first_date() else {
        return Err(FitSkip::InsufficientData {
            required,
            available: 0,
        });
    };

    let end = n - window.days_back;
    let start = end - window.npoints;

    let mut xs = Vec::with_capacity(window.npoints);
    let mut ys = Vec::with_capacity(window.npoints);
    for (index, obs) in series.observations[start..end].iter().enumerate() {
        if obs.count <= 0 {
            return Err(FitSkip::NonPositiveValue {
                index: start + index,
                count: obs.count,
            });
        }
        xs.push((obs.date - origin).num_days() as f64);
        ys.push((obs.count as f64).ln());
    }

    let (growth_rate, intercept) = fit_line(&xs, &ys).ok_or(FitSkip::Degenerate)?;

    // Evaluate over the whole series so the overlay spans the full chart.
    let fitted_curve = series
        .observations
        .iter()
        .map(|obs| {
            let x = (obs.date - origin).num_days() as f64;
            (obs.date, (growth_rate * x + intercept).exp())
        })
        .collect();

    Ok(FitResult {
        growth_rate,
        intercept,
        doubling_time: std::f64::consts::LN_2 / growth_rate,
        window,
        fitted_curve,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 2, 24).unwrap()
    }

    fn series_from(counts: &[i64], origin: NaiveDate) -> TimeSeries {
        let dates: Vec<NaiveDate> = (0..counts.len())
            .map(|i| origin + Duration::days(i as i64))
            .collect();
        TimeSeries::from_parts(&dates, counts)
    }

    fn exponential(n: usize) -> Vec<i64> {
        // Large base so integer rounding is negligible.
        (0..n)
            .map(|i| (1e6 * (0.1 * i as f64).exp()).round() as i64)
            .collect()
    }

    #[test]
    fn short_series_yields_no_fit() {
        let s = series_from(&[1, 2, 4, 8, 16], start());
        assert!(fit_exponential(&s, FitWindow::new(10, 0)).is_none());
        assert!(fit_exponential(&s, FitWindow::new(1, 0)).is_none());
        assert_eq!(
            try_fit_exponential(&s, FitWindow::new(4, 2)),
            Err(FitSkip::InsufficientData {
                required: 6,
                available: 5
            })
        );
    }

    #[test]
    fn non_positive_value_in_window_yields_no_fit() {
        let mut counts = exponential(20);
        counts[15] = 0;
        let s = series_from(&counts, start());
        assert_eq!(
            try_fit_exponential(&s, FitWindow::new(10, 0)),
            Err(FitSkip::NonPositiveValue {
                index: 15,
                count: 0
            })
        );

        // The same zero outside the window does not matter.
        counts[15] = 10;
        counts[2] = -1;
        let s = series_from(&counts, start());
        assert!(fit_exponential(&s, FitWindow::new(10, 0)).is_some());
    }

    #[test]
    fn recovers_growth_rate_of_pure_exponential() {
        let values: Vec<f64> = (0..40).map(|i| 100.0 * (0.1 * i as f64).exp()).collect();
        // Keep fractional precision by scaling into integers.
        let counts: Vec<i64> = values.iter().map(|v| (v * 1e6).round() as i64).collect();
        let s = series_from(&counts, start());

        for window in [
            FitWindow::new(10, 0),
            FitWindow::new(10, 7),
            FitWindow::new(5, 3),
            FitWindow::new(40, 0),
        ] {
            let fit = fit_exponential(&s, window).unwrap();
            assert!((fit.growth_rate - 0.1).abs() < 1e-6, "{window:?}: {}", fit.growth_rate);
        }
    }

    #[test]
    fn doubling_time_is_ln2_over_growth_rate() {
        let s = series_from(&exponential(15), start());
        let fit = fit_exponential(&s, FitWindow::default()).unwrap();
        assert_eq!(fit.doubling_time, std::f64::consts::LN_2 / fit.growth_rate);
        assert!((fit.doubling_time - std::f64::consts::LN_2 / 0.1).abs() < 1e-3);
    }

    #[test]
    fn shifting_dates_leaves_fit_unchanged() {
        let counts = exponential(20);
        let a = fit_exponential(&series_from(&counts, start()), FitWindow::default()).unwrap();
        let later = start() + Duration::days(365);
        let b = fit_exponential(&series_from(&counts, later), FitWindow::default()).unwrap();

        assert!((a.growth_rate - b.growth_rate).abs() < 1e-12);
        assert!((a.doubling_time - b.doubling_time).abs() < 1e-9);
        assert!((a.intercept - b.intercept).abs() < 1e-9);
    }

    #[test]
    fn fitted_curve_spans_full_series() {
        let counts = exponential(25);
        let s = series_from(&counts, start());
        let fit = fit_exponential(&s, FitWindow::new(10, 2)).unwrap();

        assert_eq!(fit.fitted_curve.len(), s.len());
        assert_eq!(fit.fitted_curve[0].0, start());
        let (_, first) = fit.fitted_curve[0];
        assert!((first / 1e6 - 1.0).abs() < 1e-3);
        assert!((fit.predict(0.0) - first).abs() < 1e-6);
    }

    #[test]
    fn decline_is_surfaced_as_negative_doubling_time() {
        let counts: Vec<i64> = (0..12).map(|i| 10_000 - 100 * i).collect();
        let s = series_from(&counts, start());
        let fit = fit_exponential(&s, FitWindow::default()).unwrap();
        assert!(fit.growth_rate < 0.0);
        assert!(fit.doubling_time < 0.0);
    }

    #[test]
    fn gaps_in_reporting_use_calendar_days() {
        // Every other day observed: the rate per day is still 0.1.
        let dates: Vec<NaiveDate> = (0..12).map(|i| start() + Duration::days(2 * i)).collect();
        let counts: Vec<i64> = (0..12)
            .map(|i| (1e6 * (0.2 * i as f64).exp()).round() as i64)
            .collect();
        let s = TimeSeries::from_parts(&dates, &counts);
        let fit = fit_exponential(&s, FitWindow::default()).unwrap();
        assert!((fit.growth_rate - 0.1).abs() < 1e-6);
    }
}
