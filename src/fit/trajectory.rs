//! Phase trajectories: cumulative level vs. daily change.
//!
//! Cumulative epidemic counts grow multiplicatively, so the Savitzky–Golay
//! filter runs on `ln(level)` and the result is exponentiated back. Filtering
//! the raw values would let the large late values dominate the fit.

use crate::domain::{NOISE_FLOOR, SmoothConfig, SmoothedTrajectory, TrajectoryPoint};
use crate::error::SmoothError;
use crate::math::{savgol_filter, validate_params};

/// Build a `(level, delta)` trajectory from a cumulative series.
///
/// Only values `>= NOISE_FLOOR` are used. With smoothing enabled and fewer
/// than `window_size + 2` retained values the trajectory is empty. An invalid
/// filter configuration is an error even when there is nothing to smooth.
/// Points whose smoothed level falls under the floor are dropped.
pub fn smooth_trajectory(series: &[f64], config: &SmoothConfig) -> Result<SmoothedTrajectory, SmoothError> {
    if config.apply_smoothing {
        validate_params(config.window_size, config.poly_order)?;
    }

    let retained: Vec<f64> = series.iter().copied().filter(|&v| v >= NOISE_FLOOR).collect();

    let levels = if config.apply_smoothing {
        if retained.len() < config.window_size.saturating_add(2) {
            return Ok(SmoothedTrajectory::default());
        }
        let logs: Vec<f64> = retained.iter().map(|v| v.ln()).collect();
        savgol_filter(&logs, config.window_size, config.poly_order)?
            .into_iter()
            .map(f64::exp)
            .collect()
    } else {
        retained
    };

    // Filter ringing around sharp jumps can pull smoothed levels under the floor.
    let points = levels
        .windows(2)
        .map(|w| TrajectoryPoint {
            level: w[1],
            delta: w[1] - w[0],
        })
        .filter(|p| p.level >= NOISE_FLOOR)
        .collect();

    Ok(SmoothedTrajectory { points })
}
