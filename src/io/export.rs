//! Export fit summaries to JSON.
//!
//! `fits.json` sits next to the report and lists every fit that produced a
//! chart overlay, so numbers can be consumed without scraping the SVGs.

use std::fs::File;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{FitResult, FitWindow, Source, TimeSeries};
use crate::error::{AppError, EXIT_INPUT, EXIT_OUTPUT};

/// One successful exponential fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitRecord {
    pub geography: String,
    pub metric: String,
    pub window: FitWindow,
    pub growth_rate: f64,
    pub intercept: f64,
    pub doubling_time: f64,
    /// Last date inside the fitted window.
    pub window_end: NaiveDate,
}

impl FitRecord {
    pub fn new(geography: &str, metric: &str, series: &TimeSeries, fit: &FitResult) -> Option<Self> {
        let end = series.len().checked_sub(fit.window.days_back + 1)?;
        let window_end = series.observations.get(end)?.date;
        Some(Self {
            geography: geography.to_string(),
            metric: metric.to_string(),
            window: fit.window,
            growth_rate: fit.growth_rate,
            intercept: fit.intercept,
            doubling_time: fit.doubling_time,
            window_end,
        })
    }
}

/// The `fits.json` document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitsFile {
    pub tool: String,
    pub source: Source,
    pub last_update: String,
    pub fits: Vec<FitRecord>,
}

/// Write `fits.json`.
pub fn write_fits_json(path: &Path, source: Source, last_update: &str, fits: &[FitRecord]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to create fits JSON '{}': {e}", path.display())))?;

    let doc = FitsFile {
        tool: "epicurves".to_string(),
        source,
        last_update: last_update.to_string(),
        fits: fits.to_vec(),
    };

    serde_json::to_writer_pretty(file, &doc)
        .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to write fits JSON: {e}")))?;

    Ok(())
}

/// Read a `fits.json` file back.
pub fn read_fits_json(path: &Path) -> Result<FitsFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to open fits JSON '{}': {e}", path.display())))?;
    let doc: FitsFile =
        serde_json::from_reader(file).map_err(|e| AppError::new(EXIT_INPUT, format!("Invalid fits JSON: {e}")))?;
    Ok(doc)
}
