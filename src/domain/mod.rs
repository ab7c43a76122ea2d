//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - series and fit outputs (`TimeSeries`, `FitResult`, `SmoothedTrajectory`)
//! - run configuration (`ReportConfig`, `ChartConfig`, `SmoothConfig`, `FitWindow`)
//! - localized strings (`Labels`) and typed chart styles (`SeriesStyle`)

pub mod labels;
pub mod style;
pub mod types;

pub use labels::*;
pub use style::*;
pub use types::*;
