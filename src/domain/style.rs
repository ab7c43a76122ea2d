//! Typed series styling.
//!
//! Every chart series is drawn with a `SeriesStyle`. The presets mirror the
//! report's visual conventions: blue dots for cases, red for deaths, orange
//! for intensive care, and black → light gray fit lines for progressively
//! older fit windows (solid for cases, dashed for deaths).

use plotters::style::RGBColor;

/// Named colours used by the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesColor {
    /// Default first-series blue.
    Blue,
    Red,
    Orange,
    Black,
    Gray,
    LightGray,
}

impl SeriesColor {
    pub fn rgb(self) -> RGBColor {
        match self {
            SeriesColor::Blue => RGBColor(31, 119, 180),
            SeriesColor::Red => RGBColor(255, 0, 0),
            SeriesColor::Orange => RGBColor(255, 165, 0),
            SeriesColor::Black => RGBColor(0, 0, 0),
            SeriesColor::Gray => RGBColor(128, 128, 128),
            SeriesColor::LightGray => RGBColor(211, 211, 211),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Circle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Solid,
    Dashed,
}

/// Visual options for one plotted series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeriesStyle {
    pub color: SeriesColor,
    pub marker: Option<Marker>,
    /// Marker radius in pixels.
    pub marker_size: u32,
    pub line: LineKind,
    /// Line width in pixels.
    pub width: u32,
}

impl SeriesStyle {
    const fn dotted(color: SeriesColor) -> Self {
        Self {
            color,
            marker: Some(Marker::Circle),
            marker_size: 3,
            line: LineKind::Solid,
            width: 1,
        }
    }

    const fn line(color: SeriesColor, line: LineKind) -> Self {
        Self {
            color,
            marker: None,
            marker_size: 0,
            line,
            width: 1,
        }
    }

    pub const fn total_cases() -> Self {
        Self::dotted(SeriesColor::Blue)
    }

    pub const fn deaths() -> Self {
        Self::dotted(SeriesColor::Red)
    }

    pub const fn intensive_care() -> Self {
        Self::dotted(SeriesColor::Orange)
    }

    /// Fit overlay for case counts. `age` 0 is the current window, 1 the
    /// previous day, 2 and above anything older.
    pub const fn case_fit(age: usize) -> Self {
        Self::line(fit_shade(age), LineKind::Solid)
    }

    /// Fit overlay for deaths, same shading as `case_fit` but dashed.
    pub const fn death_fit(age: usize) -> Self {
        Self::line(fit_shade(age), LineKind::Dashed)
    }

    /// Thin background line (unsmoothed phase trajectories).
    pub const fn faint_line() -> Self {
        Self::line(SeriesColor::LightGray, LineKind::Solid)
    }

    /// Default-coloured plain line (smoothed phase trajectories).
    pub const fn plain_line() -> Self {
        Self::line(SeriesColor::Blue, LineKind::Solid)
    }

    /// Bar fill.
    pub const fn bar(color: SeriesColor) -> Self {
        Self::line(color, LineKind::Solid)
    }
}

const fn fit_shade(age: usize) -> SeriesColor {
    match age {
        0 => SeriesColor::Black,
        1 => SeriesColor::Gray,
        _ => SeriesColor::LightGray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_overlays_fade_with_age() {
        assert_eq!(SeriesStyle::case_fit(0).color, SeriesColor::Black);
        assert_eq!(SeriesStyle::case_fit(1).color, SeriesColor::Gray);
        assert_eq!(SeriesStyle::case_fit(7).color, SeriesColor::LightGray);
        assert_eq!(SeriesStyle::death_fit(0).line, LineKind::Dashed);
    }
}
