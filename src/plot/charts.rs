//! Plotters-powered SVG charts.
//!
//! Three chart shapes cover the report:
//! - time charts: date x-axis, log y-axis (cumulative counts with fit overlays,
//!   daily changes)
//! - bar charts: date x-axis, linear y-axis (daily tests vs. new cases)
//! - phase charts: log-log level vs. daily change
//!
//! Points that cannot be shown on a log axis (zero, negative corrections,
//! non-finite) break the line instead of failing the render.

use std::path::Path;

use plotters::coord::CoordTranslate;
use plotters::prelude::*;

use super::{BarSeries, ChartText, PlotSeries, drawable_runs, format_day};
use crate::domain::{ChartConfig, LineKind, Marker};
use crate::error::{AppError, EXIT_OUTPUT};

type DrawResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Headroom above the largest value when the configured limit is too low.
const HEADROOM: f64 = 1.5;

/// Date x-axis, log y-axis from `y_min` up to `config.ymax` (grown to fit
/// the data).
pub fn render_time_chart(
    path: &Path,
    text: &ChartText,
    config: &ChartConfig,
    y_min: f64,
    series: &[PlotSeries],
) -> Result<(), AppError> {
    draw_time_chart(path, text, config, y_min, series).map_err(|e| render_error(path, e))
}

/// Log-log chart; bounds follow the data.
pub fn render_phase_chart(
    path: &Path,
    text: &ChartText,
    config: &ChartConfig,
    series: &[PlotSeries],
) -> Result<(), AppError> {
    draw_phase_chart(path, text, config, series).map_err(|e| render_error(path, e))
}

/// Date x-axis, linear y-axis, side-by-side bars.
pub fn render_bar_chart(
    path: &Path,
    text: &ChartText,
    config: &ChartConfig,
    bars: &[BarSeries],
) -> Result<(), AppError> {
    draw_bar_chart(path, text, config, bars).map_err(|e| render_error(path, e))
}

fn draw_time_chart(
    path: &Path,
    text: &ChartText,
    config: &ChartConfig,
    y_min: f64,
    series: &[PlotSeries],
) -> DrawResult {
    let (x0, x1) = linear_bounds(series.iter().flat_map(|s| s.points.iter().map(|p| p.0)));
    let data_max = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.1))
        .filter(|v| v.is_finite())
        .fold(0.0, f64::max);
    let y_min = y_min.max(f64::MIN_POSITIVE);
    let y1 = config.ymax.max(data_max * HEADROOM).max(y_min * 10.0);

    let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&text.title, ("sans-serif", 18))
        .margin(10)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x0..x1, (y_min..y1).log_scale())?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(&text.x_label)
        .y_desc(&text.y_label)
        .x_labels(6)
        .x_label_formatter(&|v| format_day(*v))
        .y_label_formatter(&|v| format_count(*v))
        .draw()?;

    let mut labelled = false;
    for s in series {
        labelled |= draw_plot_series(&mut chart, s, false)?;
    }
    if labelled {
        draw_legend(&mut chart)?;
    }

    root.present()?;
    Ok(())
}

fn draw_phase_chart(path: &Path, text: &ChartText, config: &ChartConfig, series: &[PlotSeries]) -> DrawResult {
    let visible: Vec<(f64, f64)> = series
        .iter()
        .flat_map(|s| drawable_runs(&s.points, true))
        .flatten()
        .collect();
    let (x0, x1) = log_bounds(visible.iter().map(|p| p.0), (10.0, 1000.0));
    let (y0, y1) = log_bounds(visible.iter().map(|p| p.1), (1.0, 100.0));

    let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&text.title, ("sans-serif", 18))
        .margin(10)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d((x0..x1).log_scale(), (y0..y1).log_scale())?;

    chart
        .configure_mesh()
        .x_desc(&text.x_label)
        .y_desc(&text.y_label)
        .x_label_formatter(&|v| format_count(*v))
        .y_label_formatter(&|v| format_count(*v))
        .draw()?;

    let mut labelled = false;
    for s in series {
        labelled |= draw_plot_series(&mut chart, s, true)?;
    }
    if labelled {
        draw_legend(&mut chart)?;
    }

    root.present()?;
    Ok(())
}

fn draw_bar_chart(path: &Path, text: &ChartText, config: &ChartConfig, bars: &[BarSeries]) -> DrawResult {
    let (x0, x1) = linear_bounds(bars.iter().flat_map(|b| {
        b.points
            .iter()
            .flat_map(move |p| [p.0 + b.offset, p.0 + b.offset + b.width])
    }));
    let values = || {
        bars.iter()
            .flat_map(|b| b.points.iter().map(|p| p.1))
            .filter(|v| v.is_finite())
    };
    let y0 = values().fold(0.0, f64::min);
    let y1 = values().fold(0.0, f64::max) * 1.1;
    let y1 = if y1 > y0 { y1 } else { y0 + 1.0 };

    let root = SVGBackend::new(path, (config.width, config.height)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(&text.title, ("sans-serif", 18))
        .margin(10)
        .set_label_area_size(LabelAreaPosition::Left, 60)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .build_cartesian_2d(x0..x1, y0..y1)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(&text.x_label)
        .y_desc(&text.y_label)
        .x_labels(6)
        .x_label_formatter(&|v| format_day(*v))
        .y_label_formatter(&|v| format_count(*v))
        .draw()?;

    for bar in bars {
        let color = bar.style.color.rgb();
        let rects: Vec<_> = bar
            .points
            .iter()
            .filter(|p| p.0.is_finite() && p.1.is_finite())
            .map(|&(x, y)| {
                let left = x + bar.offset;
                Rectangle::new([(left, 0.0), (left + bar.width, y)], color.filled())
            })
            .collect();
        if rects.is_empty() {
            continue;
        }
        chart
            .draw_series(rects)?
            .label(bar.label.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 4), (x + 12, y + 4)], color.filled()));
    }
    if !bars.is_empty() {
        draw_legend(&mut chart)?;
    }

    root.present()?;
    Ok(())
}

/// Draw one series; returns whether it added a legend entry.
fn draw_plot_series<'a, DB, CT>(chart: &mut ChartContext<'a, DB, CT>, series: &PlotSeries, log_x: bool) -> DrawResult<bool>
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    CT: CoordTranslate<From = (f64, f64)>,
{
    let runs = drawable_runs(&series.points, log_x);
    if runs.is_empty() {
        return Ok(false);
    }

    let color = series.style.color.rgb();
    let line_style = color.stroke_width(series.style.width);

    let segments = match series.style.line {
        LineKind::Solid => runs.clone(),
        LineKind::Dashed => dash_segments(&runs),
    };
    let anno = chart.draw_series(segments.into_iter().map(|seg| PathElement::new(seg, line_style)))?;

    let labelled = match &series.label {
        Some(label) => {
            anno.label(label.as_str())
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], line_style));
            true
        }
        None => false,
    };

    if let Some(Marker::Circle) = series.style.marker {
        let radius = series.style.marker_size as i32;
        chart.draw_series(
            runs.iter()
                .flatten()
                .map(|&p| Circle::new(p, radius, color.filled())),
        )?;
    }

    Ok(labelled)
}

fn draw_legend<'a, DB, CT>(chart: &mut ChartContext<'a, DB, CT>) -> DrawResult
where
    DB: DrawingBackend + 'a,
    DB::ErrorType: 'static,
    CT: CoordTranslate,
{
    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;
    Ok(())
}

/// Every other segment of each run, which reads as a dashed line on daily data.
fn dash_segments(runs: &[Vec<(f64, f64)>]) -> Vec<Vec<(f64, f64)>> {
    runs.iter()
        .flat_map(|run| run.windows(2).step_by(2).map(|w| w.to_vec()))
        .collect()
}

/// Data range padded by one unit on each side.
fn linear_bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(lo.is_finite() && hi.is_finite()) {
        return (0.0, 1.0);
    }
    (lo - 1.0, hi + 1.0)
}

/// Positive data range widened by a constant factor, or `default` when empty.
fn log_bounds(values: impl Iterator<Item = f64>, default: (f64, f64)) -> (f64, f64) {
    let (lo, hi) = values
        .filter(|v| v.is_finite() && *v > 0.0)
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !(lo.is_finite() && hi.is_finite()) {
        return default;
    }
    if hi / lo < 2.0 {
        return (lo / 2.0, hi * 2.0);
    }
    (lo / 1.25, hi * 1.25)
}

fn format_count(v: f64) -> String {
    if v.abs() >= 1.0 || v == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.2}")
    }
}

fn render_error(path: &Path, e: Box<dyn std::error::Error>) -> AppError {
    AppError::new(
        EXIT_OUTPUT,
        format!("Failed to render chart '{}': {e}", path.display()),
    )
}
