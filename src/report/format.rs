//! Terminal output for the `fit` subcommand.

use std::path::Path;

use crate::domain::{FitResult, FitWindow};
use crate::fit::FitSkip;

/// Outcome of one fit attempt, for display.
#[derive(Debug, Clone)]
pub struct FitRow {
    pub geography: String,
    pub window: FitWindow,
    pub outcome: Result<FitResult, FitSkip>,
}

/// Header block: what was read and what was fitted.
pub fn format_fit_header(csv: &Path, column: &str, geographies: usize, rows_read: usize) -> String {
    let mut out = String::new();

    out.push_str("=== epicurves - exponential fits ===\n");
    out.push_str(&format!("Input: {}\n", csv.display()));
    out.push_str(&format!("Column: {column}\n"));
    out.push_str(&format!("Rows: {rows_read} | geographies: {geographies}\n"));
    out.push('\n');

    out
}

/// One line per geography and window.
pub fn format_fit_table(rows: &[FitRow]) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:<24} {:>7} {:>9} {:>10} {:>12} {}\n",
            "geography", "npoints", "days_back", "rate", "doubling", "note"
        )
        .trim_end(),
    );
    out.push('\n');

    out.push_str(format!("{:-<24} {:-<7} {:-<9} {:-<10} {:-<12} {:-<4}\n", "", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in rows {
        let (rate, doubling, note) = match &r.outcome {
            Ok(fit) => (
                format!("{:.4}", fit.growth_rate),
                fmt_doubling(fit.doubling_time),
                String::new(),
            ),
            Err(skip) => ("-".to_string(), "-".to_string(), skip.to_string()),
        };
        out.push_str(
            format!(
                "{:<24} {:>7} {:>9} {:>10} {:>12} {}\n",
                truncate(&r.geography, 24),
                r.window.npoints,
                r.window.days_back,
                rate,
                doubling,
                note,
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

fn fmt_doubling(days: f64) -> String {
    if days.is_finite() {
        format!("{days:.1}d")
    } else {
        "inf".to_string()
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fit(rate: f64) -> FitResult {
        FitResult {
            growth_rate: rate,
            intercept: 0.0,
            doubling_time: std::f64::consts::LN_2 / rate,
            window: FitWindow::default(),
            fitted_curve: Vec::new(),
        }
    }

    #[test]
    fn table_shows_fits_and_skips() {
        let rows = vec![
            FitRow {
                geography: "Lombardia".to_string(),
                window: FitWindow::default(),
                outcome: Ok(fit(0.1)),
            },
            FitRow {
                geography: "Molise".to_string(),
                window: FitWindow::new(10, 7),
                outcome: Err(FitSkip::InsufficientData {
                    required: 17,
                    available: 12,
                }),
            },
        ];

        let out = format_fit_table(&rows);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("geography"));
        assert!(lines[2].contains("0.1000"));
        assert!(lines[2].ends_with("6.9d"));
        assert!(lines[3].contains("need 17 observations, have 12"));
    }

    #[test]
    fn flat_series_has_infinite_doubling() {
        assert_eq!(fmt_doubling(f64::INFINITY), "inf");
        assert_eq!(fmt_doubling(-3.21), "-3.2d");
    }

    #[test]
    fn truncate_long_names() {
        assert_eq!(truncate("Provincia Autonoma di Bolzano", 10), "Provincia.");
        assert_eq!(truncate("Lazio", 10), "Lazio");
    }
}
