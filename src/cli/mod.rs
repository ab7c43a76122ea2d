//! Command-line parsing for the epidemic curve reports.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! loading, fitting and rendering code. Flags left unset fall back to
//! environment variables and then to per-source defaults (see `app`).

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use crate::domain::{FitWindow, Lang};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "epicurves", version, about = "Epidemic curve reports with exponential fits")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// National, regional and provincial report from the DPC repository.
    Italia(ReportArgs),
    /// Per-country report from the JHU global time series.
    World(ReportArgs),
    /// Per-state report from the JHU US daily reports.
    Us(UsArgs),
    /// Print doubling-time fits for every geography in a CSV.
    Fit(FitArgs),
}

/// Options shared by the HTML reports.
#[derive(Debug, Args, Clone)]
pub struct ReportArgs {
    /// Free text shown as the last update time at the top of the page.
    pub last_update: String,

    /// Input directory [env: EPICURVES_CSV_DIR].
    #[arg(long)]
    pub csv_dir: Option<PathBuf>,

    /// Output directory [env: EPICURVES_OUTDIR; default: ~/public_html/coronavirus/<source>].
    #[arg(long)]
    pub outdir: Option<PathBuf>,

    /// Worker threads [env: EPICURVES_JOBS; default: 1].
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Report language (default: it for italia, en otherwise).
    #[arg(long, value_enum)]
    pub lang: Option<Lang>,

    /// HTML file appended verbatim to the page.
    #[arg(long)]
    pub footer: Option<PathBuf>,

    /// Chart width (pixels).
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Chart height (pixels).
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Observations in the exponential-fit window.
    #[arg(long, default_value_t = FitWindow::DEFAULT_NPOINTS)]
    pub npoints: usize,

    /// Savitzky-Golay window for phase charts (odd).
    #[arg(long, default_value_t = 15)]
    pub smooth_window: usize,

    /// Savitzky-Golay polynomial order for phase charts.
    #[arg(long, default_value_t = 3)]
    pub smooth_order: usize,
}

/// `us` options.
#[derive(Debug, Args, Clone)]
pub struct UsArgs {
    #[command(flatten)]
    pub report: ReportArgs,

    /// Last daily report to read, YYYY-MM-DD (default: yesterday).
    #[arg(long)]
    pub until: Option<NaiveDate>,
}

/// `fit` options.
#[derive(Debug, Args, Clone)]
pub struct FitArgs {
    /// Daily table (one row per geography per day).
    #[arg(long)]
    pub csv: PathBuf,

    /// Date column.
    #[arg(long, default_value = "data")]
    pub date_column: String,

    /// Cumulative count column to fit.
    #[arg(long, default_value = "totale_casi")]
    pub column: String,

    /// Geography column; without it the whole file is one series.
    #[arg(long)]
    pub geo_column: Option<String>,

    /// Observations in the fit window.
    #[arg(long, default_value_t = FitWindow::DEFAULT_NPOINTS)]
    pub npoints: usize,

    /// Leave out the most recent observations (repeatable).
    #[arg(long = "days-back", default_values_t = [0usize])]
    pub days_back: Vec<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_report_flags() {
        let cli = Cli::parse_from([
            "epicurves",
            "italia",
            "01/04/2020 18:00",
            "--csv-dir",
            "/data/dpc",
            "-j",
            "4",
            "--lang",
            "en",
        ]);
        let Command::Italia(args) = cli.command else {
            panic!("expected italia");
        };
        assert_eq!(args.last_update, "01/04/2020 18:00");
        assert_eq!(args.csv_dir, Some(PathBuf::from("/data/dpc")));
        assert_eq!(args.jobs, Some(4));
        assert_eq!(args.lang, Some(Lang::En));
        assert_eq!(args.npoints, 10);
        assert!(args.outdir.is_none());
    }

    #[test]
    fn parses_us_until() {
        let cli = Cli::parse_from(["epicurves", "us", "now", "--until", "2020-04-05"]);
        let Command::Us(args) = cli.command else {
            panic!("expected us");
        };
        assert_eq!(args.until, NaiveDate::from_ymd_opt(2020, 4, 5));
        assert_eq!(args.report.last_update, "now");
    }

    #[test]
    fn fit_days_back_is_repeatable() {
        let cli = Cli::parse_from([
            "epicurves",
            "fit",
            "--csv",
            "x.csv",
            "--days-back",
            "0",
            "--days-back",
            "7",
        ]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.days_back, vec![0, 7]);
        assert_eq!(args.date_column, "data");

        let cli = Cli::parse_from(["epicurves", "fit", "--csv", "x.csv"]);
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.days_back, vec![0]);
    }
}
