//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - turns them into a `ReportConfig`
//! - runs a report pipeline or prints terminal fits

use std::path::PathBuf;

use clap::Parser;

use crate::cli::{Command, FitArgs, ReportArgs};
use crate::domain::{ChartConfig, FitWindow, ReportConfig, SmoothConfig, Source};
use crate::error::{AppError, EXIT_INPUT, EXIT_PARTIAL};
use crate::fit::try_fit_exponential;
use crate::io::{DailyLayout, GeoTable, load_daily_csv};
use crate::report::{FitRow, format_fit_header, format_fit_table};

pub mod pipeline;
pub mod sections;

/// Default input directory.
pub const ENV_CSV_DIR: &str = "EPICURVES_CSV_DIR";
/// Default output directory.
pub const ENV_OUTDIR: &str = "EPICURVES_OUTDIR";
/// Default worker thread count.
pub const ENV_JOBS: &str = "EPICURVES_JOBS";

/// Single-series name used by `fit` when the CSV has no geography column.
const FIT_DEFAULT_NAME: &str = "all";

/// Entry point for the `epicurves` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();

    match cli.command {
        Command::Italia(args) => handle_report(report_config_from_args(&args, Source::Italia, None)?),
        Command::World(args) => handle_report(report_config_from_args(&args, Source::World, None)?),
        Command::Us(args) => handle_report(report_config_from_args(&args.report, Source::Us, args.until)?),
        Command::Fit(args) => handle_fit(&args),
    }
}

fn handle_report(config: ReportConfig) -> Result<(), AppError> {
    let outcome = match config.source {
        Source::Italia => pipeline::run_italia(&config)?,
        Source::World => pipeline::run_world(&config)?,
        Source::Us => pipeline::run_us(&config)?,
    };

    if outcome.failed.is_empty() {
        return Ok(());
    }
    Err(AppError::new(
        EXIT_PARTIAL,
        format!(
            "Report written to '{}', but {} geographies failed: {}",
            outcome.index.display(),
            outcome.failed.len(),
            outcome.failed.join(", ")
        ),
    ))
}

fn handle_fit(args: &FitArgs) -> Result<(), AppError> {
    let (table, rows) = fit_rows(args)?;

    print!(
        "{}",
        format_fit_header(&args.csv, &args.column, table.geographies.len(), table.rows_read)
    );
    print!("{}", format_fit_table(&rows));
    Ok(())
}

/// One row per geography and `days_back`, in geography order.
fn fit_rows(args: &FitArgs) -> Result<(GeoTable, Vec<FitRow>), AppError> {
    let columns = [args.column.as_str()];
    let table = load_daily_csv(
        &args.csv,
        &DailyLayout {
            date_column: &args.date_column,
            key_column: args.geo_column.as_deref(),
            default_name: FIT_DEFAULT_NAME,
            columns: &columns,
        },
    )?;

    let mut rows = Vec::new();
    for geo in table.names() {
        let series = match table.series(&geo, &args.column) {
            Ok(series) => series,
            Err(err) => {
                log::warn!("{err}");
                continue;
            }
        };
        for &days_back in &args.days_back {
            let window = FitWindow::new(args.npoints, days_back);
            rows.push(FitRow {
                geography: geo.clone(),
                window,
                outcome: try_fit_exponential(&series, window),
            });
        }
    }
    Ok((table, rows))
}

/// Build a report configuration: flags, then environment, then defaults.
pub fn report_config_from_args(
    args: &ReportArgs,
    source: Source,
    until: Option<chrono::NaiveDate>,
) -> Result<ReportConfig, AppError> {
    let csv_dir = args
        .csv_dir
        .clone()
        .or_else(|| env_path(ENV_CSV_DIR))
        .unwrap_or_else(|| PathBuf::from(source.default_csv_dir()));
    let outdir = args
        .outdir
        .clone()
        .or_else(|| env_path(ENV_OUTDIR))
        .unwrap_or_else(|| pipeline::default_outdir(source));
    let jobs = match args.jobs {
        Some(jobs) => jobs,
        None => env_jobs()?.unwrap_or(1),
    };

    Ok(ReportConfig {
        source,
        csv_dir,
        outdir,
        jobs: jobs.max(1),
        lang: args.lang.unwrap_or(source.default_lang()),
        last_update: args.last_update.clone(),
        footer: args.footer.clone(),
        chart: ChartConfig {
            width: args.width,
            height: args.height,
            ..ChartConfig::default()
        },
        fit_window: FitWindow::new(args.npoints, 0),
        smooth: SmoothConfig {
            window_size: args.smooth_window,
            poly_order: args.smooth_order,
            apply_smoothing: true,
        },
        until,
    })
}

fn env_path(key: &str) -> Option<PathBuf> {
    std::env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from)
}

fn env_jobs() -> Result<Option<usize>, AppError> {
    let Ok(raw) = std::env::var(ENV_JOBS) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<usize>()
        .map(Some)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Invalid {ENV_JOBS} '{raw}': {e}")))
}
