//! Report pipelines shared by the `italia`, `world` and `us` subcommands.
//!
//! Every pipeline follows the same workflow:
//! load CSVs -> render one section per geography (in parallel) -> assemble
//! the page -> write `index.html` and `fits.json`
//!
//! A geography that fails is logged, shown as a failed section and listed in
//! the outcome; the rest of the batch still renders.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Duration, Local};
use rayon::prelude::*;

use super::sections::{
    DEATHS_IT, INTENSIVE_CARE, NATION, SectionContext, TESTS, TOTAL_CASES, Unit, italia_national, italia_province,
    italia_region, jhu_geography,
};
use crate::domain::{Labels, ReportConfig, Source};
use crate::error::{AppError, EXIT_INPUT, EXIT_OUTPUT};
use crate::io::{
    CONFIRMED, DEATHS, DailyLayout, FitRecord, GeoTable, load_daily_csv, load_jhu_daily, load_jhu_global, us_states,
    write_fits_json,
};
use crate::report::{Page, Section};

const DPC_NATIONAL: &str = "dati-andamento-nazionale/dpc-covid19-ita-andamento-nazionale.csv";
const DPC_REGIONS: &str = "dati-regioni/dpc-covid19-ita-regioni.csv";
const DPC_PROVINCES: &str = "dati-province/dpc-covid19-ita-province.csv";
const DPC_DATE: &str = "data";
const DPC_REGION_KEY: &str = "denominazione_regione";
const DPC_PROVINCE_KEY: &str = "sigla_provincia";

const JHU_CONFIRMED: &str = "time_series_covid19_confirmed_global.csv";
const JHU_DEATHS: &str = "time_series_covid19_deaths_global.csv";

/// What a report run produced.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub index: PathBuf,
    pub fits_json: PathBuf,
    pub sections: usize,
    pub fits: usize,
    /// Geographies whose section could not be rendered.
    pub failed: Vec<String>,
}

/// Sections and fits collected from a batch of units.
#[derive(Debug, Default)]
struct Batch {
    sections: Vec<Section>,
    fits: Vec<FitRecord>,
    failed: Vec<String>,
}

impl Batch {
    fn absorb(&mut self, name: &str, result: Result<Unit, AppError>, labels: &Labels) {
        match result {
            Ok(unit) => {
                self.sections.push(unit.section);
                self.fits.extend(unit.fits);
            }
            Err(err) => {
                log::error!("{name}: {err}");
                self.sections.push(Section::failed(name, labels, &err));
                self.failed.push(name.to_string());
            }
        }
    }

    fn extend(&mut self, other: Batch) {
        self.sections.extend(other.sections);
        self.fits.extend(other.fits);
        self.failed.extend(other.failed);
    }
}

/// Render one unit per name on a pool of `jobs` threads, keeping name order.
fn render_all<F>(jobs: usize, names: &[String], labels: &Labels, render: F) -> Result<Batch, AppError>
where
    F: Fn(&str) -> Result<Unit, AppError> + Sync,
{
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to start worker pool: {e}")))?;

    let results: Vec<Result<Unit, AppError>> = pool.install(|| {
        names
            .par_iter()
            .map(|name| {
                log::info!("{name}");
                render(name.as_str())
            })
            .collect()
    });

    let mut batch = Batch::default();
    for (name, result) in names.iter().zip(results) {
        batch.absorb(name, result, labels);
    }
    Ok(batch)
}

/// National, regional and provincial report from the DPC repository.
pub fn run_italia(config: &ReportConfig) -> Result<ReportOutcome, AppError> {
    prepare_outdir(&config.outdir)?;
    let ctx = SectionContext::new(config);
    let labels = &ctx.labels;

    let metrics = [TOTAL_CASES, DEATHS_IT, INTENSIVE_CARE, TESTS];
    let national = load_daily_csv(
        &config.csv_dir.join(DPC_NATIONAL),
        &DailyLayout {
            date_column: DPC_DATE,
            key_column: None,
            default_name: NATION,
            columns: &metrics,
        },
    )?;
    let regions = load_daily_csv(
        &config.csv_dir.join(DPC_REGIONS),
        &DailyLayout {
            date_column: DPC_DATE,
            key_column: Some(DPC_REGION_KEY),
            default_name: NATION,
            columns: &metrics,
        },
    )?;
    let provinces = load_daily_csv(
        &config.csv_dir.join(DPC_PROVINCES),
        &DailyLayout {
            date_column: DPC_DATE,
            key_column: Some(DPC_PROVINCE_KEY),
            default_name: NATION,
            columns: &[TOTAL_CASES],
        },
    )?;

    let mut page = Page::new();
    page.last_update(labels, &config.last_update);
    page.heading(labels.national_heading);

    log::info!("{NATION}");
    let mut batch = Batch::default();
    batch.absorb(NATION, italia_national(&ctx, &national), labels);
    for s in &batch.sections {
        page.push(&s.html);
    }

    let regional = render_all(config.jobs, &regions.names(), labels, |name| {
        italia_region(&ctx, &regions, name)
    })?;
    page.heading(labels.regional_heading);
    page.sections(&regional.sections);
    batch.extend(regional);

    let provincial = render_all(config.jobs, &provinces.names(), labels, |name| {
        italia_province(&ctx, &provinces, name)
    })?;
    page.heading(labels.provincial_heading);
    page.sections(&provincial.sections);
    batch.extend(provincial);

    finish(config, page, batch)
}

/// Per-country report from the JHU global time series.
pub fn run_world(config: &ReportConfig) -> Result<ReportOutcome, AppError> {
    prepare_outdir(&config.outdir)?;
    let ctx = SectionContext::new(config);

    let mut table = load_jhu_global(&config.csv_dir.join(JHU_CONFIRMED), CONFIRMED)?;
    let countries = table.names();
    table.merge(load_jhu_global(&config.csv_dir.join(JHU_DEATHS), DEATHS)?);

    run_jhu(&ctx, &table, &countries)
}

/// Per-state report from the JHU US daily reports.
pub fn run_us(config: &ReportConfig) -> Result<ReportOutcome, AppError> {
    prepare_outdir(&config.outdir)?;
    let ctx = SectionContext::new(config);

    let until = config
        .until
        .unwrap_or_else(|| Local::now().date_naive() - Duration::days(1));
    let table = load_jhu_daily(&config.csv_dir, until)?;
    let states = us_states(&config.csv_dir)?;

    run_jhu(&ctx, &table, &states)
}

fn run_jhu(ctx: &SectionContext<'_>, table: &GeoTable, names: &[String]) -> Result<ReportOutcome, AppError> {
    let config = ctx.config;
    let labels = &ctx.labels;

    let batch = render_all(config.jobs, names, labels, |name| jhu_geography(ctx, table, name))?;

    let mut page = Page::new();
    page.last_update(labels, &config.last_update);
    page.sections(&batch.sections);

    finish(config, page, batch)
}

fn finish(config: &ReportConfig, mut page: Page, batch: Batch) -> Result<ReportOutcome, AppError> {
    if let Some(footer) = &config.footer {
        page.footer(footer)?;
    }
    let index = page.write(&config.outdir)?;

    let fits_json = config.outdir.join("fits.json");
    write_fits_json(&fits_json, config.source, &config.last_update, &batch.fits)?;

    log::info!(
        "Wrote {} ({} sections, {} fits, {} failed)",
        index.display(),
        batch.sections.len(),
        batch.fits.len(),
        batch.failed.len()
    );

    Ok(ReportOutcome {
        index,
        fits_json,
        sections: batch.sections.len(),
        fits: batch.fits.len(),
        failed: batch.failed,
    })
}

fn prepare_outdir(outdir: &Path) -> Result<(), AppError> {
    fs::create_dir_all(outdir)
        .map_err(|e| AppError::new(EXIT_OUTPUT, format!("Failed to create '{}': {e}", outdir.display())))
}

/// Default report location: `$HOME/public_html/coronavirus/<source>`.
pub fn default_outdir(source: Source) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from).unwrap_or_default();
    home.join("public_html/coronavirus").join(source.dir_name())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Lang;
    use crate::error::EXIT_NO_DATA;

    #[test]
    fn render_all_keeps_order_and_isolates_failures() {
        let labels = Labels::for_lang(Lang::En);
        let names: Vec<String> = ["b", "a", "c"].iter().map(|s| s.to_string()).collect();

        let batch = render_all(2, &names, &labels, |name| {
            if name == "a" {
                return Err(AppError::new(EXIT_NO_DATA, "nothing here"));
            }
            Ok(Unit {
                section: Section {
                    name: name.to_string(),
                    html: format!("<p>{name}</p>"),
                },
                fits: Vec::new(),
            })
        })
        .unwrap();

        let order: Vec<&str> = batch.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
        assert_eq!(batch.failed, vec!["a".to_string()]);
        assert!(batch.sections[1].html.contains("Processing failed"));
    }

    #[test]
    fn default_outdir_ends_with_source() {
        let p = default_outdir(Source::World);
        assert!(p.ends_with("public_html/coronavirus/world"));
    }
}
