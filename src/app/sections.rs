//! Per-geography report sections.
//!
//! Each unit of work renders the charts of one geography into the output
//! directory and returns the HTML that references them, plus the fits it
//! drew. Units share nothing but the read-only input table, so the pipeline
//! can run them on any thread.

use std::path::PathBuf;

use crate::domain::{
    ChartConfig, FitWindow, Labels, ReportConfig, SeriesColor, SeriesStyle, SmoothConfig, TimeSeries,
};
use crate::error::AppError;
use crate::fit::{smooth_trajectory, try_fit_exponential};
use crate::io::{CONFIRMED, DEATHS, FitRecord, GeoTable};
use crate::plot::{
    BarSeries, ChartText, PlotSeries, day_number, render_bar_chart, render_phase_chart, render_time_chart,
};
use crate::report::{Section, Table, anchor_heading, img_tag};

/// DPC metric columns.
pub const TOTAL_CASES: &str = "totale_casi";
pub const DEATHS_IT: &str = "deceduti";
pub const INTENSIVE_CARE: &str = "terapia_intensiva";
pub const TESTS: &str = "tamponi";

/// Name of the single geography in the national file.
pub const NATION: &str = "Italia";

/// Windows ending today, the two previous days and a week ago.
const TREND_DAYS_BACK: [usize; 4] = [0, 1, 2, 7];
/// Upper y-limit for daily-change charts and provincial cumulative charts.
const SMALL_YMAX: f64 = 1e5;
const BAR_WIDTH: f64 = 0.4;

/// A rendered geography and the fits shown on its charts.
#[derive(Debug, Clone)]
pub struct Unit {
    pub section: Section,
    pub fits: Vec<FitRecord>,
}

/// Settings shared by every unit of one report.
#[derive(Debug, Clone)]
pub struct SectionContext<'a> {
    pub config: &'a ReportConfig,
    pub labels: Labels,
}

impl<'a> SectionContext<'a> {
    pub fn new(config: &'a ReportConfig) -> Self {
        Self {
            config,
            labels: Labels::for_lang(config.lang),
        }
    }
}

/// A measured series drawn with markers.
struct Metric<'s> {
    label: &'s str,
    series: &'s TimeSeries,
    style: SeriesStyle,
}

/// An exponential-fit overlay.
struct Overlay<'s> {
    metric: &'s str,
    series: &'s TimeSeries,
    window: FitWindow,
    style: SeriesStyle,
}

/// Builds the charts of one geography.
struct SectionBuilder<'c, 'a> {
    ctx: &'c SectionContext<'a>,
    name: String,
    stem: String,
    html: String,
    fits: Vec<FitRecord>,
}

impl<'c, 'a> SectionBuilder<'c, 'a> {
    fn new(ctx: &'c SectionContext<'a>, name: &str) -> Self {
        Self {
            ctx,
            name: name.to_string(),
            stem: file_stem(name),
            html: String::new(),
            fits: Vec::new(),
        }
    }

    fn labels(&self) -> &Labels {
        &self.ctx.labels
    }

    fn chart_path(&self, suffix: &str) -> PathBuf {
        self.ctx.config.outdir.join(format!("{}{suffix}.svg", self.stem))
    }

    fn title(&self, suffix: &str) -> String {
        self.labels().titled(&self.name, suffix)
    }

    fn main_window(&self) -> FitWindow {
        self.ctx.config.fit_window
    }

    /// Cumulative counts on a log axis with fit overlays. Returns the `<img>` tag.
    fn cumulative(
        &mut self,
        suffix: &str,
        title: &str,
        chart: ChartConfig,
        metrics: &[Metric<'_>],
        overlays: &[Overlay<'_>],
    ) -> Result<String, AppError> {
        let mut series: Vec<PlotSeries> = metrics
            .iter()
            .map(|m| PlotSeries::dated(Some(m.label.to_string()), dated_counts(m.series), m.style))
            .collect();

        for o in overlays {
            match try_fit_exponential(o.series, o.window) {
                Ok(fit) => {
                    let label = self.labels().doubling_label(fit.doubling_time);
                    series.push(PlotSeries::dated(Some(label), fit.fitted_curve.iter().copied(), o.style));
                    if let Some(record) = FitRecord::new(&self.name, o.metric, o.series, &fit) {
                        self.record(record);
                    }
                }
                Err(skip) => log::debug!(
                    "{}: no {} fit (npoints={}, days_back={}): {skip}",
                    self.name,
                    o.metric,
                    o.window.npoints,
                    o.window.days_back
                ),
            }
        }

        let labels = self.labels();
        let text = ChartText::new(title, labels.date, labels.number_of_cases);
        let path = self.chart_path(suffix);
        render_time_chart(&path, &text, &chart, 1.0, &series)?;
        Ok(img_tag(&path))
    }

    fn record(&mut self, record: FitRecord) {
        let seen = self
            .fits
            .iter()
            .any(|f| f.metric == record.metric && f.window == record.window);
        if !seen {
            self.fits.push(record);
        }
    }

    /// Day-over-day changes on a log axis.
    fn daily(&mut self, metrics: &[Metric<'_>]) -> Result<(), AppError> {
        let series: Vec<PlotSeries> = metrics
            .iter()
            .map(|m| {
                let changes = m.series.daily_changes().into_iter().map(|(d, c)| (d, c as f64));
                PlotSeries::dated(Some(m.label.to_string()), changes, m.style)
            })
            .collect();

        let labels = self.labels();
        let text = ChartText::new(
            self.title(labels.daily_suffix),
            labels.date,
            labels.number_of_daily_cases,
        );
        let chart = self.ctx.config.chart.with_ymax(SMALL_YMAX);
        let path = self.chart_path("_daily");
        render_time_chart(&path, &text, &chart, 1.0, &series)?;
        self.html.push_str(&img_tag(&path));
        Ok(())
    }

    /// Daily tests next to daily new cases.
    fn tests(&mut self, cases: &TimeSeries, tests: &TimeSeries) -> Result<(), AppError> {
        let labels = self.labels();
        let bars = [
            BarSeries {
                label: labels.tests.to_string(),
                points: daily_points(tests),
                style: SeriesStyle::bar(SeriesColor::Gray),
                offset: 0.0,
                width: BAR_WIDTH,
            },
            BarSeries {
                label: labels.new_cases.to_string(),
                points: daily_points(cases),
                style: SeriesStyle::bar(SeriesColor::Red),
                offset: BAR_WIDTH,
                width: BAR_WIDTH,
            },
        ];

        let text = ChartText::new(self.title(labels.tests_suffix), labels.date, labels.number_of_tests);
        let path = self.chart_path("_tests");
        render_bar_chart(&path, &text, &self.ctx.config.chart, &bars)?;
        self.html.push_str(&img_tag(&path));
        Ok(())
    }

    /// Daily change against level, raw and smoothed.
    fn phase(&mut self, suffix: &str, title_suffix: &str, series: &TimeSeries, deaths: bool) -> Result<(), AppError> {
        let values = series.values();
        let raw = smooth_trajectory(&values, &SmoothConfig::raw())?;
        let smoothed = smooth_trajectory(&values, &self.ctx.config.smooth)?;

        let lines = [
            PlotSeries::new(None, trajectory_points(&raw), SeriesStyle::faint_line()),
            PlotSeries::new(None, trajectory_points(&smoothed), SeriesStyle::plain_line()),
        ];

        let labels = self.labels();
        let (x_label, y_label) = if deaths {
            (labels.number_of_deaths, labels.number_of_daily_deaths)
        } else {
            (labels.number_of_cases, labels.number_of_daily_cases)
        };
        let text = ChartText::new(self.title(title_suffix), x_label, y_label);
        let path = self.chart_path(suffix);
        render_phase_chart(&path, &text, &self.ctx.config.chart, &lines)?;
        self.html.push_str(&img_tag(&path));
        Ok(())
    }

    fn finish(self, with_heading: bool) -> Unit {
        let html = if with_heading {
            format!("{}{}", anchor_heading(&self.name), self.html)
        } else {
            self.html
        };
        Unit {
            section: Section { name: self.name, html },
            fits: self.fits,
        }
    }
}

/// Case and death overlays for one window; `age` picks the shade.
fn fit_pair<'s>(
    cases: (&'s str, &'s TimeSeries),
    deaths: (&'s str, &'s TimeSeries),
    window: FitWindow,
    age: usize,
) -> [Overlay<'s>; 2] {
    [
        Overlay {
            metric: cases.0,
            series: cases.1,
            window,
            style: SeriesStyle::case_fit(age),
        },
        Overlay {
            metric: deaths.0,
            series: deaths.1,
            window,
            style: SeriesStyle::death_fit(age),
        },
    ]
}

/// The national block: captioned cumulative and trend charts, then the
/// daily, tests and phase charts.
pub fn italia_national(ctx: &SectionContext<'_>, table: &GeoTable) -> Result<Unit, AppError> {
    let cases = table.series(NATION, TOTAL_CASES)?;
    let icu = table.series(NATION, INTENSIVE_CARE)?;
    let deaths = table.series(NATION, DEATHS_IT)?;
    let tests = table.series(NATION, TESTS)?;

    let mut b = SectionBuilder::new(ctx, NATION);
    let labels = ctx.labels.clone();
    let window = b.main_window();
    let chart = ctx.config.chart;
    let inline = Table::inline();

    let img = b.cumulative(
        "",
        NATION,
        chart,
        &[
            Metric {
                label: labels.total_cases,
                series: &cases,
                style: SeriesStyle::total_cases(),
            },
            Metric {
                label: labels.intensive_care,
                series: &icu,
                style: SeriesStyle::intensive_care(),
            },
            Metric {
                label: labels.deaths,
                series: &deaths,
                style: SeriesStyle::deaths(),
            },
        ],
        &fit_pair((TOTAL_CASES, &cases), (DEATHS_IT, &deaths), window, 0),
    )?;
    b.html
        .push_str(&inline.captioned(&img, &Labels::caption(labels.fit_caption, window.npoints)));

    let mut overlays = Vec::new();
    for (age, days_back) in TREND_DAYS_BACK.into_iter().enumerate() {
        let w = FitWindow::new(window.npoints, days_back);
        overlays.extend(fit_pair((TOTAL_CASES, &cases), (DEATHS_IT, &deaths), w, age));
    }
    let trend_title = b.title(labels.trend_suffix);
    let img = b.cumulative(
        "_trend",
        &trend_title,
        chart,
        &[
            Metric {
                label: labels.total_cases,
                series: &cases,
                style: SeriesStyle::total_cases(),
            },
            Metric {
                label: labels.deaths,
                series: &deaths,
                style: SeriesStyle::deaths(),
            },
        ],
        &overlays,
    )?;
    b.html
        .push_str(&inline.captioned(&img, &Labels::caption(labels.trend_caption, window.npoints)));

    daily_cases_and_deaths(&mut b, &labels, &cases, &deaths)?;
    b.tests(&cases, &tests)?;
    b.phase("_cases_oo", labels.cases_suffix, &cases, false)?;
    b.phase("_deaths_oo", labels.deaths_suffix, &deaths, true)?;

    Ok(b.finish(false))
}

/// One region of the DPC regional file.
pub fn italia_region(ctx: &SectionContext<'_>, table: &GeoTable, name: &str) -> Result<Unit, AppError> {
    let cases = table.series(name, TOTAL_CASES)?;
    let icu = table.series(name, INTENSIVE_CARE)?;
    let deaths = table.series(name, DEATHS_IT)?;
    let tests = table.series(name, TESTS)?;

    let mut b = SectionBuilder::new(ctx, name);
    let labels = ctx.labels.clone();
    let window = b.main_window();

    let img = b.cumulative(
        "",
        name,
        ctx.config.chart,
        &[
            Metric {
                label: labels.total_cases,
                series: &cases,
                style: SeriesStyle::total_cases(),
            },
            Metric {
                label: labels.intensive_care,
                series: &icu,
                style: SeriesStyle::intensive_care(),
            },
            Metric {
                label: labels.deaths,
                series: &deaths,
                style: SeriesStyle::deaths(),
            },
        ],
        &fit_pair((TOTAL_CASES, &cases), (DEATHS_IT, &deaths), window, 0),
    )?;
    b.html.push_str(&img);

    daily_cases_and_deaths(&mut b, &labels, &cases, &deaths)?;
    b.tests(&cases, &tests)?;
    b.phase("_cases_oo", labels.cases_suffix, &cases, false)?;
    b.phase("_deaths_oo", labels.deaths_suffix, &deaths, true)?;

    Ok(b.finish(true))
}

/// One province: cases only.
pub fn italia_province(ctx: &SectionContext<'_>, table: &GeoTable, name: &str) -> Result<Unit, AppError> {
    let cases = table.series(name, TOTAL_CASES)?;

    let mut b = SectionBuilder::new(ctx, name);
    let labels = ctx.labels.clone();
    let window = b.main_window();

    let img = b.cumulative(
        "",
        name,
        ctx.config.chart.with_ymax(SMALL_YMAX),
        &[Metric {
            label: labels.total_cases,
            series: &cases,
            style: SeriesStyle::total_cases(),
        }],
        &[Overlay {
            metric: TOTAL_CASES,
            series: &cases,
            window,
            style: SeriesStyle::case_fit(0),
        }],
    )?;
    b.html.push_str(&img);

    b.daily(&[Metric {
        label: labels.new_cases,
        series: &cases,
        style: SeriesStyle::total_cases(),
    }])?;
    b.phase("_cases_oo", labels.cases_suffix, &cases, false)?;

    Ok(b.finish(true))
}

/// A country (global time series) or a US state (daily reports).
pub fn jhu_geography(ctx: &SectionContext<'_>, table: &GeoTable, name: &str) -> Result<Unit, AppError> {
    let confirmed = table.series(name, CONFIRMED)?;
    let deaths = table.series(name, DEATHS)?;

    let mut b = SectionBuilder::new(ctx, name);
    let labels = ctx.labels.clone();
    let window = b.main_window();

    let img = b.cumulative(
        "",
        name,
        ctx.config.chart,
        &[
            Metric {
                label: labels.total_cases,
                series: &confirmed,
                style: SeriesStyle::total_cases(),
            },
            Metric {
                label: labels.deaths,
                series: &deaths,
                style: SeriesStyle::deaths(),
            },
        ],
        &fit_pair((CONFIRMED, &confirmed), (DEATHS, &deaths), window, 0),
    )?;
    b.html.push_str(&img);

    daily_cases_and_deaths(&mut b, &labels, &confirmed, &deaths)?;
    b.phase("_cases_oo", labels.cases_suffix, &confirmed, false)?;
    b.phase("_deaths_oo", labels.deaths_suffix, &deaths, true)?;

    Ok(b.finish(true))
}

fn daily_cases_and_deaths(
    b: &mut SectionBuilder<'_, '_>,
    labels: &Labels,
    cases: &TimeSeries,
    deaths: &TimeSeries,
) -> Result<(), AppError> {
    b.daily(&[
        Metric {
            label: labels.new_cases,
            series: cases,
            style: SeriesStyle::total_cases(),
        },
        Metric {
            label: labels.deaths,
            series: deaths,
            style: SeriesStyle::deaths(),
        },
    ])
}

/// Geography name as a file name component.
pub fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect()
}

fn dated_counts(series: &TimeSeries) -> impl Iterator<Item = (chrono::NaiveDate, f64)> + '_ {
    series.observations.iter().map(|o| (o.date, o.count as f64))
}

fn daily_points(series: &TimeSeries) -> Vec<(f64, f64)> {
    series
        .daily_changes()
        .into_iter()
        .map(|(d, c)| (day_number(d), c as f64))
        .collect()
}

fn trajectory_points(t: &crate::domain::SmoothedTrajectory) -> Vec<(f64, f64)> {
    t.points.iter().map(|p| (p.level, p.delta)).collect()
}
