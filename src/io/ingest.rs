//! CSV ingest and normalization.
//!
//! This module turns the upstream dataset layouts into per-geography,
//! per-metric `TimeSeries`:
//!
//! - **daily tables** (one row per geography per day, e.g. the Italian DPC
//!   files): `load_daily_csv`
//! - **wide time series** (one row per province, one column per day, JHU
//!   global files): `load_jhu_global`
//! - **daily report directories** (one file per day, JHU US reports):
//!   `load_jhu_daily`
//!
//! Design goals:
//! - **Strict schema** for required columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad values, but report what happened)
//! - **Tolerance**: feeds contain repeated header lines, blank keys and
//!   correction rows; none of these abort a load

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::Path;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use csv::StringRecord;

use crate::domain::{Observation, TimeSeries};
use crate::error::{AppError, EXIT_INPUT, EXIT_NO_DATA};

/// Metric column names used for the JHU layouts.
pub const CONFIRMED: &str = "confirmed";
pub const DEATHS: &str = "deaths";

/// Daily report files switch layout after this date.
const US_OLD_LAYOUT_FIRST: (i32, u32, u32) = (2020, 3, 10);
const US_OLD_LAYOUT_LAST: (i32, u32, u32) = (2020, 3, 21);
/// The report whose state list defines the US geographies.
const US_STATES_REFERENCE: (i32, u32, u32) = (2020, 3, 19);

/// A row-level problem encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Metric name → series for one geography.
pub type MetricSeries = HashMap<String, TimeSeries>;

/// All series loaded from one or more files, keyed by geography.
#[derive(Debug, Clone, Default)]
pub struct GeoTable {
    pub geographies: BTreeMap<String, MetricSeries>,
    pub row_errors: Vec<RowError>,
    pub rows_read: usize,
}

impl GeoTable {
    /// Geography names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.geographies.keys().cloned().collect()
    }

    /// The series of `column` for `geo`.
    pub fn series(&self, geo: &str, column: &str) -> Result<TimeSeries, AppError> {
        let metrics = self
            .geographies
            .get(geo)
            .ok_or_else(|| AppError::new(EXIT_NO_DATA, format!("No data for geography '{geo}'.")))?;
        metrics
            .get(column)
            .cloned()
            .ok_or_else(|| AppError::new(EXIT_NO_DATA, format!("No `{column}` data for geography '{geo}'.")))
    }

    /// Add another table's metrics (same geography names are combined).
    pub fn merge(&mut self, other: GeoTable) {
        for (geo, metrics) in other.geographies {
            self.geographies.entry(geo).or_default().extend(metrics);
        }
        self.row_errors.extend(other.row_errors);
        self.rows_read += other.rows_read;
    }

    fn push(&mut self, geo: &str, column: &str, date: NaiveDate, count: i64) {
        self.geographies
            .entry(geo.to_string())
            .or_default()
            .entry(column.to_string())
            .or_default()
            .observations
            .push(Observation { date, count });
    }

    /// Sort every series by date (stable, so same-day rows keep file order).
    fn finish(&mut self) {
        for metrics in self.geographies.values_mut() {
            for series in metrics.values_mut() {
                series.observations.sort_by_key(|o| o.date);
            }
        }
    }

    fn report_row_errors(&self, source: &Path) {
        if self.row_errors.is_empty() {
            return;
        }
        log::warn!(
            "{}: {} of {} rows had skipped values",
            source.display(),
            self.row_errors.len(),
            self.rows_read
        );
        for e in &self.row_errors {
            log::debug!("{}:{}: {}", source.display(), e.line, e.message);
        }
    }
}

/// Column layout of a one-row-per-geography-per-day table.
#[derive(Debug, Clone, Copy)]
pub struct DailyLayout<'a> {
    pub date_column: &'a str,
    /// Geography column; `None` for single-geography files.
    pub key_column: Option<&'a str>,
    /// Geography name used when there is no key column.
    pub default_name: &'a str,
    /// Integer metric columns to load.
    pub columns: &'a [&'a str],
}

/// Load a daily table (DPC national/regional/provincial layout).
///
/// Rows with an unparsable date (including repeated header lines) or an
/// empty key are skipped. A bad metric value only drops that metric for
/// that day.
pub fn load_daily_csv(path: &Path, layout: &DailyLayout<'_>) -> Result<GeoTable, AppError> {
    let mut reader = open_csv(path)?;
    let headers = read_headers(&mut reader, path)?;
    let header_map = build_header_map(&headers);

    require_column(&header_map, layout.date_column, path)?;
    if let Some(key) = layout.key_column {
        require_column(&header_map, key, path)?;
    }
    for column in layout.columns {
        require_column(&header_map, column, path)?;
    }

    let mut table = GeoTable::default();

    for (idx, result) in reader.records().enumerate() {
        // Header is line 1; records start at line 2.
        let line = idx + 2;
        table.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                table.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let date = match get_field(&record, &header_map, layout.date_column).map(parse_day) {
            Some(Ok(d)) => d,
            Some(Err(message)) => {
                table.row_errors.push(RowError { line, message });
                continue;
            }
            None => {
                table.row_errors.push(RowError {
                    line,
                    message: format!("Missing `{}` value.", layout.date_column),
                });
                continue;
            }
        };

        let geo = match layout.key_column {
            Some(key) => match get_field(&record, &header_map, key) {
                Some(name) => name,
                // Rows not yet attributed to a geography.
                None => continue,
            },
            None => layout.default_name,
        };

        for column in layout.columns {
            match get_field(&record, &header_map, column).map(parse_count) {
                Some(Ok(count)) => table.push(geo, column, date, count),
                Some(Err(message)) => table.row_errors.push(RowError { line, message }),
                None => table.row_errors.push(RowError {
                    line,
                    message: format!("Missing `{column}` value."),
                }),
            }
        }
    }

    table.finish();
    table.report_row_errors(path);

    if table.geographies.is_empty() {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("No valid rows in '{}'.", path.display()),
        ));
    }

    Ok(table)
}

/// Load a JHU global time-series file into `column`, summed by country.
///
/// Layout: `Province/State, Country/Region, Lat, Long, <M/D/YY>...`. Empty
/// cells count as zero.
pub fn load_jhu_global(path: &Path, column: &str) -> Result<GeoTable, AppError> {
    let mut reader = open_csv(path)?;
    let headers = read_headers(&mut reader, path)?;
    let header_map = build_header_map(&headers);
    require_column(&header_map, "country/region", path)?;

    let date_columns: Vec<(usize, NaiveDate)> = headers
        .iter()
        .enumerate()
        .filter_map(|(idx, name)| {
            NaiveDate::parse_from_str(name.trim(), "%m/%d/%y")
                .ok()
                .map(|d| (idx, d))
        })
        .collect();
    if date_columns.is_empty() {
        return Err(AppError::new(
            EXIT_INPUT,
            format!("No date columns (M/D/YY) found in '{}'.", path.display()),
        ));
    }

    let mut totals: BTreeMap<String, Vec<i64>> = BTreeMap::new();
    let mut table = GeoTable::default();

    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        table.rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                table.row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        let Some(country) = get_field(&record, &header_map, "country/region") else {
            continue;
        };
        let sums = totals
            .entry(country.to_string())
            .or_insert_with(|| vec![0; date_columns.len()]);

        for (slot, &(col, _)) in date_columns.iter().enumerate() {
            let raw = record.get(col).map(str::trim).filter(|s| !s.is_empty());
            match raw.map(parse_count) {
                Some(Ok(v)) => match sums[slot].checked_add(v) {
                    Some(total) => sums[slot] = total,
                    None => table.row_errors.push(RowError {
                        line,
                        message: format!("Count {v} overflows the `{country}` total."),
                    }),
                },
                Some(Err(message)) => table.row_errors.push(RowError { line, message }),
                None => {}
            }
        }
    }

    let dates: Vec<NaiveDate> = date_columns.iter().map(|&(_, d)| d).collect();
    for (country, sums) in totals {
        table
            .geographies
            .entry(country)
            .or_default()
            .insert(column.to_string(), TimeSeries::from_parts(&dates, &sums));
    }

    table.finish();
    table.report_row_errors(path);

    if table.geographies.is_empty() {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("No valid rows in '{}'.", path.display()),
        ));
    }

    Ok(table)
}

/// Load US state totals from a directory of JHU daily reports.
///
/// Reads `MM-DD-YYYY.csv` from the first old-layout day up to `until`
/// (inclusive). Missing files are logged and skipped.
pub fn load_jhu_daily(dir: &Path, until: NaiveDate) -> Result<GeoTable, AppError> {
    let first = ymd(US_OLD_LAYOUT_FIRST);
    let last_old = ymd(US_OLD_LAYOUT_LAST);

    let mut table = GeoTable::default();
    let mut day = first;
    while day <= until {
        let path = daily_report_path(dir, day);
        if !path.exists() {
            log::warn!("Missing daily report '{}', skipping.", path.display());
            day += Duration::days(1);
            continue;
        }

        let layout = if day <= last_old {
            DailyReportLayout::Old
        } else {
            DailyReportLayout::New
        };
        let totals = read_daily_report(&path, layout)?;
        for (state, (confirmed, deaths)) in totals {
            table.push(&state, CONFIRMED, day, confirmed);
            table.push(&state, DEATHS, day, deaths);
        }
        table.rows_read += 1;

        day += Duration::days(1);
    }

    table.finish();

    if table.geographies.is_empty() {
        return Err(AppError::new(
            EXIT_NO_DATA,
            format!("No daily reports found in '{}'.", dir.display()),
        ));
    }

    Ok(table)
}

/// The US states reported in the reference daily report, sorted.
pub fn us_states(dir: &Path) -> Result<Vec<String>, AppError> {
    let path = daily_report_path(dir, ymd(US_STATES_REFERENCE));
    let totals = read_daily_report(&path, DailyReportLayout::Old)?;
    Ok(totals.into_keys().collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DailyReportLayout {
    /// `Province/State, Country/Region, Last Update, Confirmed, Deaths, ...`
    Old,
    /// `FIPS, Admin2, Province_State, Country_Region, ..., Confirmed, Deaths, ...`
    New,
}

/// State → (confirmed, deaths) totals for one daily report.
fn read_daily_report(path: &Path, layout: DailyReportLayout) -> Result<BTreeMap<String, (i64, i64)>, AppError> {
    let mut reader = open_csv(path)?;
    let headers = read_headers(&mut reader, path)?;
    let header_map = build_header_map(&headers);

    let (state_col, country_col) = match layout {
        DailyReportLayout::Old => ("province/state", "country/region"),
        DailyReportLayout::New => ("province_state", "country_region"),
    };
    for col in [state_col, country_col, CONFIRMED, DEATHS] {
        require_column(&header_map, col, path)?;
    }

    let mut totals: BTreeMap<String, (i64, i64)> = BTreeMap::new();
    let mut skipped = 0usize;

    for result in reader.records() {
        let Ok(record) = result else {
            skipped += 1;
            continue;
        };
        if get_field(&record, &header_map, country_col) != Some("US") {
            continue;
        }
        let Some(state) = get_field(&record, &header_map, state_col) else {
            continue;
        };
        if layout == DailyReportLayout::Old && !is_old_layout_state(state) {
            continue;
        }

        let confirmed = count_or_zero(get_field(&record, &header_map, CONFIRMED));
        let deaths = count_or_zero(get_field(&record, &header_map, DEATHS));
        match (confirmed, deaths) {
            (Ok(c), Ok(d)) => {
                let entry = totals.entry(state.to_string()).or_insert((0, 0));
                match (entry.0.checked_add(c), entry.1.checked_add(d)) {
                    (Some(tc), Some(td)) => *entry = (tc, td),
                    _ => skipped += 1,
                }
            }
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!("{}: {skipped} rows skipped", path.display());
    }

    Ok(totals)
}

/// Old-layout rows also carry counties ("King County, WA"), cruise ships and
/// a national total; keep states only.
fn is_old_layout_state(name: &str) -> bool {
    !name.contains(',') && !name.contains("Princess") && name != "US"
}

fn daily_report_path(dir: &Path, day: NaiveDate) -> std::path::PathBuf {
    dir.join(format!("{}.csv", day.format("%m-%d-%Y")))
}

fn ymd((y, m, d): (i32, u32, u32)) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

fn open_csv(path: &Path) -> Result<csv::Reader<File>, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to open CSV '{}': {e}", path.display())))?;

    Ok(csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn read_headers(reader: &mut csv::Reader<File>, path: &Path) -> Result<StringRecord, AppError> {
    reader
        .headers()
        .map(|h| h.clone())
        .map_err(|e| AppError::new(EXIT_INPUT, format!("Failed to read CSV headers of '{}': {e}", path.display())))
}

fn build_header_map(headers: &StringRecord) -> HashMap<String, usize> {
    headers
        .iter()
        .enumerate()
        .map(|(idx, name)| (normalize_header_name(name), idx))
        .collect()
}

fn normalize_header_name(name: &str) -> String {
    // Some exports prefix the first header with a UTF-8 BOM.
    let name = name.trim().trim_start_matches('\u{feff}');
    name.to_ascii_lowercase()
}

fn require_column(header_map: &HashMap<String, usize>, name: &str, path: &Path) -> Result<(), AppError> {
    if header_map.contains_key(&normalize_header_name(name)) {
        Ok(())
    } else {
        Err(AppError::new(
            EXIT_INPUT,
            format!("Missing required column `{name}` in '{}'.", path.display()),
        ))
    }
}

fn get_field<'a>(record: &'a StringRecord, header_map: &HashMap<String, usize>, name: &str) -> Option<&'a str> {
    let idx = header_map.get(&normalize_header_name(name))?;
    record.get(*idx).map(str::trim).filter(|s| !s.is_empty())
}

/// Parse a timestamp or date and floor it to the day.
fn parse_day(s: &str) -> Result<NaiveDate, String> {
    const DATETIME_FMTS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"];
    const DATE_FMTS: [&str; 4] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%m/%d/%y"];

    for fmt in DATETIME_FMTS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    for fmt in DATE_FMTS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Ok(d);
        }
    }
    Err(format!("Invalid date '{s}'."))
}

/// Parse an integer count; integral floats (`"12.0"`) are accepted.
fn parse_count(s: &str) -> Result<i64, String> {
    if let Ok(v) = s.parse::<i64>() {
        return Ok(v);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Ok(v as i64),
        _ => Err(format!("Invalid count '{s}'.")),
    }
}

fn count_or_zero(s: Option<&str>) -> Result<i64, String> {
    s.map(parse_count).unwrap_or(Ok(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    fn d(m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, m, day).unwrap()
    }

    #[test]
    fn parse_day_floors_timestamps() {
        assert_eq!(parse_day("2020-02-24T18:00:00").unwrap(), d(2, 24));
        assert_eq!(parse_day("2020-02-24 17:00:00").unwrap(), d(2, 24));
        assert_eq!(parse_day("2020-02-24").unwrap(), d(2, 24));
        assert!(parse_day("data").is_err());
    }

    #[test]
    fn parse_count_accepts_integral_floats() {
        assert_eq!(parse_count("42"), Ok(42));
        assert_eq!(parse_count("42.0"), Ok(42));
        assert!(parse_count("4.5").is_err());
        assert!(parse_count("n/a").is_err());
    }

    #[test]
    fn daily_csv_groups_by_key_and_skips_repeated_headers() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "regioni.csv",
            "\u{feff}data,denominazione_regione,totale_casi,deceduti\n\
             2020-02-24T18:00:00,Lombardia,172,6\n\
             2020-02-24T18:00:00,Veneto,33,1\n\
             data,denominazione_regione,totale_casi,deceduti\n\
             2020-02-25T18:00:00,Lombardia,240,\n\
             2020-02-25T18:00:00,Veneto,43,1\n\
             2020-02-25T18:00:00,,5,0\n",
        );
        let layout = DailyLayout {
            date_column: "data",
            key_column: Some("denominazione_regione"),
            default_name: "",
            columns: &["totale_casi", "deceduti"],
        };

        let table = load_daily_csv(&path, &layout).unwrap();
        assert_eq!(table.names(), vec!["Lombardia".to_string(), "Veneto".to_string()]);

        let cases = table.series("Lombardia", "totale_casi").unwrap();
        assert_eq!(cases.counts(), vec![172, 240]);
        assert_eq!(cases.dates(), vec![d(2, 24), d(2, 25)]);

        // The empty death count drops only that value.
        assert_eq!(table.series("Lombardia", "deceduti").unwrap().counts(), vec![6]);
        // Repeated header + empty death count.
        assert_eq!(table.row_errors.len(), 2);
        assert!(table.series("Piemonte", "totale_casi").is_err());
    }

    #[test]
    fn daily_csv_without_key_uses_default_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "nazione.csv",
            "data,totale_casi\n2020-02-25T18:00:00,322\n2020-02-24T18:00:00,229\n",
        );
        let layout = DailyLayout {
            date_column: "data",
            key_column: None,
            default_name: "Italia",
            columns: &["totale_casi"],
        };
        let table = load_daily_csv(&path, &layout).unwrap();
        // Sorted by date.
        assert_eq!(table.series("Italia", "totale_casi").unwrap().counts(), vec![229, 322]);
    }

    #[test]
    fn daily_csv_requires_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "x.csv", "data,totale_casi\n2020-02-24,1\n");
        let layout = DailyLayout {
            date_column: "data",
            key_column: None,
            default_name: "Italia",
            columns: &["deceduti"],
        };
        let err = load_daily_csv(&path, &layout).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_INPUT);
    }

    #[test]
    fn jhu_global_sums_provinces_by_country() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "confirmed.csv",
            "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20,1/24/20\n\
             ,Italy,41.0,12.0,0,2,3\n\
             Hubei,China,30.9,112.2,444,444,549\n\
             Beijing,China,40.1,116.4,14,22,\n",
        );

        let mut table = load_jhu_global(&path, CONFIRMED).unwrap();
        let china = table.series("China", CONFIRMED).unwrap();
        assert_eq!(china.counts(), vec![458, 466, 549]);
        assert_eq!(china.dates()[0], d(1, 22));

        let deaths = write_file(
            dir.path(),
            "deaths.csv",
            "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20,1/24/20\n,Italy,41.0,12.0,0,0,1\n",
        );
        table.merge(load_jhu_global(&deaths, DEATHS).unwrap());
        assert_eq!(table.series("Italy", DEATHS).unwrap().counts(), vec![0, 0, 1]);
        assert_eq!(table.series("Italy", CONFIRMED).unwrap().counts(), vec![0, 2, 3]);
    }

    #[test]
    fn jhu_daily_reads_both_layouts() {
        let dir = tempfile::tempdir().unwrap();
        let old = "Province/State,Country/Region,Last Update,Confirmed,Deaths,Recovered\n\
                   Washington,US,2020-03-19T23:00:00,1376,74,0\n\
                   \"King County, WA\",US,2020-03-19T23:00:00,5,1,0\n\
                   Diamond Princess,US,2020-03-19T23:00:00,49,0,0\n\
                   Hubei,China,2020-03-19T23:00:00,67800,3130,0\n";
        write_file(dir.path(), "03-19-2020.csv", old);
        write_file(dir.path(), "03-20-2020.csv", &old.replace("1376", "1524"));
        write_file(
            dir.path(),
            "03-22-2020.csv",
            "FIPS,Admin2,Province_State,Country_Region,Last_Update,Lat,Long_,Confirmed,Deaths\n\
             53033,King,Washington,US,2020-03-22 23:45:00,0,0,1170,87\n\
             53061,Snohomish,Washington,US,2020-03-22 23:45:00,0,0,614,10\n",
        );

        assert_eq!(us_states(dir.path()).unwrap(), vec!["Washington".to_string()]);

        let table = load_jhu_daily(dir.path(), d(3, 22)).unwrap();
        let wa = table.series("Washington", CONFIRMED).unwrap();
        assert_eq!(wa.dates(), vec![d(3, 19), d(3, 20), d(3, 22)]);
        assert_eq!(wa.counts(), vec![1376, 1524, 1784]);
        assert_eq!(table.series("Washington", DEATHS).unwrap().counts(), vec![74, 74, 97]);
        assert!(table.series("Diamond Princess", CONFIRMED).is_err());
    }

    #[test]
    fn jhu_global_overflowing_sum_is_a_row_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "confirmed.csv",
            "Province/State,Country/Region,Lat,Long,1/22/20,1/23/20\n\
             Hubei,China,30.9,112.2,9223372036854775807,5\n\
             Beijing,China,40.1,116.4,1,7\n",
        );

        let table = load_jhu_global(&path, CONFIRMED).unwrap();
        assert_eq!(table.row_errors.len(), 1);
        assert_eq!(table.row_errors[0].line, 3);
        assert_eq!(table.series("China", CONFIRMED).unwrap().counts(), vec![i64::MAX, 12]);
    }

    #[test]
    fn daily_report_overflowing_state_total_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "03-22-2020.csv",
            "FIPS,Admin2,Province_State,Country_Region,Last_Update,Lat,Long_,Confirmed,Deaths\n\
             53033,King,Washington,US,2020-03-22 23:45:00,0,0,9223372036854775807,87\n\
             53061,Snohomish,Washington,US,2020-03-22 23:45:00,0,0,614,10\n\
             6037,Los Angeles,California,US,2020-03-22 23:45:00,0,0,407,7\n",
        );

        let totals = read_daily_report(&path, DailyReportLayout::New).unwrap();
        assert_eq!(totals["Washington"], (i64::MAX, 87));
        assert_eq!(totals["California"], (407, 7));
    }
}
