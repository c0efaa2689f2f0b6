use anyhow::{bail, Context};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::{ReaderBuilder, StringRecord, Trim};
use log::{info, warn};
use phenocore::series::Observation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Columns every input file must carry.
pub const REQUIRED_COLUMNS: [&str; 5] = ["plot_id", "NDVI", "SAVI", "NDWI", "date"];

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    "%Y%m%d %H%M",
];

const DATE_FORMATS: [&str; 6] = [
    "%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%Y%m%d", "%d-%b-%Y", "%b %d, %Y",
];

/// Counts of rows removed by each cleaning step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleaningReport {
    pub rows_read: usize,
    pub empty_rows: usize,
    pub header_rows: usize,
    pub invalid_dates: usize,
    pub non_numeric: usize,
    pub non_integral_plot_ids: usize,
    pub duplicates: usize,
    pub rows_kept: usize,
}

impl CleaningReport {
    fn log(&self) {
        if self.header_rows > 0 {
            warn!("removed {} repeated header-like row(s)", self.header_rows);
        }
        if self.invalid_dates > 0 {
            warn!("dropped {} row(s) with invalid dates", self.invalid_dates);
        }
        if self.non_numeric > 0 {
            warn!(
                "dropped {} row(s) with non-numeric values in required columns",
                self.non_numeric
            );
        }
        if self.non_integral_plot_ids > 0 {
            warn!(
                "dropped {} row(s) with non-integral plot_id",
                self.non_integral_plot_ids
            );
        }
        if self.duplicates > 0 {
            warn!(
                "dropped {} duplicate (plot_id, date) row(s)",
                self.duplicates
            );
        }
        info!("rows after cleaning: {}", self.rows_kept);
    }
}

/// Positions of the required columns within a header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnIndex {
    pub plot_id: usize,
    pub ndvi: usize,
    pub savi: usize,
    pub ndwi: usize,
    pub date: usize,
}

impl ColumnIndex {
    pub fn from_headers(headers: &StringRecord) -> anyhow::Result<Self> {
        let position = |name: &str| headers.iter().position(|h| h.trim() == name);
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|name| position(name).is_none())
            .collect();
        if !missing.is_empty() {
            bail!("input is missing required columns: {}", missing.join(", "));
        }

        let index = |name: &str| position(name).unwrap_or_default();
        Ok(Self {
            plot_id: index("plot_id"),
            ndvi: index("NDVI"),
            savi: index("SAVI"),
            ndwi: index("NDWI"),
            date: index("date"),
        })
    }

    fn named(&self) -> [(&'static str, usize); 5] {
        [
            ("plot_id", self.plot_id),
            ("ndvi", self.ndvi),
            ("savi", self.savi),
            ("ndwi", self.ndwi),
            ("date", self.date),
        ]
    }
}

/// Parses the date formats seen in exported index tables; any time of day
/// is discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|stamp| stamp.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        })
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|value| value.is_finite())
}

fn is_header_like(record: &StringRecord, columns: &ColumnIndex) -> bool {
    columns.named().iter().any(|(name, idx)| {
        record
            .get(*idx)
            .is_some_and(|cell| cell.trim().eq_ignore_ascii_case(name))
    })
}

enum RowOutcome {
    Kept(Observation),
    Empty,
    Header,
    InvalidDate,
    NonNumeric,
    NonIntegralPlot,
}

fn classify_row(record: &StringRecord, columns: &ColumnIndex) -> RowOutcome {
    if record.iter().all(|cell| cell.trim().is_empty()) {
        return RowOutcome::Empty;
    }
    if is_header_like(record, columns) {
        return RowOutcome::Header;
    }
    let Some(date) = record.get(columns.date).and_then(parse_date) else {
        return RowOutcome::InvalidDate;
    };

    let values = [columns.plot_id, columns.ndvi, columns.savi, columns.ndwi]
        .map(|idx| parse_number(record.get(idx)));
    let [Some(plot_id), Some(ndvi), Some(savi), Some(ndwi)] = values else {
        return RowOutcome::NonNumeric;
    };
    if plot_id.fract() != 0.0 || plot_id.abs() >= i64::MAX as f64 {
        return RowOutcome::NonIntegralPlot;
    }

    RowOutcome::Kept(Observation::new(plot_id as i64, date, ndvi, savi, ndwi))
}

/// Input columns the core does not use, carried through to the export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtraColumns {
    headers: Vec<String>,
    cells: HashMap<(i64, NaiveDate), Vec<String>>,
}

impl ExtraColumns {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Cells of the kept row for `(plot_id, date)`, in header order.
    pub fn cells(&self, plot_id: i64, date: NaiveDate) -> Option<&[String]> {
        self.cells.get(&(plot_id, date)).map(Vec::as_slice)
    }
}

/// Cleaned observations plus the input columns they do not model.
#[derive(Debug, Clone, Default)]
pub struct CleanedInput {
    /// Sorted by plot and date with unique `(plot_id, date)` pairs.
    pub observations: Vec<Observation>,
    pub extra: ExtraColumns,
    pub report: CleaningReport,
}

/// Reads and cleans an index table.
pub fn read_observations<R: Read>(reader: R) -> anyhow::Result<CleanedInput> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().context("reading CSV header")?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;
    let (extra_positions, extra_headers): (Vec<usize>, Vec<String>) = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !REQUIRED_COLUMNS.contains(&name.trim()))
        .map(|(idx, name)| (idx, name.trim().to_string()))
        .unzip();

    let mut report = CleaningReport::default();
    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record.with_context(|| format!("reading CSV record {}", line + 1))?;
        report.rows_read += 1;
        match classify_row(&record, &columns) {
            RowOutcome::Kept(obs) => {
                let cells: Vec<String> = extra_positions
                    .iter()
                    .map(|&idx| record.get(idx).unwrap_or_default().to_string())
                    .collect();
                rows.push((obs, cells));
            }
            RowOutcome::Empty => report.empty_rows += 1,
            RowOutcome::Header => report.header_rows += 1,
            RowOutcome::InvalidDate => report.invalid_dates += 1,
            RowOutcome::NonNumeric => report.non_numeric += 1,
            RowOutcome::NonIntegralPlot => report.non_integral_plot_ids += 1,
        }
    }

    // stable: the first row of a repeated (plot_id, date) survives
    rows.sort_by_key(|(obs, _)| (obs.plot_id, obs.date));
    let before = rows.len();
    rows.dedup_by_key(|(obs, _)| (obs.plot_id, obs.date));
    report.duplicates = before - rows.len();
    report.rows_kept = rows.len();
    report.log();

    let mut extra = ExtraColumns {
        headers: extra_headers,
        cells: HashMap::with_capacity(rows.len()),
    };
    let mut observations = Vec::with_capacity(rows.len());
    for (obs, cells) in rows {
        extra.cells.insert((obs.plot_id, obs.date), cells);
        observations.push(obs);
    }

    Ok(CleanedInput {
        observations,
        extra,
        report,
    })
}

pub fn load_csv(path: &Path) -> anyhow::Result<CleanedInput> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_observations(file).with_context(|| format!("parsing {}", path.display()))
}
