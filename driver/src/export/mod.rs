//! CSV writers for the annotated records, stage transitions and snapshots.
//!
//! Every file starts with its header row, even when there are no rows.

use crate::ingest::ExtraColumns;
use anyhow::Context;
use chrono::NaiveDate;
use phenocore::engine::{available_dates, snapshot_on};
use phenocore::series::{AnnotatedRecord, StageLabel, StageTransition};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const RECORDS_FILE: &str = "plot_data_with_slopes.csv";
pub const TRANSITIONS_FILE: &str = "phenology_stage4_transitions.csv";

const INPUT_COLUMNS: [&str; 5] = ["plot_id", "date", "NDVI", "SAVI", "NDWI"];
const DERIVED_COLUMNS: [&str; 11] = [
    "NDVI_slope",
    "SAVI_slope",
    "NDWI_slope",
    "G",
    "W",
    "sG",
    "G_sm",
    "sG_sm",
    "W_sm",
    "stage_4",
    "stage4_code",
];
const TRANSITION_COLUMNS: [&str; 3] = ["plot_id", "stage_4", "date"];
const SNAPSHOT_COLUMNS: [&str; 7] = [
    "plot_id",
    "date",
    "stage_4",
    "stage4_code",
    "NDVI",
    "SAVI",
    "NDWI",
];

pub fn snapshot_file(date: NaiveDate) -> String {
    format!("phenology_snapshot_{}.csv", date.format("%Y-%m-%d"))
}

#[derive(Serialize)]
struct SnapshotRow {
    plot_id: i64,
    date: NaiveDate,
    stage_4: StageLabel,
    stage4_code: u8,
    #[serde(rename = "NDVI")]
    ndvi: f64,
    #[serde(rename = "SAVI")]
    savi: f64,
    #[serde(rename = "NDWI")]
    ndwi: f64,
}

impl From<&AnnotatedRecord> for SnapshotRow {
    fn from(record: &AnnotatedRecord) -> Self {
        Self {
            plot_id: record.plot_id,
            date: record.date,
            stage_4: record.stage,
            stage4_code: record.stage_code,
            ndvi: record.ndvi,
            savi: record.savi,
            ndwi: record.ndwi,
        }
    }
}

fn write_rows<W: Write, T: Serialize>(
    writer: W,
    header: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> anyhow::Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(header)?;
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

fn input_cells(record: &AnnotatedRecord) -> [String; 5] {
    [
        record.plot_id.to_string(),
        record.date.format("%Y-%m-%d").to_string(),
        record.ndvi.to_string(),
        record.savi.to_string(),
        record.ndwi.to_string(),
    ]
}

fn derived_cells(record: &AnnotatedRecord) -> [String; 11] {
    [
        record.ndvi_slope.to_string(),
        record.savi_slope.to_string(),
        record.ndwi_slope.to_string(),
        record.g.to_string(),
        record.w.to_string(),
        record.sg.to_string(),
        record.g_sm.to_string(),
        record.sg_sm.to_string(),
        record.w_sm.to_string(),
        record.stage.to_string(),
        record.stage_code.to_string(),
    ]
}

/// Input columns, then any extra input columns, then the derived columns.
pub fn write_records<W: Write>(
    writer: W,
    records: &[AnnotatedRecord],
    extra: &ExtraColumns,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    let header = INPUT_COLUMNS
        .iter()
        .copied()
        .chain(extra.headers().iter().map(String::as_str))
        .chain(DERIVED_COLUMNS.iter().copied());
    wtr.write_record(header)?;

    let blank = vec![String::new(); extra.headers().len()];
    for record in records {
        let cells = extra
            .cells(record.plot_id, record.date)
            .filter(|cells| cells.len() == blank.len())
            .unwrap_or(blank.as_slice());
        let row = input_cells(record)
            .into_iter()
            .chain(cells.iter().cloned())
            .chain(derived_cells(record));
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_transitions<W: Write>(writer: W, transitions: &[StageTransition]) -> anyhow::Result<()> {
    write_rows(writer, &TRANSITION_COLUMNS, transitions)
}

pub fn write_snapshot<W: Write>(writer: W, rows: &[&AnnotatedRecord]) -> anyhow::Result<()> {
    write_rows(
        writer,
        &SNAPSHOT_COLUMNS,
        rows.iter().map(|&record| SnapshotRow::from(record)),
    )
}

fn create(path: &Path) -> anyhow::Result<File> {
    File::create(path).with_context(|| format!("creating {}", path.display()))
}

/// Files written by [`export_all`].
#[derive(Debug, Clone, Default)]
pub struct ExportedFiles {
    pub records: PathBuf,
    pub transitions: PathBuf,
    pub snapshot: Option<PathBuf>,
}

/// Writes records, transitions and, when a date is given, that date's snapshot.
/// A snapshot date without observations is logged and skipped.
pub fn export_all(
    dir: &Path,
    records: &[AnnotatedRecord],
    extra: &ExtraColumns,
    transitions: &[StageTransition],
    snapshot_date: Option<NaiveDate>,
) -> anyhow::Result<ExportedFiles> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;

    let records_path = dir.join(RECORDS_FILE);
    write_records(create(&records_path)?, records, extra)
        .with_context(|| format!("writing {}", records_path.display()))?;

    let transitions_path = dir.join(TRANSITIONS_FILE);
    write_transitions(create(&transitions_path)?, transitions)
        .with_context(|| format!("writing {}", transitions_path.display()))?;

    let mut snapshot = None;
    if let Some(date) = snapshot_date {
        let rows = snapshot_on(records, date);
        if rows.is_empty() {
            let dates = available_dates(records);
            match (dates.first(), dates.last()) {
                (Some(first), Some(last)) => log::warn!(
                    "no observations on {}; snapshot skipped ({} dates between {} and {})",
                    date,
                    dates.len(),
                    first,
                    last
                ),
                _ => log::warn!("no observations on {}; snapshot skipped", date),
            }
        } else {
            let path = dir.join(snapshot_file(date));
            write_snapshot(create(&path)?, &rows)
                .with_context(|| format!("writing {}", path.display()))?;
            log::info!("snapshot of {} plots on {}", rows.len(), date);
            snapshot = Some(path);
        }
    }

    Ok(ExportedFiles {
        records: records_path,
        transitions: transitions_path,
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::clean::read_observations;
    use tempfile::tempdir;

    fn record(plot_id: i64, day: u32, stage: StageLabel) -> AnnotatedRecord {
        AnnotatedRecord {
            plot_id,
            date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
            ndvi: 0.5,
            savi: 0.25,
            ndwi: 0.1,
            ndvi_slope: 0.002,
            savi_slope: 0.001,
            ndwi_slope: -0.5,
            g: 0.4,
            w: 0.1,
            sg: 0.0015,
            g_sm: 0.4,
            sg_sm: 0.0015,
            w_sm: 0.1,
            stage,
            stage_code: stage.code(),
        }
    }

    #[test]
    fn records_csv_uses_downstream_column_names() {
        let mut out = Vec::new();
        write_records(&mut out, &[record(1, 26, StageLabel::Tillering)], &ExtraColumns::default()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "plot_id,date,NDVI,SAVI,NDWI,NDVI_slope,SAVI_slope,NDWI_slope,G,W,sG,G_sm,sG_sm,W_sm,stage_4,stage4_code"
        );
        assert_eq!(
            lines.next().unwrap(),
            "1,2025-01-26,0.5,0.25,0.1,0.002,0.001,-0.5,0.4,0.1,0.0015,0.4,0.0015,0.1,Tillering,2"
        );
    }

    #[test]
    fn records_csv_keeps_extra_input_columns() {
        let input = "\
plot_id,date,NDVI,SAVI,NDWI,geometry
1,2025-01-26,0.5,0.25,0.1,POINT (3 4)
";
        let cleaned = read_observations(input.as_bytes()).unwrap();
        let mut out = Vec::new();
        write_records(
            &mut out,
            &[record(1, 26, StageLabel::Growth), record(2, 26, StageLabel::Bare)],
            &cleaned.extra,
        )
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "plot_id,date,NDVI,SAVI,NDWI,geometry,NDVI_slope,SAVI_slope,NDWI_slope,G,W,sG,G_sm,sG_sm,W_sm,stage_4,stage4_code"
        );
        assert!(lines[1].starts_with("1,2025-01-26,0.5,0.25,0.1,POINT (3 4),0.002,"));
        assert!(lines[2].starts_with("2,2025-01-26,0.5,0.25,0.1,,0.002,"));
    }

    #[test]
    fn empty_exports_still_have_headers() {
        let mut out = Vec::new();
        write_records(&mut out, &[], &ExtraColumns::default()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "plot_id,date,NDVI,SAVI,NDWI,NDVI_slope,SAVI_slope,NDWI_slope,G,W,sG,G_sm,sG_sm,W_sm,stage_4,stage4_code\n"
        );

        let mut out = Vec::new();
        write_transitions(&mut out, &[]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "plot_id,stage_4,date\n");

        let mut out = Vec::new();
        write_snapshot(&mut out, &[]).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "plot_id,date,stage_4,stage4_code,NDVI,SAVI,NDWI\n"
        );
    }

    #[test]
    fn transitions_csv_lists_plot_stage_date() {
        let mut out = Vec::new();
        let transitions = vec![StageTransition {
            plot_id: 3,
            stage: StageLabel::Growth,
            date: NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        }];
        write_transitions(&mut out, &transitions).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "plot_id,stage_4,date\n3,Growth,2025-02-01\n"
        );
    }

    #[test]
    fn export_all_writes_snapshot_only_when_date_has_data() {
        let dir = tempdir().unwrap();
        let records = vec![
            record(1, 26, StageLabel::Growth),
            record(2, 26, StageLabel::Bare),
        ];

        let files = export_all(dir.path(), &records, &ExtraColumns::default(), &[], NaiveDate::from_ymd_opt(2025, 1, 26)).unwrap();
        let snapshot = files.snapshot.unwrap();
        let text = fs::read_to_string(snapshot).unwrap();
        assert_eq!(text.lines().count(), 3);
        assert!(text.starts_with("plot_id,date,stage_4,stage4_code,NDVI,SAVI,NDWI"));

        let files = export_all(dir.path(), &records, &ExtraColumns::default(), &[], NaiveDate::from_ymd_opt(2025, 1, 2)).unwrap();
        assert!(files.snapshot.is_none());
        assert!(files.records.exists());
        assert!(files.transitions.exists());
    }
}
