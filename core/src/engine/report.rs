use crate::series::AnnotatedRecord;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Classified state of every plot observed on `date`, one record per plot,
/// ascending by plot id. Empty when nothing was observed that day.
pub fn snapshot_on(records: &[AnnotatedRecord], date: NaiveDate) -> Vec<&AnnotatedRecord> {
    let mut per_plot: BTreeMap<i64, &AnnotatedRecord> = BTreeMap::new();
    for record in records.iter().filter(|record| record.date == date) {
        per_plot.entry(record.plot_id).or_insert(record);
    }
    per_plot.into_values().collect()
}

/// Distinct observation dates, ascending.
pub fn available_dates(records: &[AnnotatedRecord]) -> Vec<NaiveDate> {
    records
        .iter()
        .map(|record| record.date)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub plots: usize,
    pub rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
}

pub fn summarize(records: &[AnnotatedRecord]) -> RunSummary {
    let plots = records
        .iter()
        .map(|record| record.plot_id)
        .collect::<HashSet<_>>()
        .len();
    RunSummary {
        plots,
        rows: records.len(),
        first_date: records.iter().map(|record| record.date).min(),
        last_date: records.iter().map(|record| record.date).max(),
    }
}
