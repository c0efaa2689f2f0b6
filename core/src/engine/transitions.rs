use crate::series::{AnnotatedRecord, StageTransition};
use std::collections::HashSet;

fn sorted_by_plot_and_date(records: &[AnnotatedRecord]) -> Vec<&AnnotatedRecord> {
    let mut ordered: Vec<&AnnotatedRecord> = records.iter().collect();
    ordered.sort_by_key(|record| (record.plot_id, record.date));
    ordered
}

/// Dates on which each plot's label differs from its previous observation.
///
/// The first observation of every plot always starts a run.
pub fn run_starts(records: &[AnnotatedRecord]) -> Vec<StageTransition> {
    let mut starts = Vec::new();
    let mut previous: Option<&AnnotatedRecord> = None;

    for record in sorted_by_plot_and_date(records) {
        let starts_run = match previous {
            Some(prev) => prev.plot_id != record.plot_id || prev.stage != record.stage,
            None => true,
        };
        if starts_run {
            starts.push(StageTransition {
                plot_id: record.plot_id,
                stage: record.stage,
                date: record.date,
            });
        }
        previous = Some(record);
    }
    starts
}

/// Earliest date of every distinct `(plot, stage)` pair, ordered by plot then date.
///
/// A stage the plot returns to later in the season is not reported again.
pub fn first_occurrences(records: &[AnnotatedRecord]) -> Vec<StageTransition> {
    let mut seen = HashSet::new();
    sorted_by_plot_and_date(records)
        .into_iter()
        .filter(|record| seen.insert((record.plot_id, record.stage)))
        .map(|record| StageTransition {
            plot_id: record.plot_id,
            stage: record.stage,
            date: record.date,
        })
        .collect()
}
