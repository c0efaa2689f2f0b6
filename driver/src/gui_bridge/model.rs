use crate::workflow::runner::WorkflowResult;
use chrono::NaiveDate;
use phenocore::engine::{snapshot_on, RunSummary};
use phenocore::series::{AnnotatedRecord, StageTransition};
use phenocore::telemetry::MetricsSnapshot;
use serde::{Deserialize, Serialize};

/// Run totals served at `/summary`.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct SummaryView {
    pub summary: RunSummary,
    pub metrics: MetricsSnapshot,
}

/// Latest published run, as served by the bridge.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisualizationModel {
    pub summary: RunSummary,
    pub metrics: MetricsSnapshot,
    pub records: Vec<AnnotatedRecord>,
    pub transitions: Vec<StageTransition>,
}

impl VisualizationModel {
    pub fn from_result(result: &WorkflowResult) -> Self {
        Self {
            summary: result.summary.clone(),
            metrics: result.output.metrics.clone(),
            records: result.output.records.clone(),
            transitions: result.output.transitions.clone(),
        }
    }

    pub fn summary_view(&self) -> SummaryView {
        SummaryView {
            summary: self.summary.clone(),
            metrics: self.metrics.clone(),
        }
    }

    pub fn plot_records(&self, plot_id: i64) -> Vec<AnnotatedRecord> {
        self.records
            .iter()
            .filter(|record| record.plot_id == plot_id)
            .cloned()
            .collect()
    }

    pub fn snapshot(&self, date: NaiveDate) -> Vec<AnnotatedRecord> {
        snapshot_on(&self.records, date).into_iter().cloned().collect()
    }
}
