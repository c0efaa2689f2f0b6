use crate::series::StageLabel;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// Thread-safe counters shared by the per-plot workers of one run.
pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Point-in-time copy of the recorded counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub plots_processed: usize,
    pub plots_failed: usize,
    pub rows_classified: usize,
    /// Rows per stage, indexed by stage code.
    pub stage_counts: [usize; 5],
}

impl MetricsSnapshot {
    pub fn count_for(&self, stage: StageLabel) -> usize {
        self.stage_counts[usize::from(stage.code())]
    }
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_plot(&self, stages: &[StageLabel]) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.plots_processed += 1;
            metrics.rows_classified += stages.len();
            for stage in stages {
                metrics.stage_counts[usize::from(stage.code())] += 1;
            }
        }
    }

    pub fn record_error(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.plots_failed += 1;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        self.inner
            .lock()
            .map(|metrics| metrics.clone())
            .unwrap_or_default()
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_counts_rows_per_stage() {
        let metrics = MetricsRecorder::new();
        metrics.record_plot(&[StageLabel::Bare, StageLabel::Growth, StageLabel::Growth]);
        metrics.record_plot(&[StageLabel::Ripening]);
        metrics.record_error();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.plots_processed, 2);
        assert_eq!(snapshot.plots_failed, 1);
        assert_eq!(snapshot.rows_classified, 4);
        assert_eq!(snapshot.count_for(StageLabel::Growth), 2);
        assert_eq!(snapshot.count_for(StageLabel::Seedling), 0);
    }
}
