use crate::math::rolling::centered_rolling_median;
use crate::prelude::{
    FeatureRow, PipelineConfig, PlotFrame, ProcessingStage, StageError, StageResult,
};

/// Centered rolling median applied to each derived feature independently.
pub fn smooth_features(features: &[FeatureRow], width: usize) -> Vec<FeatureRow> {
    let column = |pick: fn(&FeatureRow) -> f64| {
        let values: Vec<f64> = features.iter().map(pick).collect();
        centered_rolling_median(&values, width)
    };
    let g = column(|row| row.g);
    let w = column(|row| row.w);
    let sg = column(|row| row.sg);

    g.into_iter()
        .zip(w)
        .zip(sg)
        .map(|((g, w), sg)| FeatureRow { g, w, sg })
        .collect()
}

/// Produces `G_sm`, `sG_sm` and `W_sm` for a date-ordered plot.
#[derive(Default)]
pub struct SmoothingStage {
    roll_window: Option<usize>,
}

impl SmoothingStage {
    pub fn new() -> Self {
        Self { roll_window: None }
    }
}

impl ProcessingStage for SmoothingStage {
    fn name(&self) -> &'static str {
        "SmoothingStage"
    }

    fn initialize(&mut self, config: &PipelineConfig) -> StageResult<()> {
        self.roll_window = Some(config.classification.roll_window);
        Ok(())
    }

    fn execute(&mut self, mut frame: PlotFrame) -> StageResult<PlotFrame> {
        let width = self
            .roll_window
            .ok_or_else(|| StageError::Internal("stage not initialized".into()))?;
        let smoothed = smooth_features(frame.require_features()?, width);
        frame.smoothed = Some(smoothed);
        Ok(frame)
    }

    fn cleanup(&mut self) {
        self.roll_window = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(g: f64, w: f64, sg: f64) -> FeatureRow {
        FeatureRow { g, w, sg }
    }

    #[test]
    fn each_feature_is_smoothed_on_its_own() {
        let rows = [
            row(0.1, 0.5, 0.01),
            row(0.9, 0.1, -0.02),
            row(0.2, 0.3, 0.00),
        ];
        let smoothed = smooth_features(&rows, 3);

        assert_eq!(smoothed[1], row(0.2, 0.3, 0.0));
        assert!((smoothed[0].g - 0.5).abs() < 1e-12);
        assert!((smoothed[2].sg + 0.01).abs() < 1e-12);
    }
}
