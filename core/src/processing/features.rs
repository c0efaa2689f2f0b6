use crate::prelude::{
    FeatureRow, Observation, PipelineConfig, PlotFrame, ProcessingStage, SlopeAnnotation,
    StageResult,
};

/// Weight of NDVI in combined greenness; SAVI takes the remainder.
pub const NDVI_GREENNESS_WEIGHT: f64 = 0.6;
pub const SAVI_GREENNESS_WEIGHT: f64 = 0.4;

/// Combines raw indices and their slopes into greenness (`G`), water (`W`)
/// and greenness velocity (`sG`).
pub fn compose(observation: &Observation, slopes: &SlopeAnnotation) -> FeatureRow {
    FeatureRow {
        g: NDVI_GREENNESS_WEIGHT * observation.ndvi + SAVI_GREENNESS_WEIGHT * observation.savi,
        w: observation.ndwi,
        sg: 0.5 * (slopes.ndvi + slopes.savi),
    }
}

/// Stateless row-wise feature compositor.
#[derive(Default)]
pub struct FeatureStage;

impl FeatureStage {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessingStage for FeatureStage {
    fn name(&self) -> &'static str {
        "FeatureStage"
    }

    fn initialize(&mut self, _config: &PipelineConfig) -> StageResult<()> {
        Ok(())
    }

    fn execute(&mut self, mut frame: PlotFrame) -> StageResult<PlotFrame> {
        let features = frame
            .series
            .observations()
            .iter()
            .zip(frame.require_slopes()?)
            .map(|(obs, slopes)| compose(obs, slopes))
            .collect();
        frame.features = Some(features);
        Ok(frame)
    }

    fn cleanup(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::{PlotSeries, StageError};
    use chrono::NaiveDate;

    #[test]
    fn compose_weights_greenness_and_averages_slopes() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        let obs = Observation::new(3, date, 0.5, 0.25, 0.3);
        let slopes = SlopeAnnotation {
            ndvi: 0.004,
            savi: 0.002,
            ndwi: -1.0,
        };

        let row = compose(&obs, &slopes);
        assert!((row.g - 0.4).abs() < 1e-12);
        assert_eq!(row.w, 0.3);
        assert!((row.sg - 0.003).abs() < 1e-12);
    }

    #[test]
    fn stage_requires_slopes() {
        let date = NaiveDate::from_ymd_opt(2025, 2, 2).unwrap();
        let series = PlotSeries::new(3, vec![Observation::new(3, date, 0.5, 0.25, 0.3)]).unwrap();
        let mut stage = FeatureStage::new();
        stage.initialize(&PipelineConfig::default()).unwrap();
        assert!(matches!(
            stage.execute(PlotFrame::new(series)),
            Err(StageError::MissingColumn { .. })
        ));
    }
}
