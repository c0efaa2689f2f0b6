use crate::prelude::{StageError, StageResult};
use crate::series::observation::PlotSeries;
use crate::series::record::{AnnotatedRecord, StageLabel};
use serde::{Deserialize, Serialize};

/// Robust per-day rate of change of the three indices at one observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SlopeAnnotation {
    pub ndvi: f64,
    pub savi: f64,
    pub ndwi: f64,
}

/// Greenness, water proxy and greenness velocity of one observation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub g: f64,
    pub w: f64,
    pub sg: f64,
}

/// A plot series plus the columns produced by the stages run so far.
#[derive(Debug, Clone)]
pub struct PlotFrame {
    pub series: PlotSeries,
    pub slopes: Option<Vec<SlopeAnnotation>>,
    pub features: Option<Vec<FeatureRow>>,
    pub smoothed: Option<Vec<FeatureRow>>,
    pub stages: Option<Vec<StageLabel>>,
}

impl PlotFrame {
    pub fn new(series: PlotSeries) -> Self {
        Self {
            series,
            slopes: None,
            features: None,
            smoothed: None,
            stages: None,
        }
    }

    pub fn plot_id(&self) -> i64 {
        self.series.plot_id()
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn require_slopes(&self) -> StageResult<&[SlopeAnnotation]> {
        required(self.slopes.as_deref(), self.len(), "NDVI_slope", "SlopeStage")
    }

    pub fn require_features(&self) -> StageResult<&[FeatureRow]> {
        required(self.features.as_deref(), self.len(), "G", "FeatureStage")
    }

    pub fn require_smoothed(&self) -> StageResult<&[FeatureRow]> {
        required(self.smoothed.as_deref(), self.len(), "G_sm", "SmoothingStage")
    }

    pub fn require_stages(&self) -> StageResult<&[StageLabel]> {
        required(self.stages.as_deref(), self.len(), "stage_4", "ClassifierStage")
    }

    /// Flattens a fully processed frame into output rows, in date order.
    pub fn into_records(self) -> StageResult<Vec<AnnotatedRecord>> {
        let slopes = self.require_slopes()?;
        let features = self.require_features()?;
        let smoothed = self.require_smoothed()?;
        let stages = self.require_stages()?;

        let records = self
            .series
            .observations()
            .iter()
            .zip(slopes)
            .zip(features.iter().zip(smoothed))
            .zip(stages)
            .map(|(((obs, slope), (raw, sm)), &stage)| AnnotatedRecord {
                plot_id: obs.plot_id,
                date: obs.date,
                ndvi: obs.ndvi,
                savi: obs.savi,
                ndwi: obs.ndwi,
                ndvi_slope: slope.ndvi,
                savi_slope: slope.savi,
                ndwi_slope: slope.ndwi,
                g: raw.g,
                w: raw.w,
                sg: raw.sg,
                g_sm: sm.g,
                sg_sm: sm.sg,
                w_sm: sm.w,
                stage,
                stage_code: stage.code(),
            })
            .collect();
        Ok(records)
    }
}

fn required<'a, T>(
    column: Option<&'a [T]>,
    expected: usize,
    name: &'static str,
    producer: &'static str,
) -> StageResult<&'a [T]> {
    let column = column.ok_or(StageError::MissingColumn {
        column: name,
        producer,
    })?;
    if column.len() != expected {
        return Err(StageError::Internal(format!(
            "column {} has {} rows, series has {}",
            name,
            column.len(),
            expected
        )));
    }
    Ok(column)
}
