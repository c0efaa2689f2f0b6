use crate::prelude::{StageError, StageResult};
use serde::{Deserialize, Serialize};

/// Temporal window used by the slope estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlopeConfig {
    /// Full window width in calendar days; observations within half of it
    /// on either side (inclusive) contribute to a slope.
    pub window_days: u32,
}

impl Default for SlopeConfig {
    fn default() -> Self {
        Self { window_days: 16 }
    }
}

impl SlopeConfig {
    pub fn half_window(&self) -> f64 {
        f64::from(self.window_days) / 2.0
    }
}

/// Thresholds for the rule-based stage classifier.
///
/// Defaults are percentiles of observed field measurements and must stay
/// bit-for-bit stable; every value can be overridden from a workflow file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassificationParams {
    // Greenness bands
    pub g_seed_max: f64,
    pub g_till_max: f64,
    pub g_high: f64,
    /// Lower greenness bound of a flat tillering plateau.
    pub g_plateau_min: f64,
    /// Upper greenness bound for the wet-field seedling override.
    pub g_water_max: f64,

    // Slope bands, index units per day
    pub rise_strong: f64,
    pub rise_weak: f64,
    pub flat_abs: f64,
    pub fall_weak: f64,
    pub fall_strong: f64,

    pub w_water: f64,

    /// Centered rolling-median width applied before classification.
    pub roll_window: usize,
}

impl Default for ClassificationParams {
    fn default() -> Self {
        Self {
            g_seed_max: 0.30,
            g_till_max: 0.50,
            g_high: 0.50,
            g_plateau_min: 0.35,
            g_water_max: 0.35,
            rise_strong: 0.0068,
            rise_weak: 0.0010,
            flat_abs: 0.0010,
            fall_weak: -0.0010,
            fall_strong: -0.0135,
            w_water: 0.45,
            roll_window: 3,
        }
    }
}

impl ClassificationParams {
    fn thresholds(&self) -> [(&'static str, f64); 11] {
        [
            ("g_seed_max", self.g_seed_max),
            ("g_till_max", self.g_till_max),
            ("g_high", self.g_high),
            ("g_plateau_min", self.g_plateau_min),
            ("g_water_max", self.g_water_max),
            ("rise_strong", self.rise_strong),
            ("rise_weak", self.rise_weak),
            ("flat_abs", self.flat_abs),
            ("fall_weak", self.fall_weak),
            ("fall_strong", self.fall_strong),
            ("w_water", self.w_water),
        ]
    }
}

/// Configuration shared by every stage of the per-plot pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub slope: SlopeConfig,
    pub classification: ClassificationParams,
}

impl PipelineConfig {
    pub fn validate(&self) -> StageResult<()> {
        if self.slope.window_days == 0 {
            return Err(StageError::InvalidConfig(
                "window_days must be at least 1".into(),
            ));
        }
        if self.classification.roll_window == 0 {
            return Err(StageError::InvalidConfig(
                "roll_window must be at least 1".into(),
            ));
        }
        for (name, value) in self.classification.thresholds() {
            if !value.is_finite() {
                return Err(StageError::InvalidConfig(format!(
                    "{} must be finite, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}
