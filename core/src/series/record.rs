use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Phenology stage assigned to an observation.
///
/// The numeric code only orders stages for display; a plot may move from any
/// stage to any other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StageLabel {
    Bare,
    Seedling,
    Tillering,
    Growth,
    Ripening,
}

impl StageLabel {
    pub const ALL: [StageLabel; 5] = [
        StageLabel::Bare,
        StageLabel::Seedling,
        StageLabel::Tillering,
        StageLabel::Growth,
        StageLabel::Ripening,
    ];

    pub fn code(self) -> u8 {
        match self {
            StageLabel::Bare => 0,
            StageLabel::Seedling => 1,
            StageLabel::Tillering => 2,
            StageLabel::Growth => 3,
            StageLabel::Ripening => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            StageLabel::Bare => "Bare",
            StageLabel::Seedling => "Seedling",
            StageLabel::Tillering => "Tillering",
            StageLabel::Growth => "Growth",
            StageLabel::Ripening => "Ripening",
        }
    }
}

impl fmt::Display for StageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fully annotated output row, column names as consumed by downstream tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedRecord {
    pub plot_id: i64,
    pub date: NaiveDate,
    #[serde(rename = "NDVI")]
    pub ndvi: f64,
    #[serde(rename = "SAVI")]
    pub savi: f64,
    #[serde(rename = "NDWI")]
    pub ndwi: f64,
    #[serde(rename = "NDVI_slope")]
    pub ndvi_slope: f64,
    #[serde(rename = "SAVI_slope")]
    pub savi_slope: f64,
    #[serde(rename = "NDWI_slope")]
    pub ndwi_slope: f64,
    #[serde(rename = "G")]
    pub g: f64,
    #[serde(rename = "W")]
    pub w: f64,
    #[serde(rename = "sG")]
    pub sg: f64,
    #[serde(rename = "G_sm")]
    pub g_sm: f64,
    #[serde(rename = "sG_sm")]
    pub sg_sm: f64,
    #[serde(rename = "W_sm")]
    pub w_sm: f64,
    #[serde(rename = "stage_4")]
    pub stage: StageLabel,
    #[serde(rename = "stage4_code")]
    pub stage_code: u8,
}

/// Date on which a plot entered a stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageTransition {
    pub plot_id: i64,
    #[serde(rename = "stage_4")]
    pub stage: StageLabel,
    pub date: NaiveDate,
}
