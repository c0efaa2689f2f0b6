use anyhow::Context;
use chrono::NaiveDate;
use phenocore::prelude::{ClassificationParams, PipelineConfig, SlopeConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Explicit input table; when absent the first suitable CSV in
    /// `input_dir` is used.
    pub input: Option<PathBuf>,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub slope: SlopeConfig,
    pub classification: ClassificationParams,
    pub snapshot_date: Option<NaiveDate>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            input: None,
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            slope: SlopeConfig::default(),
            classification: ClassificationParams::default(),
            snapshot_date: None,
        }
    }
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn from_args(window_days: Option<u32>, roll_window: Option<usize>) -> Self {
        let mut config = Self::default();
        config.apply_overrides(window_days, roll_window);
        config
    }

    /// Command-line window settings take precedence over the file.
    pub fn apply_overrides(&mut self, window_days: Option<u32>, roll_window: Option<usize>) {
        if let Some(days) = window_days {
            self.slope.window_days = days;
        }
        if let Some(width) = roll_window {
            self.classification.roll_window = width;
        }
    }

    pub fn to_pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            slope: self.slope.clone(),
            classification: self.classification.clone(),
        }
    }
}
