pub use crate::config::{ClassificationParams, PipelineConfig, SlopeConfig};
pub use crate::series::{
    AnnotatedRecord, FeatureRow, Observation, PlotFrame, PlotSeries, SlopeAnnotation, StageLabel,
};

/// Common error type for stage execution.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    #[error("buffer exhaustion: {0}")]
    BufferExhaustion(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("missing column `{column}` (run {producer} first)")]
    MissingColumn {
        column: &'static str,
        producer: &'static str,
    },
    #[error("internal failure: {0}")]
    Internal(String),
}

pub type StageResult<T> = Result<T, StageError>;

/// Trait describing the per-plot processing stages.
///
/// A stage takes ownership of a [`PlotFrame`] and hands back the same frame
/// with its own columns filled in, so a plot is never shared between stages.
pub trait ProcessingStage {
    fn name(&self) -> &'static str;
    fn initialize(&mut self, config: &PipelineConfig) -> StageResult<()>;
    fn execute(&mut self, frame: PlotFrame) -> StageResult<PlotFrame>;
    fn cleanup(&mut self);
}
