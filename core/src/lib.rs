//! Phenology core: robust slope estimation and rule-based stage
//! classification for per-plot NDVI/SAVI/NDWI time series.
//!
//! Plots are independent. Each one flows through the slope, feature,
//! smoothing and classifier stages in order; the engine runs plots in
//! parallel and never touches the filesystem.

pub mod config;
pub mod engine;
pub mod math;
pub mod prelude;
pub mod processing;
pub mod series;
pub mod telemetry;

pub use engine::{Pipeline, PipelineOutput};
pub use prelude::{PipelineConfig, ProcessingStage, StageError, StageResult};
