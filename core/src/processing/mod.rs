pub mod buffer_pool;
pub mod classifier;
pub mod features;
pub mod slope;
pub mod smoothing;

pub use buffer_pool::BufferPool;
pub use classifier::{classify, ClassifierStage, SlopeBands, StageRule, STAGE_RULES};
pub use features::{compose, FeatureStage};
pub use slope::{column_slopes, temporal_slopes, SlopeStage};
pub use smoothing::{smooth_features, SmoothingStage};
