pub mod frame;
pub mod observation;
pub mod record;

pub use frame::{FeatureRow, PlotFrame, SlopeAnnotation};
pub use observation::{group_by_plot, IndexColumn, Observation, PlotSeries};
pub use record::{AnnotatedRecord, StageLabel, StageTransition};
