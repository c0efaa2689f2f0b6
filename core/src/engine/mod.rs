pub mod pipeline;
pub mod report;
pub mod transitions;

pub use pipeline::{Pipeline, PipelineOutput, StageChain};
pub use report::{available_dates, snapshot_on, summarize, RunSummary};
pub use transitions::{first_occurrences, run_starts};
