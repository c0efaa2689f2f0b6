pub mod pairwise;
pub mod rolling;
pub mod stats;

pub use pairwise::{median_pairwise_slope, window_bounds};
pub use rolling::centered_rolling_median;
pub use stats::StatsHelper;
