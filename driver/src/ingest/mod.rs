pub mod clean;
pub mod discover;

pub use clean::{load_csv, CleaningReport, ExtraColumns};
pub use discover::discover_input;
