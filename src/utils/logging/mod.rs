//! Logging helpers and progress bars

pub mod log;
pub mod progress;

pub use self::log::{log_empty_output, log_generation_complete, log_write_complete, log_write_start};
pub use progress::{cohort_progress_bar, finish_progress_bar};
