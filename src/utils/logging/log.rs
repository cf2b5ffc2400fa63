//! Log lines shared by cohort generation and file output

use std::path::Path;
use std::time::Duration;

use log::{info, warn};

/// Announce a cohort write in the given format
pub fn log_write_start(format: &str, path: &Path) {
    info!("Writing {format} cohort to {}", path.display());
}

/// Report a finished write
///
/// # Arguments
/// * `rows` - Rows written
/// * `path` - Destination file
/// * `elapsed` - Time spent converting and writing
pub fn log_write_complete(rows: usize, path: &Path, elapsed: Duration) {
    info!("Wrote {rows} rows to {} in {elapsed:?}", path.display());
}

/// Report a finished in-memory generation step
pub fn log_generation_complete(what: &str, rows: usize, elapsed: Duration) {
    info!("Generated {what} of {rows} rows in {elapsed:?}");
}

/// Warn that an output file will hold no rows
pub fn log_empty_output(path: &Path) {
    warn!(
        "Cohort is empty, {} will only carry the demographic columns",
        path.display()
    );
}
