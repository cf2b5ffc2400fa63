//! JSON output for generated rows and cohorts

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use crate::error::Result;
use crate::models::Cohort;
use crate::utils::logging::{log_write_complete, log_write_start};

/// Write a cohort as a pretty-printed JSON array of row objects
pub fn write_cohort(cohort: &Cohort, path: &Path) -> Result<()> {
    log_write_start("JSON", path);
    let start = Instant::now();

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, cohort)?;
    writer.flush()?;

    log_write_complete(cohort.len(), path, start.elapsed());
    Ok(())
}
