//! Parquet file operations
//!
//! Writes a cohort as a single-row-group Parquet file and reads such files
//! back into record batches.

use std::fs::File;
use std::path::Path;
use std::time::Instant;

use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use crate::error::Result;
use crate::models::Cohort;
use crate::utils::logging::{log_empty_output, log_write_complete, log_write_start};

/// Write a cohort to `path`, replacing any existing file
pub fn write_cohort(cohort: &Cohort, path: &Path) -> Result<()> {
    log_write_start("parquet", path);
    if cohort.is_empty() {
        log_empty_output(path);
    }
    let start = Instant::now();

    let batch = cohort.to_record_batch()?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let file = File::create(path)?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    log_write_complete(batch.num_rows(), path, start.elapsed());
    Ok(())
}

/// Read every record batch from a Parquet file
pub fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
    Ok(reader.collect::<std::result::Result<Vec<_>, _>>()?)
}
