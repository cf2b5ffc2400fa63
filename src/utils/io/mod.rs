//! File output for generated cohorts

pub mod json;
pub mod parquet;
