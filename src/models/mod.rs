//! Data model for generated results
//!
//! Patients go in, rows come out; a cohort is a list of rows that can be
//! flattened into one table.

pub mod cohort;
pub mod patient;
pub mod row;
pub mod schema;

pub use cohort::Cohort;
pub use patient::PatientContext;
pub use row::SampledRow;
pub use schema::{DEMOGRAPHIC_COLUMNS, RowSchema};
