//! Ordered collection of generated rows

use std::path::Path;
use std::sync::Arc;

use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use serde::Serialize;

use crate::error::Result;
use crate::models::row::SampledRow;
use crate::models::schema::RowSchema;
use crate::utils::{arrow as arrow_utils, io};

/// Rows in generation order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cohort {
    rows: Vec<SampledRow>,
}

impl Cohort {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            rows: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, row: SampledRow) {
        self.rows.push(row);
    }

    #[must_use]
    pub fn rows(&self) -> &[SampledRow] {
        &self.rows
    }

    #[must_use]
    pub fn into_rows(self) -> Vec<SampledRow> {
        self.rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SampledRow> {
        self.rows.iter()
    }

    /// Union of the row layouts, in first-seen order
    ///
    /// Rows of one condition share a layout, so this is the concatenation
    /// of each distinct condition's columns.
    #[must_use]
    pub fn schema(&self) -> RowSchema {
        let distinct = self
            .rows
            .iter()
            .map(SampledRow::schema)
            .unique_by(|s| Arc::as_ptr(*s));
        RowSchema::union(distinct.map(|s| &**s))
    }

    /// Rows per condition, in first-seen order
    #[must_use]
    pub fn condition_counts(&self) -> Vec<(&str, usize)> {
        let counts = self.rows.iter().map(|r| r.condition.as_str()).counts();
        self.rows
            .iter()
            .map(|r| r.condition.as_str())
            .unique()
            .map(|c| (c, counts[c]))
            .collect()
    }

    /// Arrow batch over the union schema
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        arrow_utils::cohort_to_record_batch(self)
    }

    pub fn write_parquet(&self, path: &Path) -> Result<()> {
        io::parquet::write_cohort(self, path)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        io::json::write_cohort(self, path)
    }
}

impl FromIterator<SampledRow> for Cohort {
    fn from_iter<I: IntoIterator<Item = SampledRow>>(iter: I) -> Self {
        Self {
            rows: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Cohort {
    type Item = &'a SampledRow;
    type IntoIter = std::slice::Iter<'a, SampledRow>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
