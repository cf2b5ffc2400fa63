//! Arrow conversion for generated cohorts
//!
//! A cohort becomes one `RecordBatch` over the union of its row layouts:
//! `Sex`, `Age` and `Condition` first, then one nullable Float64 column per
//! test column. Cells a row's condition does not declare are null.

use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray, UInt32Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::models::{Cohort, RowSchema, SampledRow};

/// Arrow schema for a cohort with the given value columns
#[must_use]
pub fn arrow_schema(columns: &RowSchema) -> Schema {
    let mut fields = vec![
        Field::new("Sex", DataType::Utf8, false),
        Field::new("Age", DataType::UInt32, false),
        Field::new("Condition", DataType::Utf8, false),
    ];
    fields.extend(
        columns
            .columns()
            .iter()
            .map(|name| Field::new(name, DataType::Float64, true)),
    );
    Schema::new(fields)
}

/// Convert a cohort into a single record batch
pub fn cohort_to_record_batch(cohort: &Cohort) -> Result<RecordBatch> {
    let union = cohort.schema();
    let schema = Arc::new(arrow_schema(&union));
    let rows = cohort.rows();

    // Each distinct row layout maps union positions to its own positions once.
    let mut layouts: FxHashMap<*const RowSchema, Vec<Option<usize>>> = FxHashMap::default();
    for row in rows {
        layouts
            .entry(Arc::as_ptr(row.schema()))
            .or_insert_with(|| {
                union
                    .columns()
                    .iter()
                    .map(|c| row.schema().index_of(c))
                    .collect()
            });
    }

    let mut columns: Vec<ArrayRef> = Vec::with_capacity(union.len() + 3);
    columns.push(Arc::new(StringArray::from_iter_values(
        rows.iter().map(|r| r.sex.as_str()),
    )));
    columns.push(Arc::new(UInt32Array::from_iter_values(
        rows.iter().map(|r| r.age),
    )));
    columns.push(Arc::new(StringArray::from_iter_values(
        rows.iter().map(|r| r.condition.as_str()),
    )));

    for col in 0..union.len() {
        let values: Float64Array = rows
            .iter()
            .map(|row| cell(row, &layouts, col))
            .collect();
        columns.push(Arc::new(values));
    }

    Ok(RecordBatch::try_new(schema, columns)?)
}

fn cell(
    row: &SampledRow,
    layouts: &FxHashMap<*const RowSchema, Vec<Option<usize>>>,
    col: usize,
) -> Option<f64> {
    layouts
        .get(&Arc::as_ptr(row.schema()))
        .and_then(|layout| layout[col])
        .and_then(|idx| row.values()[idx])
}
