//! One generated result row

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::models::patient::PatientContext;
use crate::models::schema::RowSchema;

/// Flat lab result record for one patient
///
/// Values line up with `schema().columns()`; `None` marks a test that was not
/// reported, either because its panel was omitted or because a differential
/// could not be derived.
#[derive(Debug, Clone, PartialEq)]
pub struct SampledRow {
    pub sex: String,
    pub age: u32,
    pub condition: String,
    schema: Arc<RowSchema>,
    values: Vec<Option<f64>>,
}

impl SampledRow {
    /// Row with every value column set to null
    #[must_use]
    pub fn empty(condition: &str, patient: &PatientContext, schema: Arc<RowSchema>) -> Self {
        let values = vec![None; schema.len()];
        Self {
            sex: patient.sex.clone(),
            age: patient.age,
            condition: condition.to_string(),
            schema,
            values,
        }
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<RowSchema> {
        &self.schema
    }

    /// Values in schema order
    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.values
    }

    /// Value of a column; `None` when the column is not part of this row
    #[must_use]
    pub fn get(&self, column: &str) -> Option<Option<f64>> {
        self.schema.index_of(column).map(|i| self.values[i])
    }

    pub(crate) fn set_slot(&mut self, slot: usize, value: Option<f64>) {
        self.values[slot] = value;
    }

    /// Column/value pairs in schema order
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<f64>)> {
        self.schema
            .columns()
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }

    /// Number of reported (non-null) values
    #[must_use]
    pub fn reported_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

impl Serialize for SampledRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 3))?;
        map.serialize_entry("Sex", &self.sex)?;
        map.serialize_entry("Age", &self.age)?;
        map.serialize_entry("Condition", &self.condition)?;
        for (column, value) in self.iter() {
            map.serialize_entry(column, &value)?;
        }
        map.end()
    }
}
