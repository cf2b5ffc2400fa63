//! Tests for Arrow, Parquet and JSON output of cohorts

use arrow::array::{Array, Float64Array, StringArray, UInt32Array};
use arrow::datatypes::DataType;
use lab_synth::utils::io::parquet::read_batches;
use lab_synth::{CohortConfig, generate_cohort};
use tempfile::TempDir;

use crate::utils::load_fixture;

#[test]
fn test_record_batch_union_schema() {
    let profiles = load_fixture();
    let cohort = generate_cohort(&profiles, CohortConfig::new(60).with_base_seed(9)).unwrap();
    let batch = cohort.to_record_batch().unwrap();

    assert_eq!(batch.num_rows(), 60);
    let schema = batch.schema();
    assert_eq!(schema.field(0).name(), "Sex");
    assert_eq!(schema.field(1).data_type(), &DataType::UInt32);
    assert_eq!(schema.field(2).name(), "Condition");
    assert_eq!(batch.num_columns(), cohort.schema().len() + 3);

    let ages = batch
        .column(1)
        .as_any()
        .downcast_ref::<UInt32Array>()
        .unwrap();
    let conditions = batch
        .column(2)
        .as_any()
        .downcast_ref::<StringArray>()
        .unwrap();
    for (i, row) in cohort.iter().enumerate() {
        assert_eq!(ages.value(i), row.age);
        assert_eq!(conditions.value(i), row.condition);
    }

    // Columns of other conditions are null for every row
    let tsh_idx = schema.index_of("Thyroid Function - TSH (mU/L)").unwrap();
    let tsh = batch
        .column(tsh_idx)
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap();
    for (i, row) in cohort.iter().enumerate() {
        let expected = row.get("Thyroid Function - TSH (mU/L)").flatten();
        if row.condition != "Hypothyroidism" {
            assert!(tsh.is_null(i));
        }
        assert_eq!(tsh.is_valid(i).then(|| tsh.value(i)), expected);
    }
}

#[test]
fn test_parquet_round_trip() {
    let profiles = load_fixture();
    let cohort = generate_cohort(&profiles, CohortConfig::new(25).with_base_seed(4)).unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cohort.parquet");

    cohort.write_parquet(&path).unwrap();
    let batches = read_batches(&path).unwrap();

    let rows: usize = batches.iter().map(|b| b.num_rows()).sum();
    assert_eq!(rows, 25);
    let expected = cohort.to_record_batch().unwrap();
    assert_eq!(batches[0].schema().fields().len(), expected.num_columns());
    assert_eq!(batches[0].column(2).as_ref(), expected.column(2).as_ref());
}

#[test]
fn test_json_output() {
    let profiles = load_fixture();
    let config = CohortConfig::new(5)
        .with_conditions(["Hypothyroidism"])
        .with_base_seed(12);
    let cohort = generate_cohort(&profiles, config).unwrap();
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("cohort.json");

    cohort.write_json(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    let rows = value.as_array().unwrap();
    assert_eq!(rows.len(), 5);

    let first = rows[0].as_object().unwrap();
    let keys: Vec<_> = first.keys().take(4).map(String::as_str).collect();
    assert_eq!(
        keys,
        vec!["Sex", "Age", "Condition", "Thyroid Function - TSH (mU/L)"]
    );
    assert_eq!(first.len(), 3 + 18);
    assert_eq!(first["Condition"], "Hypothyroidism");
}
