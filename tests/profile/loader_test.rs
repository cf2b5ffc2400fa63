//! Tests for loading and validating profile documents

use std::io::Cursor;

use lab_synth::profile::{AgeAdjustment, Multiplier};
use lab_synth::{DiseaseProfiles, Distribution, LabError};

use crate::utils::load_fixture;

#[test]
fn test_fixture_loads_in_document_order() {
    let profiles = load_fixture();
    let names: Vec<_> = profiles.condition_names().collect();
    assert_eq!(
        names,
        vec![
            "Hypothyroidism",
            "Alcoholic Liver Disease",
            "Iron Deficiency Anaemia",
            "Type 2 Diabetes"
        ]
    );

    let hypo = profiles.get("Hypothyroidism").unwrap();
    let panels: Vec<_> = hypo.panels().iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        panels,
        vec!["Thyroid Function", "Full Blood Count", "Lipid Profile"]
    );
    assert_eq!(hypo.composite_panel(), Some(1));
    assert!(hypo.panels()[1].differential_props.is_some());
}

#[test]
fn test_fixture_layout() {
    let profiles = load_fixture();
    let hypo = profiles.get("Hypothyroidism").unwrap();
    let columns = hypo.schema().columns();

    // 2 thyroid tests, 4 FBC tests, 10 differential columns, 2 lipid tests
    assert_eq!(columns.len(), 18);
    assert_eq!(columns[0], "Thyroid Function - TSH (mU/L)");
    assert_eq!(columns[5], "Full Blood Count - MCV (fL)");
    assert_eq!(columns[6], "Full Blood Count - Neutrophils (%)");
    assert_eq!(columns[15], "Full Blood Count - Basophils (×10^9/L)");
    assert_eq!(columns[16], "Lipid Profile - Total Cholesterol (mmol/L)");

    let t2d = profiles.get("Type 2 Diabetes").unwrap();
    assert_eq!(t2d.composite_panel(), None);
    assert!(t2d.differential_slots().is_none());
}

#[test]
fn test_fixture_aliases_and_defaults() {
    let profiles = load_fixture();
    let ida = profiles.get("Iron Deficiency Anaemia").unwrap();

    let hb = &ida.panels()[0].tests[0];
    assert_eq!(hb.distribution, Distribution::Normal);
    assert_eq!((hb.min, hb.max), (Some(55.0), Some(130.0)));

    let ferritin = &ida.panels()[1].tests[0];
    assert_eq!(ferritin.distribution, Distribution::Uniform);

    let hypo = profiles.get("Hypothyroidism").unwrap();
    let mcv = &hypo.panels()[1].tests[3];
    assert_eq!(mcv.sd, None);
    assert!((mcv.base_sd() - 9.3).abs() < 1e-9);

    let ald = profiles.get("Alcoholic Liver Disease").unwrap();
    let creatinine = &ald.panels()[1].tests[1];
    assert_eq!(
        creatinine.age_adjustment,
        Some(AgeAdjustment::Slope {
            slope: 0.006,
            ref_age: 40.0
        })
    );
}

#[test]
fn test_sex_adjustment_shorthand_and_object_forms() {
    let profiles = load_fixture();
    let hb = &profiles.get("Hypothyroidism").unwrap().panels()[1].tests[0];
    let sex = hb.sex_adjustment.as_ref().unwrap();
    assert_eq!(sex.resolve("male"), Some(Multiplier::new(1.1, 1.05)));
    assert_eq!(sex.resolve("Female"), Some(Multiplier::new(0.97, 1.0)));
    assert_eq!(sex.resolve("non-binary"), Some(Multiplier::new(1.0, 1.0)));
}

#[test]
fn test_from_reader_matches_from_str() {
    let doc = r#"{"Gout": {"panels": {"Renal": {"Urate": {"mean": 420, "sd": 60}}}}}"#;
    let a = DiseaseProfiles::from_json_str(doc).unwrap();
    let b = DiseaseProfiles::from_reader(Cursor::new(doc)).unwrap();
    assert_eq!(
        a.get("Gout").unwrap().panels(),
        b.get("Gout").unwrap().panels()
    );
}

#[test]
fn test_invalid_bounds_rejected_with_location() {
    let doc = r#"{"Gout": {"panels": {"Renal": {"Urate": {"mean": 420, "min": 500, "max": 100}}}}}"#;
    let err = DiseaseProfiles::from_json_str(doc).unwrap_err();
    assert!(matches!(
        err.root_cause(),
        LabError::InvalidBounds { min, max } if *min == 500.0 && *max == 100.0
    ));
    assert_eq!(err.location(), Some("Gout > panels > Renal > Urate"));
}

#[test]
fn test_unknown_distribution_location() {
    let doc = r#"{"Gout": {"panels": {"Renal": {"Urate": {"mean": 420, "distribution": "weibull"}}}}}"#;
    let err = DiseaseProfiles::from_json_str(doc).unwrap_err();
    assert_eq!(
        err.location(),
        Some("Gout > panels > Renal > Urate > distribution")
    );
    assert!(err.to_string().contains("weibull"));
}

#[test]
fn test_malformed_band_location() {
    let doc = r#"{"Gout": {"panels": {"Renal": {"Urate": {
        "mean": 420,
        "age_adjustment": [{"min_age": 0, "max_age": 40}, {"min_age": 41}]
    }}}}}"#;
    let err = DiseaseProfiles::from_json_str(doc).unwrap_err();
    assert_eq!(
        err.location(),
        Some("Gout > panels > Renal > Urate > age_adjustment > band 1")
    );
}

#[test]
fn test_negative_sd_rejected_with_location() {
    let err =
        DiseaseProfiles::from_json_str(r#"{"X":{"panels":{"P":{"T":{"mean":5,"sd":-1}}}}}"#)
            .unwrap_err();
    assert_eq!(err.location(), Some("X > panels > P > T > sd"));
    assert!(matches!(err.root_cause(), LabError::MalformedProfile(_)));
}

#[test]
fn test_differential_columns_at_declared_position() {
    let profiles = DiseaseProfiles::from_json_str(
        r#"{"Anaemia": {"panels": {"FBC": {
            "Hb (g/L)": {"mean": 120, "sd": 10},
            "differential_props": {"neutrophils": 0.6},
            "WBC": {"mean": 7, "sd": 1.5}
        }}}}"#,
    )
    .unwrap();
    let columns = profiles.get("Anaemia").unwrap().schema().columns();

    assert_eq!(columns.len(), 12);
    assert_eq!(columns[0], "FBC - Hb (g/L)");
    assert_eq!(columns[1], "FBC - Neutrophils (%)");
    assert_eq!(columns[10], "FBC - Basophils (×10^9/L)");
    assert_eq!(columns[11], "FBC - WBC");
}

#[test]
fn test_missing_panels_and_bad_json() {
    let err = DiseaseProfiles::from_json_str(r#"{"Gout": {}}"#).unwrap_err();
    assert_eq!(err.location(), Some("Gout"));

    let err = DiseaseProfiles::from_json_str("{not json").unwrap_err();
    assert!(matches!(err, LabError::Json(_)));

    let err = DiseaseProfiles::from_json_str("[]").unwrap_err();
    assert!(matches!(err.root_cause(), LabError::MalformedProfile(_)));
}

#[test]
fn test_missing_file() {
    let err = DiseaseProfiles::from_path(std::path::Path::new("does/not/exist.json")).unwrap_err();
    assert!(matches!(err, LabError::Io(_)));
}
