//! Tests for cohort generation

use lab_synth::{
    CohortBuilder, CohortConfig, LabError, PanelOmission, PatientContext, PatientSampler,
    generate_cohort,
};
use rand::RngCore;

use crate::utils::load_fixture;

/// Always the same patient, for checking the sampler seam
struct FixedPatient;

impl PatientSampler for FixedPatient {
    fn sample_patient(&self, _rng: &mut dyn RngCore) -> (String, PatientContext) {
        (
            "Iron Deficiency Anaemia".to_string(),
            PatientContext::new("female", 29).with_lifestyle(["athlete"]),
        )
    }
}

#[test]
fn test_cohort_size_and_attributes() {
    let profiles = load_fixture();
    let config = CohortConfig::new(120).with_base_seed(11);
    let cohort = generate_cohort(&profiles, config.clone()).unwrap();

    assert_eq!(cohort.len(), 120);
    for row in &cohort {
        assert!(profiles.contains(&row.condition));
        assert!(config.sexes.contains(&row.sex));
        assert!(config.age_range.contains(&row.age));
    }
}

#[test]
fn test_seeded_cohort_is_reproducible() {
    let profiles = load_fixture();
    let config = CohortConfig::new(40).with_base_seed(2024);
    let a = generate_cohort(&profiles, config.clone()).unwrap();
    let b = generate_cohort(&profiles, config).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_parallel_matches_sequential() {
    let profiles = load_fixture();
    let builder =
        CohortBuilder::new(&profiles).with_config(CohortConfig::new(64).with_base_seed(7));

    let sequential = builder.build().unwrap();
    let parallel = builder.build_parallel().unwrap();
    assert_eq!(sequential, parallel);
}

#[test]
fn test_restricted_conditions() {
    let profiles = load_fixture();
    let config = CohortConfig::new(50)
        .with_conditions(["Type 2 Diabetes"])
        .with_base_seed(3);
    let cohort = generate_cohort(&profiles, config).unwrap();
    assert!(cohort.iter().all(|r| r.condition == "Type 2 Diabetes"));
    assert_eq!(cohort.condition_counts(), vec![("Type 2 Diabetes", 50)]);
}

#[test]
fn test_unknown_condition_aborts_cohort() {
    let profiles = load_fixture();
    let config = CohortConfig::new(5).with_conditions(["Scurvy"]);
    let err = generate_cohort(&profiles, config).unwrap_err();
    assert!(matches!(err, LabError::UnknownCondition(_)));
}

#[test]
fn test_custom_sampler() {
    let profiles = load_fixture();
    let cohort = CohortBuilder::new(&profiles)
        .with_config(
            CohortConfig::new(10)
                .with_omission(PanelOmission::never())
                .with_base_seed(1),
        )
        .with_sampler(FixedPatient)
        .build()
        .unwrap();

    assert_eq!(cohort.len(), 10);
    for row in &cohort {
        assert_eq!(row.condition, "Iron Deficiency Anaemia");
        assert_eq!(row.sex, "female");
        assert_eq!(row.age, 29);
        assert_eq!(row.reported_count(), row.schema().len());
    }
}

#[test]
fn test_unseeded_cohort() {
    let profiles = load_fixture();
    let builder = CohortBuilder::new(&profiles).with_config(CohortConfig::new(15));
    assert_eq!(builder.build().unwrap().len(), 15);
    assert_eq!(builder.build_parallel().unwrap().len(), 15);
}

#[test]
fn test_empty_cohort() {
    let profiles = load_fixture();
    let cohort = generate_cohort(&profiles, CohortConfig::new(0)).unwrap();
    assert!(cohort.is_empty());
    assert!(cohort.schema().is_empty());
}

#[test]
fn test_invalid_cohort_config() {
    let profiles = load_fixture();
    let config = CohortConfig::new(5).with_sexes(Vec::<String>::new());
    assert!(matches!(
        generate_cohort(&profiles, config),
        Err(LabError::InvalidConfig(_))
    ));
}
