use std::path::PathBuf;

use lab_synth::profile::DifferentialProps;
use lab_synth::{DiseaseProfiles, GeneratorConfig, PanelOmission, PatientContext, SampledRow};

/// Profile document shipped with the crate
#[must_use]
pub fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("data")
        .join("disease_profiles.json")
}

/// Load the shipped profile document
#[must_use]
pub fn load_fixture() -> DiseaseProfiles {
    DiseaseProfiles::from_path(&fixture_path()).expect("fixture profiles should load")
}

/// Generator configuration that never omits panels
#[must_use]
pub fn no_omission(seed: u64) -> GeneratorConfig {
    GeneratorConfig::default()
        .with_omission(PanelOmission::never())
        .with_seed(seed)
}

#[must_use]
pub fn patient(sex: &str, age: u32, lifestyle: &[&str]) -> PatientContext {
    PatientContext::new(sex, age).with_lifestyle(lifestyle.iter().copied())
}

/// Sum of the five absolute differential counts of a composite panel
#[must_use]
pub fn differential_count_sum(row: &SampledRow, panel: &str) -> Option<f64> {
    DifferentialProps::LABELS
        .iter()
        .map(|label| row.get(&format!("{panel} - {label} (×10^9/L)")).flatten())
        .sum()
}

/// Ten differential columns of a composite panel
#[must_use]
pub fn differential_values(row: &SampledRow, panel: &str) -> Vec<Option<f64>> {
    DifferentialProps::LABELS
        .iter()
        .flat_map(|label| {
            [
                row.get(&format!("{panel} - {label} (%)")),
                row.get(&format!("{panel} - {label} (×10^9/L)")),
            ]
        })
        .map(|cell| cell.expect("differential column should be in the layout"))
        .collect()
}
