//! Demographic and lifestyle adjustment of test moments
//!
//! Multipliers compose in a fixed order: sex, then age, then each lifestyle
//! factor in the order the caller lists them.

use log::trace;

use crate::models::PatientContext;
use crate::profile::TestSpec;

/// Adjusted `(mean, sd)` for one test and one patient
#[must_use]
pub fn adjust(mean: f64, sd: f64, test: &TestSpec, patient: &PatientContext) -> (f64, f64) {
    let mut moments = (mean, sd);

    if let Some(multiplier) = test
        .sex_adjustment
        .as_ref()
        .and_then(|adj| adj.resolve(&patient.sex))
    {
        moments = multiplier.apply(moments);
    }

    if let Some(multiplier) = test
        .age_adjustment
        .as_ref()
        .and_then(|adj| adj.multiplier_for(patient.age))
    {
        moments = multiplier.apply(moments);
    }

    // Exceptions on a factor are not consulted here.
    for factor in &patient.lifestyle {
        if let Some(effect) = test.lifestyle.get(factor) {
            moments = effect.multiplier.apply(moments);
        }
    }

    trace!(
        "{}: ({mean}, {sd}) adjusted to ({}, {}) for {patient}",
        test.name, moments.0, moments.1
    );
    moments
}

/// Adjusted moments starting from the test's declared mean and base sd
#[must_use]
pub fn adjust_test(test: &TestSpec, patient: &PatientContext) -> (f64, f64) {
    adjust(test.mean, test.base_sd(), test, patient)
}
