//! Panel assembly
//!
//! Generates one patient's full result row for a condition: decides which
//! panels are omitted, samples every remaining test once per call (tests that
//! recur across panels share the first sampled value), and derives the white
//! cell differential on the full blood count panel.

pub mod differential;

use std::sync::Arc;

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, index};
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::algorithm::{adjustment, sampling};
use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::models::{PatientContext, SampledRow};
use crate::profile::{ConditionProfile, DiseaseProfiles};

/// Values sampled so far within one generation call, keyed by test name
#[derive(Debug, Default)]
pub struct SharedValueCache {
    values: FxHashMap<String, f64>,
}

impl SharedValueCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, test: &str) -> Option<f64> {
        self.values.get(test).copied()
    }

    /// Cached value for `test`, sampling and storing it on first use
    pub fn get_or_try_insert_with<F>(&mut self, test: &str, sample: F) -> Result<f64>
    where
        F: FnOnce() -> Result<f64>,
    {
        if let Some(value) = self.get(test) {
            trace!("Reusing shared value {value} for {test}");
            return Ok(value);
        }
        let value = sample()?;
        self.values.insert(test.to_string(), value);
        Ok(value)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Generates result rows from a loaded set of profiles
#[derive(Debug, Clone)]
pub struct LabGenerator<'a> {
    profiles: &'a DiseaseProfiles,
    config: GeneratorConfig,
}

impl<'a> LabGenerator<'a> {
    pub fn new(profiles: &'a DiseaseProfiles, config: GeneratorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { profiles, config })
    }

    #[must_use]
    pub fn profiles(&self) -> &'a DiseaseProfiles {
        self.profiles
    }

    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate a row on a stream seeded from the configured seed, or the OS
    pub fn generate(&self, condition: &str, patient: &PatientContext) -> Result<SampledRow> {
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        self.generate_with_rng(condition, patient, &mut rng)
    }

    /// Generate a row drawing every random decision from `rng`
    pub fn generate_with_rng<R: Rng + ?Sized>(
        &self,
        condition: &str,
        patient: &PatientContext,
        rng: &mut R,
    ) -> Result<SampledRow> {
        let profile = self.profiles.get(condition)?;
        let omitted = self.omitted_panels(profile.panels().len(), rng);
        if !omitted.is_empty() {
            debug!(
                "Omitting panels {:?} for {} ({patient})",
                omitted
                    .iter()
                    .map(|&i| profile.panels()[i].name.as_str())
                    .collect::<Vec<_>>(),
                profile.name()
            );
        }

        let mut row = SampledRow::empty(profile.name(), patient, Arc::clone(profile.schema()));
        let mut cache = SharedValueCache::new();

        for (panel_idx, panel) in profile.panels().iter().enumerate() {
            if omitted.contains(&panel_idx) {
                continue;
            }
            for (test_idx, test) in panel.tests.iter().enumerate() {
                let value = cache.get_or_try_insert_with(&test.name, || {
                    let (mean, sd) = adjustment::adjust_test(test, patient);
                    sampling::sample(test.distribution, mean, sd, test.min, test.max, rng)
                })?;
                row.set_slot(profile.test_slot(panel_idx, test_idx), Some(value));
            }
        }

        Self::fill_differential(profile, &omitted, &mut row, rng)?;
        Ok(row)
    }

    /// Indices of the panels dropped for one patient
    pub fn omitted_panels<R: Rng + ?Sized>(
        &self,
        panel_count: usize,
        rng: &mut R,
    ) -> SmallVec<[usize; 2]> {
        let omission = &self.config.omission;
        if panel_count == 0 || !rng.random_bool(omission.probability) {
            return SmallVec::new();
        }
        let count = omission
            .counts
            .choose(rng)
            .copied()
            .unwrap_or(1)
            .min(panel_count);
        index::sample(rng, panel_count, count).into_iter().collect()
    }

    fn fill_differential<R: Rng + ?Sized>(
        profile: &ConditionProfile,
        omitted: &[usize],
        row: &mut SampledRow,
        rng: &mut R,
    ) -> Result<()> {
        let (Some(panel_idx), Some(slots)) =
            (profile.composite_panel(), profile.differential_slots())
        else {
            return Ok(());
        };
        if omitted.contains(&panel_idx) {
            return Ok(());
        }

        let panel = &profile.panels()[panel_idx];
        let total = panel
            .total_count_test()
            .and_then(|test_idx| row.values()[profile.test_slot(panel_idx, test_idx)]);

        if let Some(diff) =
            differential::reconcile(total, panel.differential_props.as_ref(), rng)?
        {
            for i in 0..5 {
                row.set_slot(slots.percentages[i], Some(diff.percentages[i]));
                row.set_slot(slots.counts[i], Some(diff.counts[i]));
            }
        }
        Ok(())
    }
}

/// Generate one row with a fresh generator
pub fn generate_lab_results(
    profiles: &DiseaseProfiles,
    condition: &str,
    patient: &PatientContext,
    config: GeneratorConfig,
) -> Result<SampledRow> {
    LabGenerator::new(profiles, config)?.generate(condition, patient)
}
