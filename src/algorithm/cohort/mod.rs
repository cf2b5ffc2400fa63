//! Cohort generation
//!
//! Repeats single-patient generation over many patients drawn from a
//! `PatientSampler`. With a base seed, row `i` runs on its own stream seeded
//! with `base_seed + i`, which makes every row reproducible on its own and
//! lets the parallel builder produce exactly the sequential output.

use std::ops::RangeInclusive;
use std::time::Instant;

use indicatif::{ParallelProgressIterator, ProgressBar};
use log::info;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, RngCore, SeedableRng};
use rayon::prelude::*;

use crate::algorithm::panel::LabGenerator;
use crate::config::{CohortConfig, GeneratorConfig};
use crate::error::{LabError, Result};
use crate::models::{Cohort, PatientContext, SampledRow};
use crate::profile::DiseaseProfiles;
use crate::utils::logging::{cohort_progress_bar, finish_progress_bar, log_generation_complete};

/// Source of condition and patient attributes for cohort rows
pub trait PatientSampler: Send + Sync {
    /// Draw a condition name and the patient to generate it for
    fn sample_patient(&self, rng: &mut dyn RngCore) -> (String, PatientContext);
}

/// Uniform choice over fixed lists, with a uniform integer age
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceSampler {
    pub conditions: Vec<String>,
    pub sexes: Vec<String>,
    pub age_range: RangeInclusive<u32>,
    pub lifestyles: Vec<Vec<String>>,
}

impl ChoiceSampler {
    /// Sampler over the lists in `config`; no listed conditions means all profiled ones
    pub fn from_config(config: &CohortConfig, profiles: &DiseaseProfiles) -> Result<Self> {
        let conditions: Vec<String> = if config.conditions.is_empty() {
            profiles.condition_names().map(str::to_string).collect()
        } else {
            config.conditions.clone()
        };
        if conditions.is_empty() {
            return Err(LabError::InvalidConfig("no conditions to sample from".into()));
        }
        Ok(Self {
            conditions,
            sexes: config.sexes.clone(),
            age_range: config.age_range.clone(),
            lifestyles: config.lifestyles.clone(),
        })
    }
}

impl PatientSampler for ChoiceSampler {
    fn sample_patient(&self, rng: &mut dyn RngCore) -> (String, PatientContext) {
        let condition = self.conditions.choose(rng).cloned().unwrap_or_default();
        let sex = self.sexes.choose(rng).cloned().unwrap_or_default();
        let age = rng.random_range(self.age_range.clone());
        let lifestyle = self.lifestyles.choose(rng).cloned().unwrap_or_default();
        (
            condition,
            PatientContext::new(sex, age).with_lifestyle(lifestyle),
        )
    }
}

/// Builder for a cohort of generated rows
pub struct CohortBuilder<'a> {
    profiles: &'a DiseaseProfiles,
    config: CohortConfig,
    sampler: Option<Box<dyn PatientSampler + 'a>>,
}

impl<'a> CohortBuilder<'a> {
    #[must_use]
    pub fn new(profiles: &'a DiseaseProfiles) -> Self {
        Self {
            profiles,
            config: CohortConfig::default(),
            sampler: None,
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: CohortConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the list-based sampler built from the configuration
    #[must_use]
    pub fn with_sampler<S: PatientSampler + 'a>(mut self, sampler: S) -> Self {
        self.sampler = Some(Box::new(sampler));
        self
    }

    #[must_use]
    pub fn config(&self) -> &CohortConfig {
        &self.config
    }

    /// Generate rows one after another
    ///
    /// Without a base seed all rows share one OS-seeded stream. The first
    /// failing row aborts the whole cohort.
    pub fn build(&self) -> Result<Cohort> {
        self.run(|generator, sampler| {
            let size = self.config.size;
            info!("Generating cohort of {size} patients");
            let start = Instant::now();
            let pb = self.progress_bar();

            let mut shared: Option<StdRng> = None;
            let mut cohort = Cohort::with_capacity(size);
            for i in 0..size {
                let row = match self.config.base_seed {
                    Some(base) => generate_row(generator, sampler, &mut row_rng(base, i))?,
                    None => {
                        let rng = shared.get_or_insert_with(StdRng::from_os_rng);
                        generate_row(generator, sampler, rng)?
                    }
                };
                cohort.push(row);
                if let Some(pb) = &pb {
                    pb.inc(1);
                }
            }

            if let Some(pb) = &pb {
                finish_progress_bar(pb, "Cohort complete");
            }
            log_generation_complete("cohort", cohort.len(), start.elapsed());
            Ok(cohort)
        })
    }

    /// Generate rows on the rayon pool
    ///
    /// Rows are seeded from the base seed, or from one seed drawn from the OS
    /// when none is configured, and come back in index order.
    pub fn build_parallel(&self) -> Result<Cohort> {
        self.run(|generator, sampler| {
            let size = self.config.size;
            let base = self
                .config
                .base_seed
                .unwrap_or_else(|| StdRng::from_os_rng().random());
            info!(
                "Generating cohort of {size} patients on {} threads",
                rayon::current_num_threads()
            );
            let start = Instant::now();

            let generate = |i: usize| generate_row(generator, sampler, &mut row_rng(base, i));
            let rows = match self.progress_bar() {
                Some(pb) => {
                    let rows = (0..size)
                        .into_par_iter()
                        .progress_with(pb.clone())
                        .map(generate)
                        .collect::<Result<Vec<SampledRow>>>();
                    finish_progress_bar(&pb, "Cohort complete");
                    rows
                }
                None => (0..size)
                    .into_par_iter()
                    .map(generate)
                    .collect::<Result<Vec<SampledRow>>>(),
            }?;

            log_generation_complete("cohort", rows.len(), start.elapsed());
            Ok(rows.into_iter().collect())
        })
    }

    /// Validate, then hand the generator and the active sampler to `f`
    fn run<T>(
        &self,
        f: impl FnOnce(&LabGenerator<'a>, &dyn PatientSampler) -> Result<T>,
    ) -> Result<T> {
        self.config.validate()?;
        let generator = LabGenerator::new(
            self.profiles,
            GeneratorConfig {
                omission: self.config.omission.clone(),
                seed: None,
            },
        )?;
        match &self.sampler {
            Some(sampler) => f(&generator, sampler.as_ref()),
            None => f(
                &generator,
                &ChoiceSampler::from_config(&self.config, self.profiles)?,
            ),
        }
    }

    fn progress_bar(&self) -> Option<ProgressBar> {
        self.config
            .show_progress
            .then(|| cohort_progress_bar(self.config.size as u64, "Generating cohort"))
    }
}

/// Stream for row `index` of a seeded cohort
#[must_use]
pub fn row_rng(base_seed: u64, index: usize) -> StdRng {
    StdRng::seed_from_u64(base_seed.wrapping_add(index as u64))
}

fn generate_row(
    generator: &LabGenerator<'_>,
    sampler: &dyn PatientSampler,
    rng: &mut StdRng,
) -> Result<SampledRow> {
    let (condition, patient) = sampler.sample_patient(rng);
    generator.generate_with_rng(&condition, &patient, rng)
}

/// Generate `config.size` rows sequentially with the list-based sampler
pub fn generate_cohort(profiles: &DiseaseProfiles, config: CohortConfig) -> Result<Cohort> {
    CohortBuilder::new(profiles).with_config(config).build()
}
