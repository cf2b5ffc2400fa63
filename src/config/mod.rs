//! Configuration for lab result generation.

use std::fmt;
use std::ops::RangeInclusive;

use smallvec::{SmallVec, smallvec};

use crate::error::{LabError, Result};

/// How panels are randomly dropped from a generated row
#[derive(Debug, Clone, PartialEq)]
pub struct PanelOmission {
    /// Chance that any panels are omitted for a patient
    pub probability: f64,
    /// Candidate numbers of panels to omit, picked uniformly when omission fires
    pub counts: SmallVec<[usize; 2]>,
}

impl PanelOmission {
    /// Omission that never fires
    #[must_use]
    pub fn never() -> Self {
        Self {
            probability: 0.0,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }

    #[must_use]
    pub fn with_counts(mut self, counts: &[usize]) -> Self {
        self.counts = SmallVec::from_slice(counts);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.probability) {
            return Err(LabError::InvalidConfig(format!(
                "missing panel probability {} is outside [0, 1]",
                self.probability
            )));
        }
        if self.counts.is_empty() || self.counts.contains(&0) {
            return Err(LabError::InvalidConfig(
                "omission counts must be non-empty and at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl Default for PanelOmission {
    fn default() -> Self {
        Self {
            probability: 0.14,
            counts: smallvec![1, 2],
        }
    }
}

/// Configuration for generating a single patient's row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorConfig {
    pub omission: PanelOmission,
    /// Seed for the row's random stream; `None` seeds from the OS
    pub seed: Option<u64>,
}

impl GeneratorConfig {
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_missing_panel_probability(mut self, probability: f64) -> Self {
        self.omission.probability = probability;
        self
    }

    #[must_use]
    pub fn with_omission(mut self, omission: PanelOmission) -> Self {
        self.omission = omission;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.omission.validate()
    }
}

impl fmt::Display for GeneratorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Generator Configuration:")?;
        writeln!(
            f,
            "  Missing Panel Probability: {}",
            self.omission.probability
        )?;
        writeln!(f, "  Omission Counts: {:?}", self.omission.counts.as_slice())?;
        if let Some(seed) = self.seed {
            writeln!(f, "  Seed: {seed}")?;
        }
        Ok(())
    }
}

/// Configuration for generating a cohort of patients
#[derive(Debug, Clone, PartialEq)]
pub struct CohortConfig {
    /// Number of rows to generate
    pub size: usize,
    /// Conditions to draw from; empty means every profiled condition
    pub conditions: Vec<String>,
    /// Sex keys to draw from
    pub sexes: Vec<String>,
    /// Inclusive age range
    pub age_range: RangeInclusive<u32>,
    /// Lifestyle combinations to draw from
    pub lifestyles: Vec<Vec<String>>,
    pub omission: PanelOmission,
    /// Row `i` is seeded with `base_seed + i`
    pub base_seed: Option<u64>,
    /// Show a progress bar while generating
    pub show_progress: bool,
}

impl CohortConfig {
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            size,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_conditions<I, S>(mut self, conditions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conditions = conditions.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_sexes<I, S>(mut self, sexes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sexes = sexes.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_age_range(mut self, age_range: RangeInclusive<u32>) -> Self {
        self.age_range = age_range;
        self
    }

    #[must_use]
    pub fn with_lifestyles(mut self, lifestyles: Vec<Vec<String>>) -> Self {
        self.lifestyles = lifestyles;
        self
    }

    #[must_use]
    pub fn with_omission(mut self, omission: PanelOmission) -> Self {
        self.omission = omission;
        self
    }

    #[must_use]
    pub fn with_base_seed(mut self, seed: u64) -> Self {
        self.base_seed = Some(seed);
        self
    }

    #[must_use]
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.omission.validate()?;
        if self.sexes.is_empty() {
            return Err(LabError::InvalidConfig("no sexes to sample from".into()));
        }
        if self.lifestyles.is_empty() {
            return Err(LabError::InvalidConfig(
                "no lifestyle combinations to sample from".into(),
            ));
        }
        if self.age_range.is_empty() {
            return Err(LabError::InvalidConfig(format!(
                "empty age range {:?}",
                self.age_range
            )));
        }
        Ok(())
    }
}

impl Default for CohortConfig {
    fn default() -> Self {
        let combos: [&[&str]; 7] = [
            &[],
            &[],
            &["smoker"],
            &["heavy_drinker"],
            &["smoker", "heavy_drinker"],
            &["athlete"],
            &["high_bmi"],
        ];
        let lifestyles: Vec<Vec<String>> = combos
            .iter()
            .map(|combo| combo.iter().map(|s| (*s).to_string()).collect())
            .collect();

        Self {
            size: 100,
            conditions: Vec::new(),
            sexes: vec!["male".into(), "female".into(), "non-binary".into()],
            age_range: 20..=85,
            lifestyles,
            omission: PanelOmission::default(),
            base_seed: None,
            show_progress: false,
        }
    }
}

impl fmt::Display for CohortConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cohort Configuration:")?;
        writeln!(f, "  Size: {}", self.size)?;
        if self.conditions.is_empty() {
            writeln!(f, "  Conditions: all profiled")?;
        } else {
            writeln!(f, "  Conditions: {}", self.conditions.join(", "))?;
        }
        writeln!(f, "  Sexes: {}", self.sexes.join(", "))?;
        writeln!(
            f,
            "  Age Range: {}-{}",
            self.age_range.start(),
            self.age_range.end()
        )?;
        writeln!(f, "  Lifestyle Combinations: {}", self.lifestyles.len())?;
        writeln!(
            f,
            "  Missing Panel Probability: {}",
            self.omission.probability
        )?;
        if let Some(seed) = self.base_seed {
            writeln!(f, "  Base Seed: {seed}")?;
        }
        Ok(())
    }
}
