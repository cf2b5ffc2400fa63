//! Disease profile model
//!
//! A profile document maps condition names to ordered panels of test
//! declarations. It is loaded once, validated eagerly, and read-only after.

pub mod loader;
pub mod types;

use std::sync::Arc;

use rand::Rng;
use rand::seq::IndexedRandom;
use rustc_hash::FxHashMap;

use crate::error::{LabError, Result};
use crate::models::schema::{RowSchema, differential_columns, test_column};

pub use types::{
    AgeAdjustment, AgeBand, DifferentialProps, Distribution, LifestyleEffect, Multiplier,
    SexAdjustment,
};

/// Known spellings of the total white cell count test
pub const TOTAL_COUNT_ALIASES: [&str; 4] =
    ["WBC (×10^9/L)", "WBC (10^9/L)", "WBC", "WBC (x10^9/L)"];

/// Declaration of a single laboratory test
#[derive(Debug, Clone, PartialEq)]
pub struct TestSpec {
    pub name: String,
    pub distribution: Distribution,
    pub mean: f64,
    pub sd: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub sex_adjustment: Option<SexAdjustment>,
    pub age_adjustment: Option<AgeAdjustment>,
    /// Lifestyle factor name to its effect
    pub lifestyle: FxHashMap<String, LifestyleEffect>,
}

impl TestSpec {
    /// Normal test with the given mean and no adjustments
    #[must_use]
    pub fn new(name: impl Into<String>, mean: f64) -> Self {
        Self {
            name: name.into(),
            distribution: Distribution::Normal,
            mean,
            sd: None,
            min: None,
            max: None,
            sex_adjustment: None,
            age_adjustment: None,
            lifestyle: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn with_distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    #[must_use]
    pub fn with_sd(mut self, sd: f64) -> Self {
        self.sd = Some(sd);
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    #[must_use]
    pub fn with_sex_adjustment(mut self, adjustment: SexAdjustment) -> Self {
        self.sex_adjustment = Some(adjustment);
        self
    }

    #[must_use]
    pub fn with_age_adjustment(mut self, adjustment: AgeAdjustment) -> Self {
        self.age_adjustment = Some(adjustment);
        self
    }

    #[must_use]
    pub fn with_lifestyle(mut self, factor: &str, effect: LifestyleEffect) -> Self {
        self.lifestyle.insert(factor.to_string(), effect);
        self
    }

    /// Declared sd, or 10% of the mean with a floor of 0.01
    #[must_use]
    pub fn base_sd(&self) -> f64 {
        self.sd.unwrap_or_else(|| (0.1 * self.mean).max(0.01))
    }

    /// Check the sd, the bounds and the uniform requirement
    pub fn validate(&self) -> Result<()> {
        if let Some(sd) = self.sd.filter(|sd| !(sd.is_finite() && *sd >= 0.0)) {
            return Err(LabError::MalformedProfile(format!(
                "'sd' must be non-negative, got {sd}"
            )));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(LabError::InvalidBounds { min, max });
            }
        }
        if self.distribution == Distribution::Uniform && (self.min.is_none() || self.max.is_none())
        {
            return Err(LabError::MissingBound);
        }
        Ok(())
    }
}

/// Ordered group of tests reported together
#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub name: String,
    pub tests: Vec<TestSpec>,
    /// Differential base proportions; `None` when undeclared or malformed
    pub differential_props: Option<DifferentialProps>,
    /// Number of tests declared before the differential metadata. The
    /// differential columns go there; `None` puts them after the last test.
    pub differential_position: Option<usize>,
}

impl Panel {
    #[must_use]
    pub fn new(name: impl Into<String>, tests: Vec<TestSpec>) -> Self {
        Self {
            name: name.into(),
            tests,
            differential_props: None,
            differential_position: None,
        }
    }

    #[must_use]
    pub fn with_differential_props(mut self, props: DifferentialProps) -> Self {
        self.differential_props = Some(props);
        self
    }

    /// Place the differential columns after the first `position` tests
    #[must_use]
    pub fn with_differential_position(mut self, position: usize) -> Self {
        self.differential_position = Some(position);
        self
    }

    /// Where the differential columns sit among the tests
    #[must_use]
    pub fn differential_insert_at(&self) -> usize {
        self.differential_position
            .map_or(self.tests.len(), |pos| pos.min(self.tests.len()))
    }

    /// Whether a panel name denotes a full blood count
    #[must_use]
    pub fn is_composite_name(name: &str) -> bool {
        let lower = name.to_lowercase();
        lower.contains("fbc") || (lower.contains("full") && lower.contains("blood"))
    }

    /// Index of the total white cell count test, by alias then by substring
    #[must_use]
    pub fn total_count_test(&self) -> Option<usize> {
        TOTAL_COUNT_ALIASES
            .iter()
            .find_map(|alias| self.tests.iter().position(|t| t.name == *alias))
            .or_else(|| {
                self.tests
                    .iter()
                    .position(|t| t.name.to_lowercase().contains("wbc"))
            })
    }
}

/// Column positions of the ten differential outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifferentialSlots {
    pub percentages: [usize; 5],
    pub counts: [usize; 5],
}

/// All panels declared for one condition, with the derived row layout
#[derive(Debug, Clone)]
pub struct ConditionProfile {
    name: String,
    panels: Vec<Panel>,
    composite_panel: Option<usize>,
    schema: Arc<RowSchema>,
    test_slots: Vec<Vec<usize>>,
    differential_slots: Option<DifferentialSlots>,
}

impl ConditionProfile {
    /// Build a condition and derive its fixed column layout
    pub fn new(name: impl Into<String>, panels: Vec<Panel>) -> Result<Self> {
        let name = name.into();
        for panel in &panels {
            for test in &panel.tests {
                test.validate().map_err(|e| {
                    e.at(format!("{name} > panels > {} > {}", panel.name, test.name))
                })?;
            }
        }

        let composite_panel = panels.iter().position(|p| Panel::is_composite_name(&p.name));

        let mut columns = Vec::new();
        for (idx, panel) in panels.iter().enumerate() {
            let (before, after) = if composite_panel == Some(idx) {
                panel.tests.split_at(panel.differential_insert_at())
            } else {
                (panel.tests.as_slice(), &[][..])
            };
            columns.extend(before.iter().map(|t| test_column(&panel.name, &t.name)));
            if composite_panel == Some(idx) {
                for label in DifferentialProps::LABELS {
                    let (pct, abs) = differential_columns(&panel.name, label);
                    columns.push(pct);
                    columns.push(abs);
                }
            }
            columns.extend(after.iter().map(|t| test_column(&panel.name, &t.name)));
        }
        let schema = RowSchema::from_columns(columns);

        let slot = |column: String| -> Result<usize> {
            schema.index_of(&column).ok_or_else(|| {
                LabError::MalformedProfile(format!("column '{column}' missing from layout"))
            })
        };

        let test_slots = panels
            .iter()
            .map(|panel| {
                panel
                    .tests
                    .iter()
                    .map(|t| slot(test_column(&panel.name, &t.name)))
                    .collect::<Result<Vec<_>>>()
            })
            .collect::<Result<Vec<_>>>()?;

        let differential_slots = match composite_panel {
            Some(idx) => {
                let panel_name = &panels[idx].name;
                let mut slots = DifferentialSlots {
                    percentages: [0; 5],
                    counts: [0; 5],
                };
                for (i, label) in DifferentialProps::LABELS.iter().enumerate() {
                    let (pct, abs) = differential_columns(panel_name, label);
                    slots.percentages[i] = slot(pct)?;
                    slots.counts[i] = slot(abs)?;
                }
                Some(slots)
            }
            None => None,
        };

        Ok(Self {
            name,
            panels,
            composite_panel,
            schema: Arc::new(schema),
            test_slots,
            differential_slots,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    /// Index of the full blood count panel, if the condition has one
    #[must_use]
    pub fn composite_panel(&self) -> Option<usize> {
        self.composite_panel
    }

    /// Column layout shared by every row of this condition
    #[must_use]
    pub fn schema(&self) -> &Arc<RowSchema> {
        &self.schema
    }

    /// Column index of a test within a panel
    #[must_use]
    pub fn test_slot(&self, panel: usize, test: usize) -> usize {
        self.test_slots[panel][test]
    }

    #[must_use]
    pub fn differential_slots(&self) -> Option<&DifferentialSlots> {
        self.differential_slots.as_ref()
    }
}

/// Every condition of a loaded profile document, in document order
#[derive(Debug, Clone, Default)]
pub struct DiseaseProfiles {
    conditions: Vec<ConditionProfile>,
    index: FxHashMap<String, usize>,
}

impl DiseaseProfiles {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a condition, replacing any previous one of the same name
    pub fn insert(&mut self, condition: ConditionProfile) {
        if let Some(&idx) = self.index.get(condition.name()) {
            self.conditions[idx] = condition;
        } else {
            self.index
                .insert(condition.name().to_string(), self.conditions.len());
            self.conditions.push(condition);
        }
    }

    /// Look up a condition by exact name
    pub fn get(&self, name: &str) -> Result<&ConditionProfile> {
        self.index
            .get(name)
            .map(|&idx| &self.conditions[idx])
            .ok_or_else(|| LabError::UnknownCondition(name.to_string()))
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn condition_names(&self) -> impl Iterator<Item = &str> {
        self.conditions.iter().map(ConditionProfile::name)
    }

    pub fn conditions(&self) -> impl Iterator<Item = &ConditionProfile> {
        self.conditions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Pick a condition name uniformly at random
    pub fn random_condition<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&str> {
        self.conditions.choose(rng).map(ConditionProfile::name)
    }
}
