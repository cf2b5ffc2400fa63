//! Typed building blocks of a test declaration.
//!
//! Every loosely-typed field of the profile document is closed into one of
//! these types at load time, so sampling never has to re-inspect JSON.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde_json::{Map, Value};

use crate::error::LabError;

/// Distribution family a test value is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Distribution {
    /// Direct draw with the given mean and sd
    #[default]
    Normal,
    /// Moment-matched log-normal
    LogNormal,
    /// Flat between the declared bounds
    Uniform,
    /// Moment-matched gamma
    Gamma,
}

impl Distribution {
    /// Lowercase name as written in profile documents
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::LogNormal => "lognormal",
            Self::Uniform => "uniform",
            Self::Gamma => "gamma",
        }
    }
}

impl FromStr for Distribution {
    type Err = LabError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "lognormal" => Ok(Self::LogNormal),
            "uniform" => Ok(Self::Uniform),
            "gamma" => Ok(Self::Gamma),
            _ => Err(LabError::UnsupportedDistribution(s.to_string())),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Pair of multipliers applied to a mean and its standard deviation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Multiplier {
    pub mean: f64,
    pub sd: f64,
}

impl Multiplier {
    /// Multiplier that leaves both moments unchanged
    pub const IDENTITY: Self = Self { mean: 1.0, sd: 1.0 };

    #[must_use]
    pub const fn new(mean: f64, sd: f64) -> Self {
        Self { mean, sd }
    }

    /// Scale a `(mean, sd)` pair
    #[must_use]
    pub fn apply(self, (mean, sd): (f64, f64)) -> (f64, f64) {
        (mean * self.mean, sd * self.sd)
    }
}

impl Default for Multiplier {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Sex-specific multipliers, keyed by lowercase sex
///
/// A bare number in the document is a mean multiplier with an sd multiplier
/// of 1.0; the object form `{multiplier, sd_multiplier}` sets both. Whichever
/// entry is resolved, exact key or the `other` fallback, applies both parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SexAdjustment {
    entries: FxHashMap<String, Multiplier>,
}

impl SexAdjustment {
    /// Key consulted when the patient's sex has no entry of its own
    pub const FALLBACK_KEY: &'static str = "other";

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for a sex key
    #[must_use]
    pub fn with_entry(mut self, sex: &str, multiplier: Multiplier) -> Self {
        self.entries.insert(sex.to_lowercase(), multiplier);
        self
    }

    /// Resolve the multiplier for a sex, falling back to `other`
    #[must_use]
    pub fn resolve(&self, sex: &str) -> Option<Multiplier> {
        let key = normalize_sex(sex);
        self.entries
            .get(key.as_str())
            .or_else(|| self.entries.get(Self::FALLBACK_KEY))
            .copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercased sex key; empty input maps to `other`
#[must_use]
pub fn normalize_sex(sex: &str) -> String {
    let trimmed = sex.trim();
    if trimmed.is_empty() {
        SexAdjustment::FALLBACK_KEY.to_string()
    } else {
        trimmed.to_lowercase()
    }
}

/// One inclusive age band with its multipliers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeBand {
    pub min_age: f64,
    pub max_age: f64,
    pub multiplier: Multiplier,
}

impl AgeBand {
    #[must_use]
    pub fn contains(&self, age: u32) -> bool {
        let age = f64::from(age);
        self.min_age <= age && age <= self.max_age
    }
}

/// Age dependence of a test
#[derive(Debug, Clone, PartialEq)]
pub enum AgeAdjustment {
    /// `factor = 1 + slope * max(0, age - ref_age)` on mean and sd alike
    Slope { slope: f64, ref_age: f64 },
    /// Ordered bands; the first band containing the age wins
    Bands(Vec<AgeBand>),
}

impl AgeAdjustment {
    /// Reference age used when a slope form omits `ref_age`
    pub const DEFAULT_REF_AGE: f64 = 40.0;

    /// Multiplier for the given age, if any applies
    #[must_use]
    pub fn multiplier_for(&self, age: u32) -> Option<Multiplier> {
        match self {
            Self::Slope { slope, ref_age } => {
                let excess = (f64::from(age) - ref_age).max(0.0);
                let factor = 1.0 + slope * excess;
                Some(Multiplier::new(factor, factor))
            }
            Self::Bands(bands) => bands
                .iter()
                .find(|band| band.contains(age))
                .map(|band| band.multiplier),
        }
    }
}

/// Effect of one lifestyle factor on a test
#[derive(Debug, Clone, PartialEq)]
pub struct LifestyleEffect {
    pub multiplier: Multiplier,
    /// Per-test overrides declared alongside the factor, kept as raw JSON
    /// and not applied
    pub exceptions: Map<String, Value>,
}

impl LifestyleEffect {
    #[must_use]
    pub fn new(multiplier: Multiplier) -> Self {
        Self {
            multiplier,
            exceptions: Map::new(),
        }
    }
}

/// Base proportions of the five differential cell types
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifferentialProps {
    pub neutrophils: f64,
    pub lymphocytes: f64,
    pub monocytes: f64,
    pub eosinophils: f64,
    pub basophils: f64,
}

impl DifferentialProps {
    /// Component names in output order, as keyed in profile documents
    pub const KEYS: [&'static str; 5] = [
        "neutrophils",
        "lymphocytes",
        "monocytes",
        "eosinophils",
        "basophils",
    ];

    /// Component labels used in output column names
    pub const LABELS: [&'static str; 5] = [
        "Neutrophils",
        "Lymphocytes",
        "Monocytes",
        "Eosinophils",
        "Basophils",
    ];

    #[must_use]
    pub const fn from_array(values: [f64; 5]) -> Self {
        Self {
            neutrophils: values[0],
            lymphocytes: values[1],
            monocytes: values[2],
            eosinophils: values[3],
            basophils: values[4],
        }
    }

    #[must_use]
    pub const fn to_array(self) -> [f64; 5] {
        [
            self.neutrophils,
            self.lymphocytes,
            self.monocytes,
            self.eosinophils,
            self.basophils,
        ]
    }

    /// Usable as Dirichlet base: no negative or non-finite parts and a positive sum
    #[must_use]
    pub fn is_usable(&self) -> bool {
        let values = self.to_array();
        values.iter().all(|v| v.is_finite() && *v >= 0.0) && values.iter().sum::<f64>() > 0.0
    }
}

impl Default for DifferentialProps {
    fn default() -> Self {
        Self::from_array([0.55, 0.30, 0.06, 0.07, 0.02])
    }
}
