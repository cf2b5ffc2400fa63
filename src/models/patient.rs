//! Patient attributes that drive adjustment

use std::fmt;

use serde::{Deserialize, Serialize};

/// Demographic and lifestyle attributes of one fictitious patient
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContext {
    /// Free-form sex key, matched case-insensitively against profile entries
    pub sex: String,
    /// Age in whole years
    pub age: u32,
    /// Lifestyle factors, applied in this order
    #[serde(default)]
    pub lifestyle: Vec<String>,
}

impl PatientContext {
    #[must_use]
    pub fn new(sex: impl Into<String>, age: u32) -> Self {
        Self {
            sex: sex.into(),
            age,
            lifestyle: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_lifestyle<I, S>(mut self, factors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lifestyle = factors.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for PatientContext {
    fn default() -> Self {
        Self::new("other", 50)
    }
}

impl fmt::Display for PatientContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {} years", self.sex, self.age)?;
        if !self.lifestyle.is_empty() {
            write!(f, " ({})", self.lifestyle.join(", "))?;
        }
        Ok(())
    }
}
