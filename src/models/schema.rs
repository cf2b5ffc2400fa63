//! Column layout of generated rows

use itertools::Itertools;
use rustc_hash::FxHashMap;

/// Demographic columns leading every row
pub const DEMOGRAPHIC_COLUMNS: [&str; 3] = ["Sex", "Age", "Condition"];

/// Output column of a sampled test
#[must_use]
pub fn test_column(panel: &str, test: &str) -> String {
    format!("{panel} - {test}")
}

/// Percentage and absolute-count columns of a differential component
#[must_use]
pub fn differential_columns(panel: &str, label: &str) -> (String, String) {
    (
        format!("{panel} - {label} (%)"),
        format!("{panel} - {label} (×10^9/L)"),
    )
}

/// Ordered, duplicate-free list of value columns
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowSchema {
    columns: Vec<String>,
    index: FxHashMap<String, usize>,
}

impl RowSchema {
    /// Build from column names, keeping the first occurrence of duplicates
    pub fn from_columns<I>(columns: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let columns: Vec<String> = columns.into_iter().unique().collect();
        let index = columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.clone(), i))
            .collect();
        Self { columns, index }
    }

    /// Value columns, excluding the demographic ones
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Demographic columns followed by value columns
    pub fn all_columns(&self) -> impl Iterator<Item = &str> {
        DEMOGRAPHIC_COLUMNS
            .iter()
            .copied()
            .chain(self.columns.iter().map(String::as_str))
    }

    #[must_use]
    pub fn index_of(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Union of several layouts in first-seen order
    pub fn union<'a, I>(schemas: I) -> Self
    where
        I: IntoIterator<Item = &'a Self>,
    {
        Self::from_columns(
            schemas
                .into_iter()
                .flat_map(|s| s.columns.iter().cloned()),
        )
    }
}
