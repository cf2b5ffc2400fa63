//! Error handling for lab result synthesis.

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Specialized error type for profile loading and result generation
#[derive(Debug, thiserror::Error)]
pub enum LabError {
    /// The requested condition is not declared in the loaded profiles
    #[error("Condition '{0}' not found in profiles")]
    UnknownCondition(String),

    /// A distribution name outside normal | lognormal | uniform | gamma
    #[error("Unsupported distribution '{0}'")]
    UnsupportedDistribution(String),

    /// Uniform sampling without both bounds
    #[error("uniform distribution requires both min and max")]
    MissingBound,

    /// Lower bound above upper bound
    #[error("Invalid bounds: min {min} is greater than max {max}")]
    InvalidBounds { min: f64, max: f64 },

    /// Parameters derived for a distribution were rejected by the sampler
    #[error("Invalid {distribution} parameters: {reason}")]
    InvalidParameters {
        distribution: &'static str,
        reason: String,
    },

    /// Profile document has a missing or ill-typed field
    #[error("Malformed profile: {0}")]
    MalformedProfile(String),

    /// Load-time failure annotated with its position in the profile document
    #[error("{location}: {source}")]
    Profile {
        location: String,
        #[source]
        source: Box<LabError>,
    },

    /// Generator or cohort configuration outside its valid range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Error opening, reading or writing a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error parsing or writing JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Error building Arrow arrays
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Error writing Parquet data
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),
}

impl LabError {
    /// Wrap an error with the profile location it was raised at
    ///
    /// Applying this to an already located error prefixes the outer location.
    #[must_use]
    pub fn at(self, location: impl Into<String>) -> Self {
        let location = location.into();
        match self {
            Self::Profile {
                location: inner,
                source,
            } => Self::Profile {
                location: format!("{location} > {inner}"),
                source,
            },
            other => Self::Profile {
                location,
                source: Box::new(other),
            },
        }
    }

    /// The underlying error with every location wrapper removed
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Profile { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Location path of a load-time error, if any
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        match self {
            Self::Profile { location, .. } => Some(location),
            _ => None,
        }
    }
}

/// Result type for lab synthesis operations
pub type Result<T> = std::result::Result<T, LabError>;
