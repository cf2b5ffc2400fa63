//! A Rust library for synthesizing plausible, internally consistent clinical
//! laboratory results for fictitious patients from declarative disease profiles.

pub mod algorithm;
pub mod config;
pub mod error;
pub mod models;
pub mod profile;
pub mod utils;

// Re-export the most common types for easier use
// Core types
pub use config::{CohortConfig, GeneratorConfig, PanelOmission};
pub use error::{LabError, Result};
pub use models::{Cohort, PatientContext, RowSchema, SampledRow};
pub use profile::{ConditionProfile, DiseaseProfiles, Distribution, Panel, TestSpec};

// Generation
pub use algorithm::{
    ChoiceSampler, CohortBuilder, LabGenerator, PatientSampler, generate_cohort,
    generate_lab_results,
};

// Arrow types
pub use arrow::record_batch::RecordBatch;
