//! Generation algorithms
//!
//! Leaves first: distribution sampling, moment adjustment, panel assembly
//! (with differential reconciliation), and cohort generation on top.

pub mod adjustment;
pub mod cohort;
pub mod panel;
pub mod sampling;

pub use cohort::{ChoiceSampler, CohortBuilder, PatientSampler, generate_cohort};
pub use panel::{LabGenerator, SharedValueCache, generate_lab_results};
