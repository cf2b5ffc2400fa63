//! White cell differential reconciliation
//!
//! Splits a sampled total white cell count into five cell-type counts whose
//! rounded values add back up to the total.

use log::{debug, warn};
use rand::Rng;
use rand_distr::{Distribution as _, Gamma};

use crate::algorithm::sampling::round2;
use crate::error::{LabError, Result};
use crate::profile::DifferentialProps;

/// Scale applied to base proportions to form the Dirichlet concentration
pub const DIRICHLET_CONCENTRATION: f64 = 50.0;

/// Largest tolerated gap between the count sum and the total
pub const SUM_TOLERANCE: f64 = 0.01;

/// Sampled differential in component order (see `DifferentialProps::LABELS`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Differential {
    /// Sampled proportions, summing to 1
    pub proportions: [f64; 5],
    /// Proportions as percentages, rounded to two decimals
    pub percentages: [f64; 5],
    /// Absolute counts, rounded to two decimals and summing to the total
    pub counts: [f64; 5],
}

/// Sample a differential for `total`, or `None` when there is no total
pub fn reconcile<R: Rng + ?Sized>(
    total: Option<f64>,
    props: Option<&DifferentialProps>,
    rng: &mut R,
) -> Result<Option<Differential>> {
    let Some(total) = total else {
        debug!("No total white cell count, differential left empty");
        return Ok(None);
    };

    let base = match props {
        Some(p) if p.is_usable() => *p,
        Some(p) => {
            warn!("Unusable differential proportions {p:?}, using defaults");
            DifferentialProps::default()
        }
        None => DifferentialProps::default(),
    };

    let alpha = base.to_array().map(|p| p * DIRICHLET_CONCENTRATION);
    let proportions = sample_dirichlet(&alpha, rng)?;

    let mut counts = proportions.map(|p| round2(p * total));
    apply_residual(&mut counts, total);

    Ok(Some(Differential {
        proportions,
        percentages: proportions.map(|p| round2(p * 100.0)),
        counts,
    }))
}

/// Draw from Dirichlet(alpha) by normalising independent Gamma(alpha_i, 1)
/// draws. Components with zero concentration are always zero.
pub fn sample_dirichlet<R: Rng + ?Sized>(alpha: &[f64; 5], rng: &mut R) -> Result<[f64; 5]> {
    let mut draws = [0.0; 5];
    for (draw, &a) in draws.iter_mut().zip(alpha) {
        if a > 0.0 {
            *draw = Gamma::new(a, 1.0)
                .map_err(|e| LabError::InvalidParameters {
                    distribution: "dirichlet",
                    reason: e.to_string(),
                })?
                .sample(rng);
        }
    }
    let sum: f64 = draws.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return Err(LabError::InvalidParameters {
            distribution: "dirichlet",
            reason: format!("degenerate concentration {alpha:?}"),
        });
    }
    Ok(draws.map(|d| d / sum))
}

/// Give the whole rounding residual to the largest count.
///
/// The choice of bucket is a convention kept for reproducibility; ties go to
/// the first component in label order.
fn apply_residual(counts: &mut [f64; 5], total: f64) {
    let residual = round2(total - counts.iter().sum::<f64>());
    if residual.abs() < SUM_TOLERANCE {
        return;
    }
    let largest = counts
        .iter()
        .enumerate()
        .fold(0, |best, (i, &c)| if c > counts[best] { i } else { best });
    counts[largest] = round2(counts[largest] + residual);
}
