//! Distribution sampling
//!
//! Draws one value from a distribution family parameterised by its linear
//! mean and standard deviation. Log-normal and gamma are moment matched so
//! the declared mean/sd hold on the natural scale of the result.

use rand::Rng;
use rand_distr::{Distribution as _, Gamma, LogNormal, Normal};

use crate::error::{LabError, Result};
use crate::profile::Distribution;

/// Floor applied to mean and sd before moment matching
pub const MOMENT_EPSILON: f64 = 1e-9;

/// Round to two decimal places
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Log-space `(mu, sigma)` with the given linear mean and sd
#[must_use]
pub fn lognormal_params(mean: f64, sd: f64) -> (f64, f64) {
    let m = mean.max(MOMENT_EPSILON);
    let s = sd.max(MOMENT_EPSILON);
    let mu = (m * m / (s * s + m * m).sqrt()).ln();
    let sigma = (1.0 + (s * s) / (m * m)).ln().sqrt();
    (mu, sigma)
}

/// Gamma `(shape, scale)` with the given mean and sd
#[must_use]
pub fn gamma_params(mean: f64, sd: f64) -> (f64, f64) {
    let m = mean.max(MOMENT_EPSILON);
    let s = sd.max(MOMENT_EPSILON);
    ((m * m) / (s * s), (s * s) / m)
}

/// Draw a value, clamp it into `[min, max]` when both bounds are given, and
/// round it to two decimals.
///
/// The bounds take precedence over the rounding: with a bound off the 0.01
/// grid the result may carry more than two decimals. Uniform ignores
/// `mean`/`sd` and requires both bounds.
pub fn sample<R: Rng + ?Sized>(
    distribution: Distribution,
    mean: f64,
    sd: f64,
    min: Option<f64>,
    max: Option<f64>,
    rng: &mut R,
) -> Result<f64> {
    if let (Some(lo), Some(hi)) = (min, max) {
        if lo > hi {
            return Err(LabError::InvalidBounds { min: lo, max: hi });
        }
    }
    let moments_ok = mean.is_finite() && sd.is_finite() && sd >= 0.0;
    if distribution != Distribution::Uniform && !moments_ok {
        return Err(invalid(
            distribution,
            &format!("need a finite mean and a finite, non-negative sd (mean {mean}, sd {sd})"),
        ));
    }

    let raw = match distribution {
        Distribution::Normal => Normal::new(mean, sd)
            .map_err(|e| invalid(distribution, &e))?
            .sample(rng),
        Distribution::LogNormal => {
            let (mu, sigma) = lognormal_params(mean, sd);
            LogNormal::new(mu, sigma)
                .map_err(|e| invalid(distribution, &e))?
                .sample(rng)
        }
        Distribution::Uniform => {
            let (Some(lo), Some(hi)) = (min, max) else {
                return Err(LabError::MissingBound);
            };
            rng.random_range(lo..=hi)
        }
        Distribution::Gamma => {
            let (shape, scale) = gamma_params(mean, sd);
            Gamma::new(shape, scale)
                .map_err(|e| invalid(distribution, &e))?
                .sample(rng)
        }
    };

    // Rounding can step past a bound that is not on the 0.01 grid
    Ok(match (min, max) {
        (Some(lo), Some(hi)) => round2(raw.clamp(lo, hi)).clamp(lo, hi),
        _ => round2(raw),
    })
}

/// Parse a distribution name and sample in one step
pub fn sample_named<R: Rng + ?Sized>(
    distribution: &str,
    mean: f64,
    sd: f64,
    min: Option<f64>,
    max: Option<f64>,
    rng: &mut R,
) -> Result<f64> {
    sample(distribution.parse()?, mean, sd, min, max, rng)
}

fn invalid(distribution: Distribution, err: &dyn std::fmt::Display) -> LabError {
    LabError::InvalidParameters {
        distribution: distribution.name(),
        reason: err.to_string(),
    }
}
