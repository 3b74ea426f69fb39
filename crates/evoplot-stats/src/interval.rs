//! Bootstrap interval constructions
//!
//! An [`IntervalMethod`] turns a bootstrap distribution into interval
//! bounds around the original estimate. The percentile and pivotal
//! methods only look at the bootstrap distribution; the BCa method also
//! needs the original sample for its jackknife acceleration step.

use crate::kind::Center;
use evoplot_core::{Error, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Construct interval bounds from a bootstrap distribution
pub trait IntervalMethod {
    /// Calculate `(low, high)` from the bootstrap estimates
    ///
    /// `sample` is the original sample the estimates were resampled from.
    fn interval(
        &self,
        sample: &[f64],
        bootstrap_estimates: &[f64],
        original_estimate: f64,
        confidence_level: f64,
    ) -> Result<(f64, f64)>;

    /// Method name for diagnostics
    fn name(&self) -> &'static str;
}

fn sorted_estimates(bootstrap_estimates: &[f64]) -> Result<Vec<f64>> {
    if bootstrap_estimates.is_empty() {
        return Err(Error::Computation("no bootstrap estimates".to_string()));
    }
    let mut sorted = bootstrap_estimates.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(sorted)
}

/// Index-based quantile of a sorted bootstrap distribution
fn quantile_sorted(sorted: &[f64], q: f64) -> f64 {
    let idx = ((q * sorted.len() as f64) as usize).min(sorted.len() - 1);
    sorted[idx]
}

/// Percentile bootstrap: the interval is the empirical alpha/2 and
/// 1 - alpha/2 quantiles of the bootstrap distribution.
#[derive(Debug, Clone, Copy, Default)]
pub struct Percentile;

impl IntervalMethod for Percentile {
    fn interval(
        &self,
        _sample: &[f64],
        bootstrap_estimates: &[f64],
        _original_estimate: f64,
        confidence_level: f64,
    ) -> Result<(f64, f64)> {
        let sorted = sorted_estimates(bootstrap_estimates)?;
        let alpha = 1.0 - confidence_level;
        Ok((
            quantile_sorted(&sorted, alpha / 2.0),
            quantile_sorted(&sorted, 1.0 - alpha / 2.0),
        ))
    }

    fn name(&self) -> &'static str {
        "percentile"
    }
}

/// Pivotal (basic) bootstrap: reflect the bootstrap quantiles around the
/// original estimate, correcting for skew of the bootstrap distribution
/// relative to the sampling distribution:
/// low = 2θ̂ − Q(1−α/2), high = 2θ̂ − Q(α/2).
#[derive(Debug, Clone, Copy, Default)]
pub struct Pivotal;

impl IntervalMethod for Pivotal {
    fn interval(
        &self,
        _sample: &[f64],
        bootstrap_estimates: &[f64],
        original_estimate: f64,
        confidence_level: f64,
    ) -> Result<(f64, f64)> {
        let sorted = sorted_estimates(bootstrap_estimates)?;
        let alpha = 1.0 - confidence_level;
        let low = 2.0 * original_estimate - quantile_sorted(&sorted, 1.0 - alpha / 2.0);
        let high = 2.0 * original_estimate - quantile_sorted(&sorted, alpha / 2.0);
        Ok((low, high))
    }

    fn name(&self) -> &'static str {
        "pivotal"
    }
}

/// BCa (bias-corrected and accelerated) bootstrap
///
/// Corrects the percentile bounds for bias (share of bootstrap estimates
/// below the original estimate) and skew (jackknife acceleration).
/// Fails with a computation error on degenerate input: every bootstrap
/// estimate on one side of the original, or a singular jackknife (all
/// leave-one-out estimates identical, which happens for the median under
/// heavy ties). Callers substitute a zero-width interval in that case.
#[derive(Debug, Clone, Copy)]
pub struct Bca {
    center: Center,
}

impl Bca {
    pub fn new(center: Center) -> Self {
        Self { center }
    }

    /// Jackknife acceleration factor
    fn acceleration(&self, sample: &[f64]) -> Result<f64> {
        let n = sample.len();
        if n < 2 {
            return Err(Error::Computation(
                "jackknife needs at least two observations".to_string(),
            ));
        }
        let mut loo = Vec::with_capacity(n);
        let mut held_out = Vec::with_capacity(n - 1);
        for i in 0..n {
            held_out.clear();
            held_out.extend_from_slice(&sample[..i]);
            held_out.extend_from_slice(&sample[i + 1..]);
            loo.push(self.center.compute(&held_out));
        }
        let loo_mean = loo.iter().sum::<f64>() / n as f64;
        let num: f64 = loo.iter().map(|&x| (loo_mean - x).powi(3)).sum();
        let den: f64 = loo.iter().map(|&x| (loo_mean - x).powi(2)).sum();
        let den = 6.0 * den.powf(1.5);
        if den == 0.0 || !den.is_finite() {
            return Err(Error::Computation(
                "jackknife variance is singular".to_string(),
            ));
        }
        Ok(num / den)
    }
}

impl IntervalMethod for Bca {
    fn interval(
        &self,
        sample: &[f64],
        bootstrap_estimates: &[f64],
        original_estimate: f64,
        confidence_level: f64,
    ) -> Result<(f64, f64)> {
        let sorted = sorted_estimates(bootstrap_estimates)?;

        // Bias correction from the share of estimates below the original
        let below = sorted.iter().filter(|&&x| x < original_estimate).count() as f64;
        let proportion = below / sorted.len() as f64;
        if proportion <= 0.0 || proportion >= 1.0 {
            return Err(Error::Computation(format!(
                "bootstrap distribution is entirely {} the estimate",
                if proportion <= 0.0 { "above" } else { "below" }
            )));
        }
        let normal = Normal::new(0.0, 1.0).map_err(|e| {
            Error::Computation(format!("failed to create normal distribution: {e}"))
        })?;
        let z0 = normal.inverse_cdf(proportion);
        let a = self.acceleration(sample)?;

        let alpha = 1.0 - confidence_level;
        let z_low = normal.inverse_cdf(alpha / 2.0);
        let z_high = normal.inverse_cdf(1.0 - alpha / 2.0);
        let alpha1 = normal.cdf(z0 + (z0 + z_low) / (1.0 - a * (z0 + z_low)));
        let alpha2 = normal.cdf(z0 + (z0 + z_high) / (1.0 - a * (z0 + z_high)));
        if !alpha1.is_finite() || !alpha2.is_finite() {
            return Err(Error::Computation(
                "adjusted percentiles are not finite".to_string(),
            ));
        }

        Ok((
            quantile_sorted(&sorted, alpha1),
            quantile_sorted(&sorted, alpha2),
        ))
    }

    fn name(&self) -> &'static str {
        "bca"
    }
}
