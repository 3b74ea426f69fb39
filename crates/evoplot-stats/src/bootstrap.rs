//! Bootstrap resampling engine
//!
//! Resamples with replacement, computes the central statistic on each
//! resample and hands the bootstrap distribution to an [`IntervalMethod`].
//! Each resample draws from its own RNG seeded from the base seed plus the
//! resample index, so a fixed seed reproduces the full distribution.

use crate::interval::IntervalMethod;
use crate::kind::Center;
use evoplot_core::{CenterAndInterval, Error, Result};
use rand::prelude::*;
use tracing::debug;

/// Bootstrap engine over a single sample
#[derive(Debug, Clone)]
pub struct Bootstrap<M> {
    method: M,
    n_resamples: usize,
    confidence_level: f64,
    seed: Option<u64>,
}

impl<M: IntervalMethod> Bootstrap<M> {
    pub fn new(method: M) -> Self {
        Self {
            method,
            n_resamples: 10_000,
            confidence_level: 0.95,
            seed: None,
        }
    }

    /// Set the number of bootstrap resamples
    pub fn with_resamples(mut self, n_resamples: usize) -> Self {
        assert!(n_resamples > 0, "Number of resamples must be positive");
        self.n_resamples = n_resamples;
        self
    }

    /// Set the confidence level
    pub fn with_confidence_level(mut self, confidence_level: f64) -> Self {
        assert!(
            confidence_level > 0.0 && confidence_level < 1.0,
            "Confidence level must be in (0, 1)"
        );
        self.confidence_level = confidence_level;
        self
    }

    /// Set random seed for reproducibility
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Estimate `center` over `sample` with bootstrap interval bounds
    pub fn estimate(&self, sample: &[f64], center: Center) -> Result<CenterAndInterval> {
        if sample.is_empty() {
            return Err(Error::Computation(
                "cannot bootstrap an empty sample".to_string(),
            ));
        }
        let original = center.compute(sample);
        let estimates = self.resample(sample, center);
        let (low, high) =
            self.method
                .interval(sample, &estimates, original, self.confidence_level)?;
        Ok(CenterAndInterval::new(original, low, high))
    }

    /// The bootstrap distribution of `center` over `sample`
    pub fn resample(&self, sample: &[f64], center: Center) -> Vec<f64> {
        let seed = self.seed.unwrap_or_else(|| thread_rng().gen());
        debug!(
            n_resamples = self.n_resamples,
            n = sample.len(),
            method = self.method.name(),
            "generating bootstrap distribution"
        );
        let mut resample = vec![0.0; sample.len()];
        (0..self.n_resamples)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(seed.wrapping_add(i as u64));
                for slot in resample.iter_mut() {
                    *slot = sample[rng.gen_range(0..sample.len())];
                }
                center.compute(&resample)
            })
            .collect()
    }
}
