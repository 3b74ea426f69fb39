//! Center-and-interval estimation
//!
//! Maps a finite numeric sample to a (center, low, high) triple according
//! to a [`StatKind`]. This is the single entry point the series cache
//! computes through.

use crate::bootstrap::Bootstrap;
use crate::interval::{Bca, Percentile, Pivotal};
use crate::kind::{BootstrapKind, Center, StatKind};
use evoplot_core::{CenterAndInterval, Config, Error, Result};
use tracing::debug;

/// Tunables for interval estimation, extracted from the run configuration
#[derive(Debug, Clone, Copy)]
pub struct EstimatorOptions {
    /// Confidence level for all bootstrap methods
    pub confidence_level: f64,
    /// Resamples for the percentile and pivotal methods
    pub bootstrap_samples: usize,
    /// Resamples for the BCa-family methods
    pub library_bootstrap_samples: usize,
    /// Base resampling seed; `None` draws a fresh one per estimate
    pub seed: Option<u64>,
}

impl Default for EstimatorOptions {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
            bootstrap_samples: 10_000,
            library_bootstrap_samples: 2_000,
            seed: None,
        }
    }
}

impl From<&Config> for EstimatorOptions {
    fn from(config: &Config) -> Self {
        Self {
            confidence_level: config.confidence_level,
            bootstrap_samples: config.bootstrap_samples,
            library_bootstrap_samples: config.library_bootstrap_samples,
            seed: config.bootstrap_seed,
        }
    }
}

/// Compute the (center, low, high) triple for `sample` under `kind`
pub fn estimate(kind: StatKind, sample: &[f64], options: &EstimatorOptions) -> Result<CenterAndInterval> {
    if sample.is_empty() {
        return Err(Error::Computation(
            "cannot estimate over an empty sample".to_string(),
        ));
    }
    match kind {
        StatKind::MedianAndInterquartileRange => Ok(median_and_interquartile_range(sample)),
        StatKind::MeanAndStdError => Ok(mean_and_std_error(sample)),
        StatKind::Bootstrap { center, method } => bootstrap_estimate(center, method, sample, options),
    }
}

/// Median with index-based quartile bounds
///
/// The bounds are the sorted values at `floor(0.25 * n)` and
/// `floor(0.75 * n)`, not interpolated percentiles. For small samples this
/// is biased outward, but the behavior is kept exactly as-is: cached series
/// written by earlier runs were computed this way, and changing it would
/// silently break comparability with them.
pub fn median_and_interquartile_range(sample: &[f64]) -> CenterAndInterval {
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let n = sorted.len();
    let center = Center::median_sorted(&sorted);
    let low = sorted[(0.25 * n as f64) as usize];
    let high = sorted[(0.75 * n as f64) as usize];
    CenterAndInterval::new(center, low, high)
}

/// Mean with standard-error bounds; a single observation yields a
/// zero-width interval
pub fn mean_and_std_error(sample: &[f64]) -> CenterAndInterval {
    let n = sample.len();
    let mean = sample.iter().sum::<f64>() / n as f64;
    if n <= 1 {
        return CenterAndInterval::degenerate(mean);
    }
    let variance = sample.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let sem = (variance / n as f64).sqrt();
    CenterAndInterval::new(mean, mean - sem, mean + sem)
}

fn bootstrap_estimate(
    center: Center,
    method: BootstrapKind,
    sample: &[f64],
    options: &EstimatorOptions,
) -> Result<CenterAndInterval> {
    match method {
        BootstrapKind::Percentile => {
            configure(Bootstrap::new(Percentile), options, method).estimate(sample, center)
        }
        BootstrapKind::Pivotal => {
            configure(Bootstrap::new(Pivotal), options, method).estimate(sample, center)
        }
        // The bca/pi/abc identifiers all resolve to the BCa construction.
        // A degenerate BCa step (singular jackknife under ties) falls back
        // to a zero-width interval instead of failing the run.
        BootstrapKind::Bca | BootstrapKind::Pi | BootstrapKind::Abc => {
            let boot = configure(Bootstrap::new(Bca::new(center)), options, method);
            match boot.estimate(sample, center) {
                Ok(ci) => Ok(ci),
                Err(Error::Computation(reason)) => {
                    debug!(%reason, "BCa interval degenerate, using zero-width fallback");
                    Ok(CenterAndInterval::degenerate(center.compute(sample)))
                }
                Err(other) => Err(other),
            }
        }
    }
}

fn configure<M: crate::interval::IntervalMethod>(
    boot: Bootstrap<M>,
    options: &EstimatorOptions,
    method: BootstrapKind,
) -> Bootstrap<M> {
    let resamples = if method.is_hand_rolled() {
        options.bootstrap_samples
    } else {
        options.library_bootstrap_samples
    };
    let boot = boot
        .with_resamples(resamples)
        .with_confidence_level(options.confidence_level);
    match options.seed {
        Some(seed) => boot.with_seed(seed),
        None => boot,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn opts(resamples: usize) -> EstimatorOptions {
        EstimatorOptions {
            bootstrap_samples: resamples,
            library_bootstrap_samples: resamples,
            seed: Some(99),
            ..EstimatorOptions::default()
        }
    }

    #[test]
    fn test_median_iqr_index_based_selection() {
        // Documented index-based behavior: for [1,2,3,4] the bounds are
        // the values at indices 1 and 3, not interpolated percentiles
        let ci = median_and_interquartile_range(&[1.0, 2.0, 3.0, 4.0]);
        assert_eq!(ci.center, 2.5);
        assert_eq!(ci.low, 2.0);
        assert_eq!(ci.high, 4.0);
    }

    #[test]
    fn test_median_iqr_odd_sample() {
        let ci = median_and_interquartile_range(&[5.0, 1.0, 3.0, 2.0, 4.0]);
        assert_eq!(ci.center, 3.0);
        assert_eq!(ci.low, 2.0); // index floor(0.25*5) = 1
        assert_eq!(ci.high, 4.0); // index floor(0.75*5) = 3
    }

    #[test]
    fn test_mean_and_std_error() {
        let ci = mean_and_std_error(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(ci.center, 3.0);
        // sem = sqrt(2.5 / 5)
        assert_relative_eq!(ci.high - ci.center, (2.5f64 / 5.0).sqrt(), epsilon = 1e-12);
        assert_relative_eq!(ci.center - ci.low, (2.5f64 / 5.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_mean_and_std_error_single_observation() {
        let ci = mean_and_std_error(&[7.0]);
        assert_eq!(ci.center, 7.0);
        assert_eq!(ci.width(), 0.0);
    }

    #[test]
    fn test_bca_family_falls_back_on_ties() {
        // All-ties sample makes the jackknife singular; the estimator must
        // degrade to a zero-width interval instead of failing
        let sample = vec![3.0; 12];
        for name in [
            "median_and_bootstrap_bca",
            "median_and_bootstrap_pi",
            "median_and_bootstrap_abc",
        ] {
            let kind: StatKind = name.parse().unwrap();
            let ci = estimate(kind, &sample, &opts(200)).unwrap();
            assert_eq!(ci.center, 3.0);
            assert_eq!(ci.width(), 0.0);
        }
    }

    #[test]
    fn test_bootstrap_kinds_bracket_center() {
        let sample: Vec<f64> = (0..30).map(|i| (i % 7) as f64 + (i as f64) * 0.1).collect();
        for name in [
            "mean_and_bootstrap_percentile",
            "mean_and_bootstrap_pivotal",
            "mean_and_bootstrap_bca",
        ] {
            let kind: StatKind = name.parse().unwrap();
            let ci = estimate(kind, &sample, &opts(1000)).unwrap();
            assert!(ci.low <= ci.center && ci.center <= ci.high, "{name}: {ci}");
            assert!(ci.width() > 0.0, "{name}");
        }
    }

    #[test]
    fn test_empty_sample_is_an_error() {
        assert!(estimate(
            StatKind::MedianAndInterquartileRange,
            &[],
            &EstimatorOptions::default()
        )
        .is_err());
    }
}
