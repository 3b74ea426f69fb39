//! Statistic kind selection
//!
//! Estimator kinds are selected by string identifier (they also appear in
//! cache file names, so the spelling is part of the on-disk format).
//! An unknown identifier is a configuration error.

use evoplot_core::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// The central statistic of a sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Center {
    Mean,
    Median,
}

impl Center {
    /// Compute the statistic over a sample
    pub fn compute(&self, data: &[f64]) -> f64 {
        match self {
            Center::Mean => data.iter().sum::<f64>() / data.len() as f64,
            Center::Median => {
                let mut sorted = data.to_vec();
                sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
                Self::median_sorted(&sorted)
            }
        }
    }

    /// Median of already-sorted data, interpolating between the two middle
    /// elements for even lengths
    pub fn median_sorted(sorted: &[f64]) -> f64 {
        let n = sorted.len();
        if n % 2 == 1 {
            sorted[n / 2]
        } else {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        }
    }

    fn name(&self) -> &'static str {
        match self {
            Center::Mean => "mean",
            Center::Median => "median",
        }
    }
}

/// Which bootstrap interval construction to apply
///
/// `Bca`, `Pi` and `Abc` are distinct identifiers for compatibility with
/// existing cache files, but all three resolve to the bias-corrected and
/// accelerated construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapKind {
    Percentile,
    Pivotal,
    Bca,
    Pi,
    Abc,
}

impl BootstrapKind {
    /// Whether this kind uses the hand-rolled resampler defaults rather
    /// than the BCa-family defaults
    pub fn is_hand_rolled(&self) -> bool {
        matches!(self, BootstrapKind::Percentile | BootstrapKind::Pivotal)
    }

    fn name(&self) -> &'static str {
        match self {
            BootstrapKind::Percentile => "percentile",
            BootstrapKind::Pivotal => "pivotal",
            BootstrapKind::Bca => "bca",
            BootstrapKind::Pi => "pi",
            BootstrapKind::Abc => "abc",
        }
    }
}

/// A center-and-interval estimator kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatKind {
    /// Median with index-based quartile bounds
    MedianAndInterquartileRange,
    /// Mean with standard-error bounds
    MeanAndStdError,
    /// Bootstrap interval around the given central statistic
    Bootstrap {
        center: Center,
        method: BootstrapKind,
    },
}

impl StatKind {
    pub const MEDIAN_IQR: &'static str = "median_and_interquartile_range";
    pub const MEAN_STD_ERROR: &'static str = "mean_and_std_error";
}

impl FromStr for StatKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            Self::MEDIAN_IQR => return Ok(StatKind::MedianAndInterquartileRange),
            Self::MEAN_STD_ERROR => return Ok(StatKind::MeanAndStdError),
            _ => {}
        }
        let rest = s
            .strip_prefix("median_and_bootstrap_")
            .map(|rest| (Center::Median, rest))
            .or_else(|| {
                s.strip_prefix("mean_and_bootstrap_")
                    .map(|rest| (Center::Mean, rest))
            });
        let (center, method) = rest.ok_or_else(|| Error::unknown_stat_kind(s))?;
        let method = match method {
            "percentile" => BootstrapKind::Percentile,
            "pivotal" => BootstrapKind::Pivotal,
            "bca" => BootstrapKind::Bca,
            "pi" => BootstrapKind::Pi,
            "abc" => BootstrapKind::Abc,
            _ => return Err(Error::unknown_stat_kind(s)),
        };
        Ok(StatKind::Bootstrap { center, method })
    }
}

impl fmt::Display for StatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatKind::MedianAndInterquartileRange => f.write_str(Self::MEDIAN_IQR),
            StatKind::MeanAndStdError => f.write_str(Self::MEAN_STD_ERROR),
            StatKind::Bootstrap { center, method } => {
                write!(f, "{}_and_bootstrap_{}", center.name(), method.name())
            }
        }
    }
}
