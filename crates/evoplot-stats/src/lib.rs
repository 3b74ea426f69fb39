//! Statistical estimation for the evoplot engine
//!
//! Pure functions from finite numeric samples to plotted quantities:
//!
//! - [`estimator::estimate`] maps a sample to a (center, low, high) triple
//!   under a string-selected [`StatKind`]: median + IQR, mean + SEM, or a
//!   bootstrap interval (percentile, pivotal, or BCa family);
//! - [`rank::mann_whitney_u`] is the two-sample rank-sum test used for
//!   significance markers.
//!
//! Everything in this crate is deterministic given a resampling seed and
//! has no I/O; caching and series bookkeeping live in `evoplot-data`.

pub mod bootstrap;
pub mod estimator;
pub mod interval;
pub mod kind;
pub mod rank;

pub use bootstrap::Bootstrap;
pub use estimator::{estimate, mean_and_std_error, median_and_interquartile_range, EstimatorOptions};
pub use interval::{Bca, IntervalMethod, Percentile, Pivotal};
pub use kind::{BootstrapKind, Center, StatKind};
pub use rank::mann_whitney_u;
