//! Aggregation, caching and significance testing for repeated-measures
//! experiment logs
//!
//! The workspace splits into three crates, re-exported here under one
//! roof:
//!
//! - `evoplot-core`: configuration, error type, and the series
//!   primitives;
//! - `evoplot-stats`: estimators (median/IQR, mean/SEM, bootstrap
//!   intervals) and the Mann-Whitney rank test;
//! - `evoplot-data`: treatment resolution, log parsing, the two cache
//!   layers, and the [`Dataset`] query surface.
//!
//! Typical use builds a [`Config`], hands it to [`Dataset::new`], and
//! queries series and comparisons from there:
//!
//! ```no_run
//! use evoplot::{Config, Dataset, StatKind, TreatmentSpec};
//!
//! # fn main() -> evoplot::Result<()> {
//! let config = Config {
//!     treatments: vec![
//!         TreatmentSpec::named("runs/control", "control"),
//!         TreatmentSpec::named("runs/variant", "variant"),
//!     ],
//!     comparison_main: vec!["control".to_string()],
//!     ..Config::default()
//! };
//! let mut dataset = Dataset::new(config)?;
//! let kind: StatKind = "median_and_interquartile_range".parse()?;
//! let series = dataset.get_stats(0, 1, kind)?;
//! for (generation, point) in series.iter() {
//!     println!("{generation}: {} [{}, {}]", point.center, point.low, point.high);
//! }
//! # Ok(())
//! # }
//! ```

pub use evoplot_core::{
    generation, lighten_color, CenterAndInterval, Config, Error, Generation, PerIndex, Result,
    StatSeries, TreatmentSpec, XPolicy,
};
pub use evoplot_data::{Comparisons, Dataset, RawData, Treatment, TreatmentData, TreatmentList};
pub use evoplot_stats::{mann_whitney_u, BootstrapKind, Center, StatKind};
