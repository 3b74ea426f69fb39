//! Data aggregation and caching for the evoplot engine
//!
//! This crate turns directories of repeated-measures run logs into the
//! quantities a plot needs:
//!
//! - [`catalog`] resolves treatment specifications (explicit files or
//!   template walks) into [`catalog::Treatment`]s with stable cache
//!   prefixes;
//! - [`parse`] and [`raw`] read the delimited log files into per-plot,
//!   per-generation observation samples;
//! - [`series`] computes statistic series through a per-treatment file
//!   cache;
//! - [`comparison`] runs rank tests between treatments through a single
//!   shared cache;
//! - [`dataset::Dataset`] ties it all together behind a memoized query
//!   surface.
//!
//! Cache files live next to the data they were computed from and carry
//! enough context in their names and entries to detect when the current
//! configuration no longer matches what was cached.

pub mod catalog;
pub mod comparison;
pub mod dataset;
pub mod parse;
pub mod raw;
pub mod series;

pub use catalog::{create_prefix, Treatment, TreatmentList};
pub use comparison::{Comparisons, ComparisonKey};
pub use dataset::Dataset;
pub use raw::{load_raw_data, RawData};
pub use series::TreatmentData;
