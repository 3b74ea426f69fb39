//! Core types for the evoplot engine
//!
//! This crate holds what the other evoplot crates share: the unified error
//! type, the typed run configuration, and the series data types
//! ([`Generation`], [`CenterAndInterval`], [`StatSeries`]).

pub mod config;
pub mod error;
pub mod types;

pub use config::{lighten_color, Config, PerIndex, TreatmentSpec, XPolicy};
pub use error::{Error, Result};
pub use types::{generation, CenterAndInterval, Generation, StatSeries};
