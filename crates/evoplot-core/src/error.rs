//! Error types for the evoplot engine
//!
//! Provides a unified error type for all evoplot crates.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Core error type for data aggregation and statistics
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration (unknown statistic kind, inconsistent pooled
    /// input, bad option combination). Fatal, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed numeric data in an input file. Fatal for that file.
    #[error("Parse error in {file} at line {line}: {message}")]
    Parse {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// Numerical computation error (empty sample, singular jackknife).
    /// Interval estimation catches this internally for the bootstrap
    /// family and substitutes a degenerate interval.
    #[error("Computation error: {0}")]
    Computation(String),

    /// Cache inconsistency (shape/step/identity mismatch, short read,
    /// missing entry). Recovered internally by recomputation; callers of
    /// the public query surface never see this variant.
    #[error("Cache error: {0}")]
    Cache(String),

    /// IO error (for file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an error for a token that failed float parsing
    pub fn bad_token(file: &Path, line: usize, token: &str) -> Self {
        Self::Parse {
            file: file.to_path_buf(),
            line,
            message: format!("expected a number, found {token:?}"),
        }
    }

    /// Create an error for an unknown statistic kind string
    pub fn unknown_stat_kind(kind: &str) -> Self {
        Self::Config(format!("unknown statistic kind {kind:?}"))
    }

    /// Create an error for a cache entry with too few fields
    pub fn short_cache_entry(expected: usize, actual: usize) -> Self {
        Self::Cache(format!(
            "entry is too short: expected {expected} fields, got {actual}"
        ))
    }
}
