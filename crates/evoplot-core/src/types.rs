//! Shared data types for stat series
//!
//! Generations are numeric x-axis keys. They are usually non-negative
//! integers (an iteration count), but may be arbitrary numeric values when
//! read from a file column, so they are kept as ordered floats throughout.

use ordered_float::OrderedFloat;
use std::collections::BTreeMap;
use std::fmt;

/// The x-axis key of a series: an ordered numeric value
pub type Generation = OrderedFloat<f64>;

/// Convenience constructor for generation keys
pub fn generation(value: f64) -> Generation {
    OrderedFloat(value)
}

/// A point estimate with its interval bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterAndInterval {
    /// The point estimate (median or mean)
    pub center: f64,
    /// Lower bound of the interval
    pub low: f64,
    /// Upper bound of the interval
    pub high: f64,
}

impl CenterAndInterval {
    pub fn new(center: f64, low: f64, high: f64) -> Self {
        Self { center, low, high }
    }

    /// A zero-width interval, used as the conservative fallback when an
    /// interval method fails on degenerate input
    pub fn degenerate(center: f64) -> Self {
        Self {
            center,
            low: center,
            high: center,
        }
    }

    /// Width of the interval
    pub fn width(&self) -> f64 {
        self.high - self.low
    }

    /// Check if a value is contained in the interval
    pub fn contains(&self, value: f64) -> bool {
        value >= self.low && value <= self.high
    }
}

impl fmt::Display for CenterAndInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}, {}]", self.center, self.low, self.high)
    }
}

/// One plotted series: generation -> (center, low, high), ascending by
/// generation, with the number of observations that contributed at each
/// generation (zero for points restored from cache, where the count is
/// not recorded).
#[derive(Debug, Clone, Default)]
pub struct StatSeries {
    points: BTreeMap<Generation, CenterAndInterval>,
    counts: BTreeMap<Generation, usize>,
}

impl StatSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Insert a point computed from `n` raw observations
    pub fn insert(&mut self, generation: Generation, point: CenterAndInterval, n: usize) {
        self.points.insert(generation, point);
        self.counts.insert(generation, n);
    }

    /// Insert a point restored from cache (observation count unknown)
    pub fn insert_cached(&mut self, generation: Generation, point: CenterAndInterval) {
        self.points.insert(generation, point);
    }

    pub fn get(&self, generation: Generation) -> Option<&CenterAndInterval> {
        self.points.get(&generation)
    }

    /// Observations contributing at a generation, zero if restored from cache
    pub fn count(&self, generation: Generation) -> usize {
        self.counts.get(&generation).copied().unwrap_or(0)
    }

    /// Generation keys in ascending order
    pub fn generations(&self) -> impl Iterator<Item = Generation> + '_ {
        self.points.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Generation, &CenterAndInterval)> {
        self.points.iter().map(|(g, p)| (*g, p))
    }

    /// Center values in ascending generation order
    pub fn centers(&self) -> Vec<f64> {
        self.points.values().map(|p| p.center).collect()
    }

    /// Lower bounds in ascending generation order
    pub fn lows(&self) -> Vec<f64> {
        self.points.values().map(|p| p.low).collect()
    }

    /// Upper bounds in ascending generation order
    pub fn highs(&self) -> Vec<f64> {
        self.points.values().map(|p| p.high).collect()
    }

    /// Largest generation key, if any
    pub fn max_generation(&self) -> Option<Generation> {
        self.points.keys().next_back().copied()
    }
}
