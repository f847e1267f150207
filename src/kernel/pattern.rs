//! Pattern type for artmap.
//!
//! A pattern is the unit of training and query data: an ordered,
//! fixed-length sequence of `f64` values. Patterns are immutable once
//! built; geometries derive whatever encoding they need (complement
//! coding, channel slices) into their own buffers.

use serde::{Deserialize, Serialize};
use std::ops::{Index, Range};

/// An immutable fixed-dimension input vector.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    values: Vec<f64>,
}

impl Pattern {
    /// Create a pattern from raw values.
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Create a pattern by copying a slice.
    pub fn from_slice(values: &[f64]) -> Self {
        Self {
            values: values.to_vec(),
        }
    }

    /// Create a pattern of `dimensions` copies of `value`.
    pub fn filled(dimensions: usize, value: f64) -> Self {
        Self {
            values: vec![value; dimensions],
        }
    }

    /// Get the dimensionality.
    pub fn dimensions(&self) -> usize {
        self.values.len()
    }

    /// Get the raw values as a slice.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Copy out a contiguous sub-range as a new pattern.
    ///
    /// Returns `None` when the range falls outside the pattern.
    pub fn slice(&self, range: Range<usize>) -> Option<Pattern> {
        self.values.get(range).map(Pattern::from_slice)
    }

    /// True when every value is finite (no NaN or infinity).
    pub fn is_finite(&self) -> bool {
        self.values.iter().all(|v| v.is_finite())
    }

    /// Fraction of exactly-zero elements (0.0 for an empty pattern).
    pub fn sparsity(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let zeros = self.values.iter().filter(|&&v| v == 0.0).count();
        zeros as f64 / self.values.len() as f64
    }

    /// Bit-exact key, used for caching predictions.
    pub(crate) fn bit_key(&self) -> Vec<u64> {
        self.values.iter().map(|v| v.to_bits()).collect()
    }
}

impl From<Vec<f64>> for Pattern {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<&[f64]> for Pattern {
    fn from(values: &[f64]) -> Self {
        Self::from_slice(values)
    }
}

impl Index<usize> for Pattern {
    type Output = f64;

    fn index(&self, index: usize) -> &Self::Output {
        &self.values[index]
    }
}
