//! Performance statistics: per-engine counters that can be merged across shards.
//!
//! A [`PerformanceStats`] value is a snapshot. Engines fold one
//! [`OperationSample`] into it after every `learn`/`predict`, and snapshots
//! from independent engines combine with [`PerformanceStats::merge`]:
//!
//! - counters are summed, so merge is associative on them
//! - time/ratio averages are weighted by the number of observations behind them
//! - salience maps are unioned; colliding keys take the arithmetic mean
//!
//! ```rust
//! use artmap::stats::PerformanceStats;
//!
//! let a = PerformanceStats {
//!     total_operations: 10,
//!     simd_operations: 5,
//!     ..PerformanceStats::empty()
//! };
//! let b = PerformanceStats { total_operations: 30, ..PerformanceStats::empty() };
//! let merged = a.merge(&b);
//! assert_eq!(merged.total_operations, 40);
//! assert_eq!(merged.simd_utilization_ratio(), 0.125);
//! ```

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Salience refresh performed during a learn.
#[derive(Clone, Debug, PartialEq)]
pub struct SalienceSample {
    pub category: usize,
    pub score: f64,
    pub elapsed: Duration,
}

/// Everything measured for one learn/predict call.
#[derive(Clone, Debug, PartialEq)]
pub struct OperationSample {
    pub elapsed: Duration,
    /// The wide kernel path handled this input.
    pub simd: bool,
    /// The sparse kernel path handled this input.
    pub sparse: bool,
    pub salience: Option<SalienceSample>,
    /// Fraction of categories selected since the last reset.
    pub category_utilization: f64,
    /// Used over allocated category slots.
    pub memory_efficiency: f64,
}

/// Aggregate performance snapshot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    pub total_operations: u64,
    pub simd_operations: u64,
    pub average_processing_time_ms: f64,
    /// Averaged over `statistics_update_count`, not `total_operations`.
    pub average_salience_computation_time_ms: f64,
    pub statistics_update_count: u64,
    pub average_category_utilization: f64,
    pub category_salience: BTreeMap<usize, f64>,
    pub sparse_vector_operations: u64,
    pub memory_efficiency_ratio: f64,
}

impl PerformanceStats {
    /// All counters zero, no salience scores.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Fold one operation into the snapshot.
    pub fn with_operation(mut self, sample: &OperationSample) -> Self {
        self.total_operations += 1;
        let n = self.total_operations as f64;
        if sample.simd {
            self.simd_operations += 1;
        }
        if sample.sparse {
            self.sparse_vector_operations += 1;
        }
        self.average_processing_time_ms = running_mean(
            self.average_processing_time_ms,
            as_millis(sample.elapsed),
            n,
        );
        self.average_category_utilization = running_mean(
            self.average_category_utilization,
            sample.category_utilization,
            n,
        );
        self.memory_efficiency_ratio =
            running_mean(self.memory_efficiency_ratio, sample.memory_efficiency, n);

        if let Some(salience) = &sample.salience {
            self.statistics_update_count += 1;
            self.average_salience_computation_time_ms = running_mean(
                self.average_salience_computation_time_ms,
                as_millis(salience.elapsed),
                self.statistics_update_count as f64,
            );
            self.category_salience.insert(salience.category, salience.score);
        }
        self
    }

    /// Combine two snapshots from independent engines.
    pub fn merge(&self, other: &PerformanceStats) -> PerformanceStats {
        let wa = self.total_operations as f64;
        let wb = other.total_operations as f64;
        let sa = self.statistics_update_count as f64;
        let sb = other.statistics_update_count as f64;

        let mut category_salience = self.category_salience.clone();
        for (&category, &score) in &other.category_salience {
            category_salience
                .entry(category)
                .and_modify(|existing| *existing = (*existing + score) / 2.0)
                .or_insert(score);
        }

        PerformanceStats {
            total_operations: self.total_operations + other.total_operations,
            simd_operations: self.simd_operations + other.simd_operations,
            average_processing_time_ms: weighted_mean(
                self.average_processing_time_ms,
                wa,
                other.average_processing_time_ms,
                wb,
            ),
            average_salience_computation_time_ms: weighted_mean(
                self.average_salience_computation_time_ms,
                sa,
                other.average_salience_computation_time_ms,
                sb,
            ),
            statistics_update_count: self.statistics_update_count + other.statistics_update_count,
            average_category_utilization: weighted_mean(
                self.average_category_utilization,
                wa,
                other.average_category_utilization,
                wb,
            ),
            category_salience,
            sparse_vector_operations: self.sparse_vector_operations
                + other.sparse_vector_operations,
            memory_efficiency_ratio: weighted_mean(
                self.memory_efficiency_ratio,
                wa,
                other.memory_efficiency_ratio,
                wb,
            ),
        }
    }

    /// `simd_operations / total_operations` (0 when no operations).
    pub fn simd_utilization_ratio(&self) -> f64 {
        ratio(self.simd_operations as f64, self.total_operations as f64)
    }

    /// Salience time over processing time (0 when no processing time).
    pub fn salience_overhead_ratio(&self) -> f64 {
        ratio(
            self.average_salience_computation_time_ms,
            self.average_processing_time_ms,
        )
    }

    /// `sparse_vector_operations / total_operations` (0 when no operations).
    pub fn sparse_operation_ratio(&self) -> f64 {
        ratio(
            self.sparse_vector_operations as f64,
            self.total_operations as f64,
        )
    }

    pub fn salience(&self, category: usize) -> Option<f64> {
        self.category_salience.get(&category).copied()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[inline]
fn as_millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1_000.0
}

#[inline]
fn running_mean(mean: f64, x: f64, n: f64) -> f64 {
    mean + (x - mean) / n
}

#[inline]
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

fn weighted_mean(a: f64, wa: f64, b: f64, wb: f64) -> f64 {
    let total = wa + wb;
    if total == 0.0 {
        return 0.0;
    }
    (a * wa + b * wb) / total
}
