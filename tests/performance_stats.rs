//! Performance statistics gathered from live engines.

use artmap::stats::{OperationSample, SalienceSample};
use artmap::{ArtParams, FuzzyArt, FuzzyShape, Pattern, PerformanceStats};
use std::time::Duration;

fn params() -> ArtParams<FuzzyShape> {
    ArtParams::new(FuzzyShape::default()).with_vigilance(0.9)
}

fn trained(points: &[[f64; 2]], vectorized: bool) -> FuzzyArt {
    let mut art = if vectorized { FuzzyArt::vectorized() } else { FuzzyArt::new() };
    for p in points {
        art.learn(&Pattern::new(p.to_vec()), &params()).unwrap();
    }
    art
}

#[test]
fn test_empty_snapshot() {
    let stats = PerformanceStats::empty();
    assert_eq!(stats.total_operations, 0);
    assert_eq!(stats.simd_operations, 0);
    assert_eq!(stats.statistics_update_count, 0);
    assert_eq!(stats.sparse_vector_operations, 0);
    assert!(stats.category_salience.is_empty());
    assert_eq!(stats.simd_utilization_ratio(), 0.0);
    assert_eq!(stats.salience_overhead_ratio(), 0.0);
    assert_eq!(stats.sparse_operation_ratio(), 0.0);
}

#[test]
fn test_merge_associative_on_engine_snapshots() {
    let a = trained(&[[0.1, 0.1], [0.9, 0.9]], false).performance_stats();
    let b = trained(&[[0.5, 0.5]], true).performance_stats();
    let c = trained(&[[0.2, 0.8], [0.8, 0.2], [0.2, 0.2]], true).performance_stats();

    let left = a.merge(&b).merge(&c);
    let right = a.merge(&b.merge(&c));
    assert_eq!(left.total_operations, 6);
    assert_eq!(left.total_operations, right.total_operations);
    assert_eq!(left.simd_operations, right.simd_operations);
    assert_eq!(left.statistics_update_count, right.statistics_update_count);
    assert_eq!(left.sparse_vector_operations, right.sparse_vector_operations);
    assert_eq!(
        left.category_salience.keys().collect::<Vec<_>>(),
        right.category_salience.keys().collect::<Vec<_>>()
    );
}

#[test]
fn test_weighted_fields_fall_between_inputs() {
    let slow = PerformanceStats::empty().with_operation(&OperationSample {
        elapsed: Duration::from_millis(8),
        simd: false,
        sparse: false,
        salience: None,
        category_utilization: 1.0,
        memory_efficiency: 1.0,
    });
    let fast = PerformanceStats::empty()
        .with_operation(&OperationSample {
            elapsed: Duration::from_millis(2),
            simd: true,
            sparse: false,
            salience: None,
            category_utilization: 0.5,
            memory_efficiency: 0.25,
        })
        .with_operation(&OperationSample {
            elapsed: Duration::from_millis(2),
            simd: true,
            sparse: false,
            salience: None,
            category_utilization: 0.5,
            memory_efficiency: 0.25,
        });

    let merged = slow.merge(&fast);
    assert_eq!(merged.total_operations, 3);
    assert!(merged.average_processing_time_ms > 2.0 && merged.average_processing_time_ms < 8.0);
    assert!((merged.average_processing_time_ms - 4.0).abs() < 1e-9);
    assert!((merged.average_category_utilization - 2.0 / 3.0).abs() < 1e-12);
    assert!((merged.memory_efficiency_ratio - 0.5).abs() < 1e-12);
    assert!((merged.simd_utilization_ratio() - 2.0 / 3.0).abs() < 1e-12);

    assert_eq!(
        slow.merge(&PerformanceStats::empty()).average_processing_time_ms,
        slow.average_processing_time_ms
    );
}

#[test]
fn test_salience_time_weighted_by_update_count() {
    let with_salience = |ms: u64, category: usize| OperationSample {
        elapsed: Duration::from_millis(10),
        simd: false,
        sparse: false,
        salience: Some(SalienceSample {
            category,
            score: 0.5,
            elapsed: Duration::from_millis(ms),
        }),
        category_utilization: 1.0,
        memory_efficiency: 1.0,
    };
    let a = PerformanceStats::empty().with_operation(&with_salience(3, 0));
    let b = PerformanceStats::empty()
        .with_operation(&with_salience(1, 1))
        .with_operation(&with_salience(1, 1))
        .with_operation(&with_salience(1, 1));

    let m = a.merge(&b);
    assert_eq!(m.statistics_update_count, 4);
    assert!((m.average_salience_computation_time_ms - 1.5).abs() < 1e-9);
    assert_eq!(m.category_salience.len(), 2);
}

#[test]
fn test_engine_counters() {
    let mut art = trained(&[[0.1, 0.1], [0.9, 0.9], [0.11, 0.1]], false);
    art.predict(&Pattern::new(vec![0.5, 0.5]), &params()).unwrap();

    let stats = art.performance_stats();
    assert_eq!(stats.total_operations, 4);
    assert_eq!(stats.statistics_update_count, 3);
    assert_eq!(stats.simd_operations, 0);
    assert_eq!(stats.category_salience.len(), 2);
    assert!(stats.average_processing_time_ms >= 0.0);
    assert!(stats.average_category_utilization > 0.0 && stats.average_category_utilization <= 1.0);
    assert!(stats.memory_efficiency_ratio > 0.0 && stats.memory_efficiency_ratio <= 1.0);
}

#[test]
fn test_reset_keeps_learned_categories() {
    let mut art = trained(&[[0.1, 0.1], [0.9, 0.9]], true);
    art.reset_performance_tracking();
    assert_eq!(art.performance_stats(), PerformanceStats::empty());
    assert_eq!(art.category_count(), 2);

    let r = art.predict(&Pattern::new(vec![0.1, 0.1]), &params()).unwrap();
    assert_eq!(r.category(), Some(0));
    assert_eq!(art.performance_stats().total_operations, 1);
}

#[test]
fn test_snapshot_json() {
    let stats = trained(&[[0.3, 0.7]], false).performance_stats();
    let json = stats.to_json().unwrap();
    let back: PerformanceStats = serde_json::from_str(&json).unwrap();
    assert_eq!(back.total_operations, stats.total_operations);
    assert_eq!(back.category_salience, stats.category_salience);
}
