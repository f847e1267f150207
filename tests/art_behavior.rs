//! Behavioral tests for the single-layer engines and the deep pipeline.

use artmap::{
    ActivationResult, ArtEngine, ArtError, ArtParams, BoundLayer, DeepArtMap, DeepParams,
    Ellipsoid, EllipsoidArt, EllipsoidShape, FitOptions, Fusion, FusionArt, FusionShape, Fuzzy,
    FuzzyArt, FuzzyShape, Geometry, Hypersphere, HypersphereArt, HypersphereShape, Pattern,
    F64_LANES,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

fn fuzzy(vigilance: f64) -> ArtParams<FuzzyShape> {
    ArtParams::new(FuzzyShape::default()).with_vigilance(vigilance)
}

fn collinear() -> Vec<Pattern> {
    (1..=6)
        .map(|i| {
            let v = i as f64 / 10.0;
            Pattern::new(vec![v, v])
        })
        .collect()
}

/// Five tight points around each of two centers, then five uniform points.
fn clustered(seed: u64) -> Vec<Pattern> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::new();
    for (cx, cy) in [(0.1, 0.1), (0.8, 0.9)] {
        for _ in 0..5 {
            data.push(Pattern::new(vec![
                cx + rng.gen_range(-0.02..0.02),
                cy + rng.gen_range(-0.02..0.02),
            ]));
        }
    }
    for _ in 0..5 {
        data.push(Pattern::new(vec![rng.gen::<f64>(), rng.gen::<f64>()]));
    }
    data
}

#[test]
fn test_vigilance_monotonicity() {
    for vectorized in [false, true] {
        let mk = || if vectorized { FuzzyArt::vectorized() } else { FuzzyArt::new() };

        let mut loose = mk();
        let mut strict = mk();
        for p in collinear() {
            loose.learn(&p, &fuzzy(0.3)).unwrap();
            strict.learn(&p, &fuzzy(0.95)).unwrap();
        }
        assert!(loose.category_count() <= 3, "loose: {}", loose.category_count());
        assert!(strict.category_count() >= 4, "strict: {}", strict.category_count());
        assert!(loose.category_count() <= strict.category_count());
    }
}

#[test]
fn test_cluster_separation_fuzzy() {
    for seed in [1, 7, 42] {
        let mut art = FuzzyArt::vectorized();
        for p in clustered(seed) {
            art.learn(&p, &fuzzy(0.8)).unwrap();
        }
        let n = art.category_count();
        assert!((2..=10).contains(&n), "seed {}: {} categories", seed, n);
    }
}

#[test]
fn test_cluster_separation_hypersphere() {
    let params = ArtParams::new(HypersphereShape::default()).with_vigilance(0.8);
    let mut art = HypersphereArt::new();
    for p in clustered(42) {
        art.learn(&p, &params).unwrap();
    }
    let n = art.category_count();
    assert!((2..=10).contains(&n), "{} categories", n);
}

#[test]
fn test_cluster_separation_ellipsoid() {
    let params = ArtParams::new(EllipsoidShape::default()).with_vigilance(0.8);
    let mut art = EllipsoidArt::vectorized();
    for p in clustered(42) {
        art.learn(&p, &params).unwrap();
    }
    let n = art.category_count();
    assert!((2..=10).contains(&n), "{} categories", n);
    assert!(art.category(0).unwrap().prototype().major_axis().is_some());
}

#[test]
fn test_category_count_never_decreases() {
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let mut art = FuzzyArt::new();
    let params = fuzzy(0.85);
    let mut last = 0;
    for _ in 0..200 {
        let p = Pattern::new((0..4).map(|_| rng.gen::<f64>()).collect());
        art.learn(&p, &params).unwrap();
        assert!(art.category_count() >= last);
        last = art.category_count();
    }
}

#[test]
fn test_predict_is_idempotent() {
    let params = fuzzy(0.8);
    let mut art = FuzzyArt::vectorized();
    for p in clustered(3) {
        art.learn(&p, &params).unwrap();
    }
    let stored = art.categories().len();
    for probe in clustered(4) {
        let first = art.predict(&probe, &params).unwrap();
        let second = art.predict(&probe, &params).unwrap();
        assert_eq!(first, second);
    }
    assert_eq!(art.categories().len(), stored);
}

/// Clusters, scattered points, and mostly-zero rows, `2 * F64_LANES` wide.
fn wide_mixed(seed: u64) -> Vec<Pattern> {
    let dims = 2 * F64_LANES;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut data = Vec::new();
    for center in [0.2, 0.8] {
        for _ in 0..4 {
            data.push(Pattern::new(
                (0..dims).map(|_| center + rng.gen_range(-0.02..0.02)).collect(),
            ));
        }
    }
    for _ in 0..4 {
        data.push(Pattern::new((0..dims).map(|_| rng.gen::<f64>()).collect()));
    }
    for k in 0..4 {
        let mut values = vec![0.0; dims];
        for v in values.iter_mut().skip(k * 3).take(3) {
            *v = 0.5 + rng.gen_range(0.0..0.4);
        }
        data.push(Pattern::new(values));
    }
    data
}

fn assert_paths_agree<G: Geometry>(shape: G::Shape, data: &[Pattern]) {
    let params = ArtParams::new(shape).with_vigilance(0.8);
    let mut scalar = ArtEngine::<G>::new();
    let mut wide = ArtEngine::<G>::vectorized();
    for (i, p) in data.iter().enumerate() {
        let a = scalar.learn(p, &params).unwrap();
        let b = wide.learn(p, &params).unwrap();
        assert_eq!(a.category(), b.category(), "{} diverged at pattern {}", G::NAME, i);
        if let (Some(x), Some(y)) = (a.activation(), b.activation()) {
            assert!((x - y).abs() < 1e-9, "{} activation {} vs {}", G::NAME, x, y);
        }
    }
    assert_eq!(scalar.category_count(), wide.category_count(), "{}", G::NAME);
    for p in data {
        let a = scalar.predict(p, &params).unwrap();
        let b = wide.predict(p, &params).unwrap();
        assert_eq!(a.category(), b.category(), "{} predict diverged", G::NAME);
    }
    assert!(wide.performance_stats().simd_operations > 0);
    assert_eq!(scalar.performance_stats().simd_operations, 0);
}

#[test]
fn test_scalar_and_vectorized_agree() {
    let data = wide_mixed(11);
    assert_paths_agree::<Fuzzy>(FuzzyShape::default(), &data);
    assert_paths_agree::<Hypersphere>(HypersphereShape::default(), &data);
    assert_paths_agree::<Ellipsoid>(EllipsoidShape::default(), &data);
    assert_paths_agree::<Fusion>(
        FusionShape::new(&[F64_LANES, F64_LANES], &[0.5, 0.5]),
        &data,
    );
}

#[test]
fn test_sparse_rows_take_sparse_path_only_when_vectorized() {
    let data = wide_mixed(12);
    let params = fuzzy(0.8);
    let mut scalar = FuzzyArt::new();
    let mut wide = FuzzyArt::vectorized();
    for p in &data {
        scalar.learn(p, &params).unwrap();
        wide.learn(p, &params).unwrap();
    }
    let sparse_rows = data.iter().filter(|p| p.sparsity() >= 0.5).count();
    assert_eq!(sparse_rows, 4);
    assert_eq!(wide.performance_stats().sparse_vector_operations, 4);
    assert_eq!(scalar.performance_stats().sparse_vector_operations, 0);
}

#[test]
fn test_missing_pattern_and_missing_config_are_distinct() {
    let mut art = FuzzyArt::new();
    let params = fuzzy(0.5);
    let pattern = Pattern::new(vec![0.4, 0.6]);

    let a = art.try_learn(None, Some(&params)).unwrap_err();
    let b = art.try_learn(Some(&pattern), None).unwrap_err();
    assert!(a.is_invalid_argument());
    assert!(matches!(b, ArtError::MissingConfiguration(_)));
    assert!(!b.is_invalid_argument());
    assert_eq!(art.category_count(), 0);
}

#[test]
fn test_fusion_weighted_channel_dominance() {
    let shape = FusionShape::new(&[4, 4, 4], &[0.6, 0.3, 0.1]);
    let params = ArtParams::new(shape).with_vigilance(0.7);
    let mut art = FusionArt::vectorized();

    let mut base = vec![0.2, 0.3, 0.4, 0.5];
    base.extend([0.2; 8]);
    let learned = art.learn(&Pattern::new(base), &params).unwrap();

    // Close on the heavy channel, far on the light ones.
    let mut close_heavy = vec![0.21, 0.3, 0.4, 0.51];
    close_heavy.extend([0.8; 8]);
    let hit = art.predict(&Pattern::new(close_heavy), &params).unwrap();
    assert_eq!(hit.category(), learned.category());

    // Far on the heavy channel, exact on the light ones.
    let mut far_heavy = vec![0.8, 0.9, 0.9, 0.9];
    far_heavy.extend([0.2; 8]);
    let miss = art.predict(&Pattern::new(far_heavy), &params).unwrap();
    assert_eq!(miss, ActivationResult::NoMatch);
}

#[test]
fn test_fusion_skips_missing_channel() {
    let shape = FusionShape::new(&[2, 2, 2], &[0.5, 0.3, 0.2]).with_skip_missing(true);
    let params = ArtParams::new(shape).with_vigilance(0.8);
    let mut art = FusionArt::new();

    art.learn(&Pattern::new(vec![0.1, 0.2, 0.5, 0.5, 0.9, 0.9]), &params).unwrap();
    let degraded = Pattern::new(vec![0.1, 0.2, 0.5, 0.5, f64::NAN, f64::NAN]);
    let r = art.learn(&degraded, &params).unwrap();
    assert_eq!(r.category(), Some(0));
    assert_eq!(art.category_count(), 1);

    let strict = ArtParams::new(FusionShape::new(&[2, 2, 2], &[0.5, 0.3, 0.2]));
    assert!(art.learn(&degraded, &strict).unwrap_err().is_invalid_argument());
}

#[test]
fn test_fusion_skip_channels_by_index() {
    let shape = FusionShape::new(&[2, 2], &[0.5, 0.5]).with_skip_channels(vec![1]);
    let params = ArtParams::new(shape).with_vigilance(0.9);
    let mut art = FusionArt::new();

    art.learn(&Pattern::new(vec![0.3, 0.3, 0.0, 0.0]), &params).unwrap();
    let r = art.learn(&Pattern::new(vec![0.3, 0.3, 1.0, 1.0]), &params).unwrap();
    assert_eq!(r.category(), Some(0));
    // skipped channel keeps its uncommitted weights
    let proto = art.category(0).unwrap().prototype();
    assert!(proto.channel(1).unwrap().weights().iter().all(|&w| w == 1.0));
}

#[test]
fn test_fit_epochs_stabilise_labels() {
    let data = clustered(5);
    let params = fuzzy(0.8);
    let mut art = FuzzyArt::new();
    let opts = FitOptions {
        epochs: 3,
        shuffle_seed: Some(17),
    };
    let labels = art.fit(&data, &params, &opts).unwrap();
    assert_eq!(labels.len(), data.len());

    // After training, every sample predicts into some category.
    for p in &data {
        assert!(art.predict(p, &params).unwrap().is_success());
    }
}

#[test]
fn test_deep_pipeline_reports_top_layer() {
    let lower = BoundLayer::new(FuzzyArt::vectorized(), fuzzy(0.6)).unwrap();
    let upper = BoundLayer::new(
        HypersphereArt::vectorized(),
        ArtParams::new(HypersphereShape::default()).with_vigilance(0.9),
    )
    .unwrap();
    let mut deep =
        DeepArtMap::new(vec![lower.boxed(), upper.boxed()], DeepParams::default()).unwrap();

    let mut last = 0;
    for p in clustered(21) {
        let out = deep.learn(&p).unwrap();
        assert_eq!(out.assignments.len(), 2);
        assert!(deep.category_count() >= last);
        last = deep.category_count();
    }
    assert_eq!(deep.category_count(), deep.layer_category_counts()[1]);

    let probe = Pattern::new(vec![0.1, 0.1]);
    assert_eq!(deep.predict(&probe).unwrap(), deep.predict(&probe).unwrap());
}

#[test]
fn test_capacity_limit_stops_growth() {
    let params = fuzzy(0.99).with_max_categories(3);
    let mut art = FuzzyArt::new();
    let mut exhausted = 0;
    for p in clustered(8) {
        if let ActivationResult::CapacityExhausted { limit } = art.learn(&p, &params).unwrap() {
            assert_eq!(limit, 3);
            exhausted += 1;
        }
    }
    assert_eq!(art.category_count(), 3);
    assert!(exhausted > 0);
}
