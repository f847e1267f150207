//! Single-layer ART engine.
//!
//! [`ArtEngine`] owns a [`CategoryStore`] and runs the shared
//! resonance loop for any [`Geometry`]:
//!
//! 1. validate the pattern and parameters (no side effects on failure)
//! 2. [`search`] the store for a category that passes vigilance
//! 3. `learn` updates the winner, or commits a new category on `NoMatch`
//! 4. fold timings and counters into the [`PerformanceStats`] snapshot
//!
//! # Example
//!
//! ```rust
//! use artmap::{ArtParams, FuzzyArt, FuzzyShape, Pattern};
//!
//! let params = ArtParams::new(FuzzyShape::default()).with_vigilance(0.8);
//! let mut art = FuzzyArt::vectorized();
//!
//! let a = art.learn(&Pattern::new(vec![0.1, 0.1]), &params).unwrap();
//! let b = art.learn(&Pattern::new(vec![0.9, 0.8]), &params).unwrap();
//! assert_ne!(a.category(), b.category());
//!
//! let hit = art.predict(&Pattern::new(vec![0.12, 0.1]), &params).unwrap();
//! assert_eq!(hit.category(), a.category());
//! assert_eq!(art.category_count(), 2);
//! ```

use crate::config::ArtParams;
use crate::error::{ArtError, Result};
use crate::geometry::{Ellipsoid, Fusion, Fuzzy, Geometry, Hypersphere};
use crate::kernel::{Kernel, Pattern};
use crate::search::{search, MatchOutcome};
use crate::stats::{OperationSample, PerformanceStats, SalienceSample};
use crate::store::{Category, CategoryStore};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::ThreadPool;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::time::Instant;
use tracing::{debug, info, warn};

pub type FuzzyArt = ArtEngine<Fuzzy>;
pub type HypersphereArt = ArtEngine<Hypersphere>;
pub type EllipsoidArt = ArtEngine<Ellipsoid>;
pub type FusionArt = ArtEngine<Fusion>;

/// Outcome of a `learn` or `predict` call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ActivationResult {
    /// The pattern resonated with (or, in `learn`, created) `category`.
    Success { category: usize, activation: f64 },
    /// No category passed vigilance (only returned by `predict`).
    NoMatch,
    /// `learn` needed a new category but the store is at `max_categories`.
    CapacityExhausted { limit: usize },
}

impl ActivationResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ActivationResult::Success { .. })
    }

    pub fn category(&self) -> Option<usize> {
        match self {
            ActivationResult::Success { category, .. } => Some(*category),
            _ => None,
        }
    }

    pub fn activation(&self) -> Option<f64> {
        match self {
            ActivationResult::Success { activation, .. } => Some(*activation),
            _ => None,
        }
    }
}

/// Batch training options for [`ArtEngine::fit`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FitOptions {
    /// Passes over the data, >= 1.
    pub epochs: usize,
    /// Shuffle presentation order each epoch with this seed (None = input order).
    pub shuffle_seed: Option<u64>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            epochs: 1,
            shuffle_seed: None,
        }
    }
}

/// Bounded prediction cache, valid for one parameter set and one store state.
struct PredictionCache<S> {
    params: Option<ArtParams<S>>,
    entries: HashMap<Vec<u64>, ActivationResult>,
}

impl<S: PartialEq + Clone> PredictionCache<S> {
    fn new() -> Self {
        Self {
            params: None,
            entries: HashMap::new(),
        }
    }

    fn get(&self, params: &ArtParams<S>, key: &[u64]) -> Option<ActivationResult> {
        match &self.params {
            Some(cached) if cached == params => self.entries.get(key).copied(),
            _ => None,
        }
    }

    fn insert(&mut self, params: &ArtParams<S>, key: Vec<u64>, result: ActivationResult) {
        if self.params.as_ref() != Some(params) {
            self.entries.clear();
            self.params = Some(params.clone());
        }
        if self.entries.len() >= params.perf.cache_size {
            self.entries.clear();
        }
        self.entries.insert(key, result);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Online ART clustering engine over geometry `G`.
///
/// Engines are independent units: two engines share no state and may run
/// on different threads. One engine needs `&mut self` for every call that
/// records statistics, so sharing it requires external synchronization.
pub struct ArtEngine<G: Geometry> {
    store: CategoryStore<G::Prototype>,
    vectorized: bool,
    stats: PerformanceStats,
    /// Categories chosen since the last stats reset.
    selected: Vec<bool>,
    selected_count: usize,
    /// Worker pool for the parallel scan, with its thread count.
    pool: Option<(usize, ThreadPool)>,
    cache: PredictionCache<G::Shape>,
    /// Shape the first category was committed under.
    layout: Option<G::Shape>,
    released: bool,
    _geometry: PhantomData<G>,
}

impl<G: Geometry> ArtEngine<G> {
    /// Engine on the scalar kernel path.
    pub fn new() -> Self {
        Self::build(false)
    }

    /// Engine on the lane-chunked kernel path.
    pub fn vectorized() -> Self {
        Self::build(true)
    }

    fn build(vectorized: bool) -> Self {
        Self {
            store: CategoryStore::new(),
            vectorized,
            stats: PerformanceStats::empty(),
            selected: Vec::new(),
            selected_count: 0,
            pool: None,
            cache: PredictionCache::new(),
            layout: None,
            released: false,
            _geometry: PhantomData,
        }
    }

    /// Fix the input dimension up front instead of on the first learn.
    ///
    /// Has no effect once categories exist.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        if self.store.is_empty() {
            self.store = CategoryStore::with_dimension(dimension);
        }
        self
    }

    // =========================================================================
    // Learning and prediction
    // =========================================================================

    /// Present one pattern: update the resonating category or commit a new one.
    pub fn learn(
        &mut self,
        pattern: &Pattern,
        params: &ArtParams<G::Shape>,
    ) -> Result<ActivationResult> {
        let start = Instant::now();
        let kernel = self.kernel(params);
        let input = self.validate(pattern, params, kernel)?;
        self.ensure_pool(params)?;

        let pool = self.pool.as_ref().map(|(_, p)| p);
        let outcome = search::<G>(&input, &self.store, params, kernel, pool);

        let (result, resonance) = match outcome {
            MatchOutcome::Resonance {
                index,
                activation,
                match_score,
                eval,
            } => {
                self.store
                    .update_with(index, |proto| G::update(proto, &input, &eval, params, kernel));
                (
                    ActivationResult::Success {
                        category: index,
                        activation,
                    },
                    Some((index, match_score)),
                )
            }
            MatchOutcome::NoMatch { tested } => match params.max_categories {
                Some(limit) if self.store.len() >= limit => {
                    warn!(
                        geometry = G::NAME,
                        limit,
                        tested,
                        "category limit reached; pattern not learned"
                    );
                    (ActivationResult::CapacityExhausted { limit }, None)
                }
                _ => {
                    let proto = G::new_prototype(&input, params);
                    let (activation, eval) = G::activation(&input, &proto, params, kernel);
                    let match_score = G::match_score(&input, &proto, &eval, params);
                    let slots = G::prototype_len(&proto);
                    let index = self.store.push(proto);
                    if self.layout.is_none() {
                        self.layout = Some(params.shape.clone());
                    }
                    self.store.pin_dimension(pattern.dimensions());
                    self.selected.push(false);
                    debug!(
                        geometry = G::NAME,
                        category = index,
                        slots,
                        tested,
                        categories = self.store.len(),
                        "new category committed"
                    );
                    (
                        ActivationResult::Success {
                            category: index,
                            activation,
                        },
                        Some((index, match_score)),
                    )
                }
            },
        };

        let salience = resonance.map(|(index, match_score)| {
            self.cache.clear();
            self.mark_selected(index);
            self.refresh_salience(index, match_score, params.salience_rate)
        });

        self.record(OperationSample {
            elapsed: start.elapsed(),
            simd: kernel.uses_lanes(pattern.dimensions()),
            sparse: G::is_sparse(&input),
            salience,
            category_utilization: self.utilization(),
            memory_efficiency: self.store.memory_efficiency(),
        });
        Ok(result)
    }

    /// Find the resonating category without touching the store.
    ///
    /// Repeated calls with the same pattern and parameters on an unchanged
    /// store return identical results.
    pub fn predict(
        &mut self,
        pattern: &Pattern,
        params: &ArtParams<G::Shape>,
    ) -> Result<ActivationResult> {
        let start = Instant::now();
        let kernel = self.kernel(params);
        let input = self.validate(pattern, params, kernel)?;

        let key = (params.perf.cache_size > 0).then(|| pattern.bit_key());
        if let Some(hit) = key.as_ref().and_then(|k| self.cache.get(params, k)) {
            self.record(OperationSample {
                elapsed: start.elapsed(),
                simd: false,
                sparse: false,
                salience: None,
                category_utilization: self.utilization(),
                memory_efficiency: self.store.memory_efficiency(),
            });
            return Ok(hit);
        }

        self.ensure_pool(params)?;
        let pool = self.pool.as_ref().map(|(_, p)| p);
        let result = match search::<G>(&input, &self.store, params, kernel, pool) {
            MatchOutcome::Resonance {
                index, activation, ..
            } => ActivationResult::Success {
                category: index,
                activation,
            },
            MatchOutcome::NoMatch { .. } => ActivationResult::NoMatch,
        };

        if let Some(key) = key {
            self.cache.insert(params, key, result);
        }
        self.record(OperationSample {
            elapsed: start.elapsed(),
            simd: kernel.uses_lanes(pattern.dimensions()),
            sparse: G::is_sparse(&input),
            salience: None,
            category_utilization: self.utilization(),
            memory_efficiency: self.store.memory_efficiency(),
        });
        Ok(result)
    }

    /// `learn` for callers holding optional inputs.
    ///
    /// An absent pattern is an [`ArtError::InvalidArgument`]; absent
    /// parameters are an [`ArtError::MissingConfiguration`].
    pub fn try_learn(
        &mut self,
        pattern: Option<&Pattern>,
        params: Option<&ArtParams<G::Shape>>,
    ) -> Result<ActivationResult> {
        let (pattern, params) = require_inputs(pattern, params)?;
        self.learn(pattern, params)
    }

    /// `predict` for callers holding optional inputs.
    pub fn try_predict(
        &mut self,
        pattern: Option<&Pattern>,
        params: Option<&ArtParams<G::Shape>>,
    ) -> Result<ActivationResult> {
        let (pattern, params) = require_inputs(pattern, params)?;
        self.predict(pattern, params)
    }

    /// Run every check `learn` would run, without learning or recording.
    pub fn check(&self, pattern: &Pattern, params: &ArtParams<G::Shape>) -> Result<()> {
        self.validate(pattern, params, self.kernel(params)).map(|_| ())
    }

    pub fn predict_batch(
        &mut self,
        patterns: &[Pattern],
        params: &ArtParams<G::Shape>,
    ) -> Result<Vec<ActivationResult>> {
        patterns.iter().map(|p| self.predict(p, params)).collect()
    }

    /// Train on a batch for `options.epochs` passes.
    ///
    /// Every pattern is validated before any learning happens, so a bad
    /// pattern anywhere in the batch leaves the store untouched. Returns the
    /// category each pattern landed in during the final epoch, in input order.
    pub fn fit(
        &mut self,
        patterns: &[Pattern],
        params: &ArtParams<G::Shape>,
        options: &FitOptions,
    ) -> Result<Vec<Option<usize>>> {
        if options.epochs == 0 {
            return Err(ArtError::invalid_parameter("epochs", "must be at least 1"));
        }
        let kernel = self.kernel(params);
        if let Some(first) = patterns.first() {
            for pattern in patterns {
                if pattern.dimensions() != first.dimensions() {
                    return Err(ArtError::DimensionMismatch {
                        expected: first.dimensions(),
                        got: pattern.dimensions(),
                    });
                }
                self.validate(pattern, params, kernel)?;
            }
        }

        let mut order: Vec<usize> = (0..patterns.len()).collect();
        let mut rng = options.shuffle_seed.map(ChaCha8Rng::seed_from_u64);
        let mut labels = vec![None; patterns.len()];

        for epoch in 0..options.epochs {
            if let Some(rng) = rng.as_mut() {
                order.shuffle(rng);
            }
            for &i in &order {
                labels[i] = self.learn(&patterns[i], params)?.category();
            }
            debug!(
                geometry = G::NAME,
                epoch,
                categories = self.store.len(),
                "fit epoch complete"
            );
        }
        Ok(labels)
    }

    // =========================================================================
    // Introspection
    // =========================================================================

    pub fn category_count(&self) -> usize {
        self.store.len()
    }

    pub fn categories(&self) -> &CategoryStore<G::Prototype> {
        &self.store
    }

    pub fn category(&self, index: usize) -> Option<&Category<G::Prototype>> {
        self.store.get(index)
    }

    /// Input dimension, once fixed.
    pub fn dimension(&self) -> Option<usize> {
        self.store.expected_dimension()
    }

    pub fn performance_stats(&self) -> PerformanceStats {
        self.stats.clone()
    }

    /// Clear statistics and selection tracking; learned categories are kept.
    pub fn reset_performance_tracking(&mut self) {
        self.stats = PerformanceStats::empty();
        self.selected.iter_mut().for_each(|s| *s = false);
        self.selected_count = 0;
    }

    pub fn is_vectorized(&self) -> bool {
        self.vectorized
    }

    /// Lane width of the kernel path: `F64_LANES` when vectorized, else 1.
    pub fn vector_species_length(&self) -> usize {
        Kernel::new(self.vectorized).lanes()
    }

    /// Entries currently held by the prediction cache.
    pub fn cached_predictions(&self) -> usize {
        self.cache.len()
    }

    // =========================================================================
    // Resource lifetime
    // =========================================================================

    /// Drop the worker pool and caches. Safe to call more than once.
    ///
    /// After release every `learn`/`predict` fails with [`ArtError::Released`];
    /// learned categories remain readable.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        self.pool = None;
        self.cache.clear();
        info!(
            geometry = G::NAME,
            categories = self.store.len(),
            "engine released"
        );
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn kernel(&self, params: &ArtParams<G::Shape>) -> Kernel {
        Kernel::new(self.vectorized && params.perf.enable_simd)
    }

    /// All checks that must pass before the store may change.
    fn validate(
        &self,
        pattern: &Pattern,
        params: &ArtParams<G::Shape>,
        kernel: Kernel,
    ) -> Result<G::Input> {
        if self.released {
            return Err(ArtError::Released);
        }
        params.validate::<G>()?;
        if let Some(committed) = &self.layout {
            if !G::layout_compatible(committed, &params.shape) {
                return Err(ArtError::invalid_parameter(
                    "shape",
                    "prototype layout differs from the one categories were committed under",
                ));
            }
        }
        if pattern.dimensions() == 0 {
            return Err(ArtError::InvalidArgument("pattern is empty".to_string()));
        }
        self.store.check_dimension(pattern)?;
        if let Some(expected) = G::required_dimension(&params.shape) {
            if expected != pattern.dimensions() {
                return Err(ArtError::DimensionMismatch {
                    expected,
                    got: pattern.dimensions(),
                });
            }
        }
        G::prepare(pattern, params, kernel)
    }

    /// Build (or rebuild) the scan pool once the store is large enough to use it.
    fn ensure_pool(&mut self, params: &ArtParams<G::Shape>) -> Result<()> {
        let threads = params.perf.parallelism_level;
        if threads <= 1 || self.store.len() < params.perf.parallel_threshold {
            return Ok(());
        }
        if matches!(&self.pool, Some((n, _)) if *n == threads) {
            return Ok(());
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("artmap-scan-{}", i))
            .build()
            .map_err(|e| ArtError::ThreadPool(e.to_string()))?;
        debug!(geometry = G::NAME, threads, "scan pool started");
        self.pool = Some((threads, pool));
        Ok(())
    }

    fn mark_selected(&mut self, index: usize) {
        if let Some(flag) = self.selected.get_mut(index) {
            if !*flag {
                *flag = true;
                self.selected_count += 1;
            }
        }
    }

    fn utilization(&self) -> f64 {
        if self.store.is_empty() {
            return 0.0;
        }
        self.selected_count as f64 / self.store.len() as f64
    }

    /// EMA of the match scores a category achieves when it wins.
    fn refresh_salience(&self, index: usize, match_score: f64, rate: f64) -> SalienceSample {
        let start = Instant::now();
        let score = match self.stats.salience(index) {
            Some(prev) => (1.0 - rate) * prev + rate * match_score,
            None => match_score,
        };
        SalienceSample {
            category: index,
            score,
            elapsed: start.elapsed(),
        }
    }

    fn record(&mut self, sample: OperationSample) {
        self.stats = std::mem::take(&mut self.stats).with_operation(&sample);
    }
}

fn require_inputs<'a, S>(
    pattern: Option<&'a Pattern>,
    params: Option<&'a ArtParams<S>>,
) -> Result<(&'a Pattern, &'a ArtParams<S>)> {
    let pattern =
        pattern.ok_or_else(|| ArtError::InvalidArgument("pattern must be provided".to_string()))?;
    let params = params
        .ok_or_else(|| ArtError::MissingConfiguration("parameters must be provided".to_string()))?;
    Ok((pattern, params))
}

impl<G: Geometry> Default for ArtEngine<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: Geometry> Drop for ArtEngine<G> {
    fn drop(&mut self) {
        self.release();
    }
}
