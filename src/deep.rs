//! DeepARTMAP: a fixed pipeline of single-layer engines.
//!
//! Each layer owns its engine and parameters ([`BoundLayer`]) and sits
//! behind the object-safe [`Layer`] trait, so one pipeline can mix
//! geometries. A pattern is routed to every layer (the whole pattern, or
//! one contiguous slice per layer) and each layer runs its own resonance
//! search and update in order. Outputs only feed forward: layer `k`
//! records which layer `k + 1` category each of its categories co-occurred
//! with, and never looks back.
//!
//! ```rust
//! use artmap::deep::{BoundLayer, DeepArtMap, DeepParams};
//! use artmap::{ArtParams, FuzzyArt, FuzzyShape, Pattern};
//!
//! let coarse_params = ArtParams::new(FuzzyShape::default()).with_vigilance(0.5);
//! let fine_params = ArtParams::new(FuzzyShape::default()).with_vigilance(0.9);
//! let coarse = BoundLayer::new(FuzzyArt::new(), coarse_params).unwrap();
//! let fine = BoundLayer::new(FuzzyArt::new(), fine_params).unwrap();
//! let layers = vec![coarse.boxed(), fine.boxed()];
//! let mut deep = DeepArtMap::new(layers, DeepParams::default()).unwrap();
//!
//! let out = deep.learn(&Pattern::new(vec![0.2, 0.3])).unwrap();
//! assert_eq!(out.categories(), vec![Some(0), Some(0)]);
//! assert_eq!(deep.category_count(), 1);
//! ```

use crate::config::ArtParams;
use crate::engine::{ActivationResult, ArtEngine};
use crate::error::{ArtError, Result};
use crate::geometry::Geometry;
use crate::kernel::Pattern;
use crate::stats::PerformanceStats;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

/// One stage of a [`DeepArtMap`].
pub trait Layer: Send {
    /// Geometry name, for logs.
    fn name(&self) -> &'static str;

    /// All learn-time checks, without side effects.
    fn check(&self, pattern: &Pattern) -> Result<()>;

    fn learn(&mut self, pattern: &Pattern) -> Result<ActivationResult>;

    fn predict(&mut self, pattern: &Pattern) -> Result<ActivationResult>;

    fn category_count(&self) -> usize;

    fn performance_stats(&self) -> PerformanceStats;

    fn reset_performance_tracking(&mut self);

    fn release(&mut self);

    fn is_released(&self) -> bool;
}

/// An engine together with the parameters it always runs with.
pub struct BoundLayer<G: Geometry> {
    engine: ArtEngine<G>,
    params: ArtParams<G::Shape>,
}

impl<G: Geometry> BoundLayer<G> {
    /// Bind `params` to `engine`; invalid parameters are rejected here.
    pub fn new(engine: ArtEngine<G>, params: ArtParams<G::Shape>) -> Result<Self> {
        params.validate::<G>()?;
        Ok(Self { engine, params })
    }

    pub fn engine(&self) -> &ArtEngine<G> {
        &self.engine
    }

    pub fn params(&self) -> &ArtParams<G::Shape> {
        &self.params
    }

    pub fn boxed(self) -> Box<dyn Layer> {
        Box::new(self)
    }
}

impl<G: Geometry> Layer for BoundLayer<G> {
    fn name(&self) -> &'static str {
        G::NAME
    }

    fn check(&self, pattern: &Pattern) -> Result<()> {
        self.engine.check(pattern, &self.params)
    }

    fn learn(&mut self, pattern: &Pattern) -> Result<ActivationResult> {
        self.engine.learn(pattern, &self.params)
    }

    fn predict(&mut self, pattern: &Pattern) -> Result<ActivationResult> {
        self.engine.predict(pattern, &self.params)
    }

    fn category_count(&self) -> usize {
        self.engine.category_count()
    }

    fn performance_stats(&self) -> PerformanceStats {
        self.engine.performance_stats()
    }

    fn reset_performance_tracking(&mut self) {
        self.engine.reset_performance_tracking()
    }

    fn release(&mut self) {
        self.engine.release()
    }

    fn is_released(&self) -> bool {
        self.engine.is_released()
    }
}

/// How a pattern reaches each layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputRouting {
    /// Every layer sees the whole pattern.
    #[default]
    Shared,
    /// Layer `k` sees the `k`-th contiguous slice of the given widths.
    Split(Vec<usize>),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeepParams {
    #[serde(default)]
    pub routing: InputRouting,
}

impl DeepParams {
    pub fn split(widths: &[usize]) -> Self {
        Self {
            routing: InputRouting::Split(widths.to_vec()),
        }
    }
}

/// Joint assignment produced by one pass through the pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct DeepActivation {
    /// Per-layer results, bottom layer first.
    pub assignments: Vec<ActivationResult>,
}

impl DeepActivation {
    /// Category per layer (`None` where a layer did not resonate).
    pub fn categories(&self) -> Vec<Option<usize>> {
        self.assignments.iter().map(|a| a.category()).collect()
    }

    /// Category chosen by the top layer.
    pub fn top(&self) -> Option<usize> {
        self.assignments.last().and_then(|a| a.category())
    }

    /// Every layer produced a category.
    pub fn is_complete(&self) -> bool {
        self.assignments.iter().all(|a| a.is_success())
    }
}

/// Co-occurrence counts from one layer's categories to the next layer's.
type AssociationMap = BTreeMap<usize, BTreeMap<usize, u64>>;

/// Ordered pipeline of two or more layers.
pub struct DeepArtMap {
    layers: Vec<Box<dyn Layer>>,
    params: DeepParams,
    /// `associations[k]` links layer `k` categories to layer `k + 1`.
    associations: Vec<AssociationMap>,
}

impl DeepArtMap {
    pub fn new(layers: Vec<Box<dyn Layer>>, params: DeepParams) -> Result<Self> {
        if layers.len() < 2 {
            return Err(ArtError::InvalidArgument(format!(
                "DeepARTMAP needs at least 2 layers, got {}",
                layers.len()
            )));
        }
        if let InputRouting::Split(widths) = &params.routing {
            if widths.len() != layers.len() {
                return Err(ArtError::invalid_parameter(
                    "routing",
                    format!("{} widths for {} layers", widths.len(), layers.len()),
                ));
            }
            if widths.contains(&0) {
                return Err(ArtError::invalid_parameter("routing", "widths must be > 0"));
            }
        }
        let associations = vec![AssociationMap::new(); layers.len() - 1];
        Ok(Self {
            layers,
            params,
            associations,
        })
    }

    /// Route `pattern` to the layers and check every layer before any of them learns.
    fn prepare(&self, pattern: &Pattern) -> Result<Vec<Pattern>> {
        let inputs = match &self.params.routing {
            InputRouting::Shared => vec![pattern.clone(); self.layers.len()],
            InputRouting::Split(widths) => {
                let total: usize = widths.iter().sum();
                if pattern.dimensions() != total {
                    return Err(ArtError::DimensionMismatch {
                        expected: total,
                        got: pattern.dimensions(),
                    });
                }
                let mut offset = 0;
                let mut slices = Vec::with_capacity(widths.len());
                for &w in widths {
                    let slice = pattern.slice(offset..offset + w).ok_or_else(|| {
                        ArtError::InvalidArgument(format!(
                            "slice {}..{} out of range",
                            offset,
                            offset + w
                        ))
                    })?;
                    slices.push(slice);
                    offset += w;
                }
                slices
            }
        };
        for (layer, input) in self.layers.iter().zip(&inputs) {
            layer.check(input)?;
        }
        Ok(inputs)
    }

    /// Feed `pattern` through every layer, bottom first.
    ///
    /// Fails without touching any layer if any layer would reject its input.
    pub fn learn(&mut self, pattern: &Pattern) -> Result<DeepActivation> {
        let inputs = self.prepare(pattern)?;
        let mut assignments = Vec::with_capacity(self.layers.len());
        for (layer, input) in self.layers.iter_mut().zip(&inputs) {
            assignments.push(layer.learn(input)?);
        }

        for (k, pair) in assignments.windows(2).enumerate() {
            if let (Some(lower), Some(upper)) = (pair[0].category(), pair[1].category()) {
                *self.associations[k]
                    .entry(lower)
                    .or_default()
                    .entry(upper)
                    .or_insert(0) += 1;
            }
        }

        let activation = DeepActivation { assignments };
        debug!(
            layers = self.layers.len(),
            top = ?activation.top(),
            top_categories = self.category_count(),
            "deep learn"
        );
        Ok(activation)
    }

    /// Per-layer prediction; no layer changes.
    pub fn predict(&mut self, pattern: &Pattern) -> Result<DeepActivation> {
        let inputs = self.prepare(pattern)?;
        let assignments = self
            .layers
            .iter_mut()
            .zip(&inputs)
            .map(|(layer, input)| layer.predict(input))
            .collect::<Result<Vec<_>>>()?;
        Ok(DeepActivation { assignments })
    }

    pub fn try_learn(&mut self, pattern: Option<&Pattern>) -> Result<DeepActivation> {
        let pattern = pattern
            .ok_or_else(|| ArtError::InvalidArgument("pattern must be provided".to_string()))?;
        self.learn(pattern)
    }

    /// Number of categories in the top layer.
    pub fn category_count(&self) -> usize {
        self.layers.last().map_or(0, |l| l.category_count())
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_category_counts(&self) -> Vec<usize> {
        self.layers.iter().map(|l| l.category_count()).collect()
    }

    pub fn layer(&self, index: usize) -> Option<&dyn Layer> {
        self.layers.get(index).map(|l| l.as_ref())
    }

    /// Most frequent layer `layer + 1` category seen together with `category`
    /// of `layer`. Ties go to the lower index.
    pub fn association(&self, layer: usize, category: usize) -> Option<usize> {
        let targets = self.associations.get(layer)?.get(&category)?;
        targets
            .iter()
            .fold(None, |best: Option<(usize, u64)>, (&target, &count)| match best {
                Some((_, c)) if c >= count => best,
                _ => Some((target, count)),
            })
            .map(|(target, _)| target)
    }

    /// Every layer's snapshot merged into one.
    pub fn performance_stats(&self) -> PerformanceStats {
        self.layers
            .iter()
            .fold(PerformanceStats::empty(), |acc, l| acc.merge(&l.performance_stats()))
    }

    pub fn reset_performance_tracking(&mut self) {
        for layer in &mut self.layers {
            layer.reset_performance_tracking();
        }
    }

    /// Release every layer. Safe to call more than once.
    pub fn release(&mut self) {
        if self.is_released() {
            return;
        }
        for layer in &mut self.layers {
            layer.release();
        }
        info!(layers = self.layers.len(), "deep pipeline released");
    }

    pub fn is_released(&self) -> bool {
        self.layers.iter().all(|l| l.is_released())
    }
}
