//! Resonance search: rank categories by activation, then walk the ranking
//! until one passes the vigilance test.
//!
//! The activation scan is the only part that touches every category, so it
//! is the part that may run on a worker pool. Each category is scored
//! independently and results are collected in index order, which keeps the
//! parallel scan bit-identical to the sequential one.
//!
//! Ties in activation go to the lower category index (stable sort), so
//! repeated predictions on an unchanged store always agree.

use crate::config::ArtParams;
use crate::geometry::Geometry;
use crate::kernel::Kernel;
use crate::store::CategoryStore;
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{trace, warn};

/// Result of one resonance search.
#[derive(Clone, Debug, PartialEq)]
pub enum MatchOutcome<E> {
    /// Category `index` passed vigilance.
    Resonance {
        index: usize,
        activation: f64,
        match_score: f64,
        eval: E,
    },
    /// No category passed; `tested` candidates were checked.
    NoMatch { tested: usize },
}

impl<E> MatchOutcome<E> {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchOutcome::Resonance { .. })
    }

    pub fn index(&self) -> Option<usize> {
        match self {
            MatchOutcome::Resonance { index, .. } => Some(*index),
            MatchOutcome::NoMatch { .. } => None,
        }
    }
}

struct Candidate<E> {
    index: usize,
    activation: f64,
    eval: E,
}

/// Score every category, sequentially or on `pool` once the store reaches
/// `parallel_threshold`.
fn evaluate<G: Geometry>(
    input: &G::Input,
    store: &CategoryStore<G::Prototype>,
    params: &ArtParams<G::Shape>,
    kernel: Kernel,
    pool: Option<&ThreadPool>,
) -> Vec<Candidate<G::Eval>> {
    let score = |(index, category): (usize, &crate::store::Category<G::Prototype>)| {
        let (activation, eval) = G::activation(input, category.prototype(), params, kernel);
        Candidate {
            index,
            activation,
            eval,
        }
    };

    match pool {
        Some(pool) if store.len() >= params.perf.parallel_threshold => {
            trace!(
                categories = store.len(),
                threads = pool.current_num_threads(),
                "parallel activation scan"
            );
            pool.install(|| store.as_slice().par_iter().enumerate().map(score).collect())
        }
        _ => store.iter().enumerate().map(score).collect(),
    }
}

/// Find the best resonating category for a prepared input.
pub fn search<G: Geometry>(
    input: &G::Input,
    store: &CategoryStore<G::Prototype>,
    params: &ArtParams<G::Shape>,
    kernel: Kernel,
    pool: Option<&ThreadPool>,
) -> MatchOutcome<G::Eval> {
    if store.is_empty() {
        return MatchOutcome::NoMatch { tested: 0 };
    }

    let mut candidates = evaluate::<G>(input, store, params, kernel, pool);
    // Stable: equal activations keep ascending index order.
    candidates.sort_by(|a, b| b.activation.total_cmp(&a.activation));

    let limit = params
        .max_search_attempts
        .unwrap_or(candidates.len())
        .min(candidates.len());

    for (rank, candidate) in candidates.into_iter().take(limit).enumerate() {
        let category = match store.get(candidate.index) {
            Some(c) => c,
            None => continue,
        };
        let m = G::match_score(input, category.prototype(), &candidate.eval, params);
        if m + params.epsilon >= params.vigilance {
            trace!(
                geometry = G::NAME,
                category = candidate.index,
                rank,
                activation = candidate.activation,
                match_score = m,
                "resonance"
            );
            return MatchOutcome::Resonance {
                index: candidate.index,
                activation: candidate.activation,
                match_score: m,
                eval: candidate.eval,
            };
        }
        trace!(
            geometry = G::NAME,
            category = candidate.index,
            match_score = m,
            vigilance = params.vigilance,
            "reset: below vigilance"
        );
    }

    if limit < store.len() {
        warn!(
            geometry = G::NAME,
            attempts = limit,
            categories = store.len(),
            "search attempts exhausted before every category was tested"
        );
    }
    MatchOutcome::NoMatch { tested: limit }
}
