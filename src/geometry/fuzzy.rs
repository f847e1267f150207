//! FuzzyART geometry (Carpenter, Grossberg & Rosen, 1991).
//!
//! Categories are hyper-rectangles stored as fuzzy weight vectors. With
//! complement coding the input `x` becomes `[x, 1 − x]`, so `|I|` is the
//! constant `d` and the weight vector encodes the box as
//! `[lower, 1 − upper]`.
//!
//! - choice: `T = |I ∧ w| / (α + |w|)`
//! - match:  `M = |I ∧ w| / |I|`
//! - update: `w ← β(I ∧ w) + (1 − β)w`
//!
//! Inputs are clamped into [0, 1]; the fuzzy AND is only meaningful on
//! non-negative data.

use super::{require_finite, safe_div, Geometry};
use crate::config::ArtParams;
use crate::error::Result;
use crate::kernel::{Kernel, Pattern};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuzzyShape {
    pub complement_coding: bool,
}

impl Default for FuzzyShape {
    fn default() -> Self {
        Self {
            complement_coding: true,
        }
    }
}

/// Fuzzy weight vector plus its cached L1 norm.
#[derive(Clone, Debug, PartialEq)]
pub struct FuzzyPrototype {
    weights: Vec<f64>,
    norm: f64,
    complement_coded: bool,
}

impl FuzzyPrototype {
    pub(crate) fn from_weights(weights: Vec<f64>, complement_coded: bool, kernel: Kernel) -> Self {
        let norm = kernel.sum(&weights);
        Self {
            weights,
            norm,
            complement_coded,
        }
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// `|w|`
    pub fn norm(&self) -> f64 {
        self.norm
    }

    /// The `(lower, upper)` corners of the category box.
    ///
    /// Only defined for complement-coded prototypes.
    pub fn bounding_box(&self) -> Option<(Vec<f64>, Vec<f64>)> {
        if !self.complement_coded {
            return None;
        }
        let d = self.weights.len() / 2;
        let lower = self.weights[..d].to_vec();
        let upper = self.weights[d..].iter().map(|&w| 1.0 - w).collect();
        Some((lower, upper))
    }

    pub(crate) fn learn(&mut self, input: &FuzzyInput, rate: f64, kernel: Kernel) {
        kernel.fuzzy_update(&mut self.weights, &input.encoded, rate);
        self.norm = kernel.sum(&self.weights);
    }
}

/// Encoded fuzzy input.
#[derive(Clone, Debug)]
pub struct FuzzyInput {
    encoded: Vec<f64>,
    norm: f64,
    /// Nonzero indices of the raw half, present only on the sparse path.
    nonzero: Option<Vec<usize>>,
    raw_len: usize,
    complement_coded: bool,
}

impl FuzzyInput {
    /// Encode raw values: clamp into [0, 1] and optionally complement code.
    ///
    /// With `sparse` set, the nonzero raw indices are collected for the
    /// sparse AND path.
    pub(crate) fn encode(
        values: &[f64],
        complement_coding: bool,
        sparse: bool,
        kernel: Kernel,
    ) -> Self {
        let raw_len = values.len();
        let mut encoded = Vec::with_capacity(if complement_coding { raw_len * 2 } else { raw_len });
        encoded.extend(values.iter().map(|v| v.clamp(0.0, 1.0)));
        if complement_coding {
            for i in 0..raw_len {
                let v = encoded[i];
                encoded.push(1.0 - v);
            }
        }

        let nonzero = (sparse && raw_len > 0)
            .then(|| (0..raw_len).filter(|&i| encoded[i] != 0.0).collect());

        let norm = kernel.sum(&encoded);
        Self {
            encoded,
            norm,
            nonzero,
            raw_len,
            complement_coded: complement_coding,
        }
    }

    pub(crate) fn encoded(&self) -> &[f64] {
        &self.encoded
    }

    pub(crate) fn is_sparse(&self) -> bool {
        self.nonzero.is_some()
    }

    /// `|I ∧ w|`, using the sparse path when one was selected.
    pub(crate) fn and_norm(&self, w: &[f64], kernel: Kernel) -> f64 {
        match &self.nonzero {
            Some(nz) => {
                let raw =
                    kernel.min_sum_sparse(nz, &self.encoded[..self.raw_len], &w[..self.raw_len]);
                if self.complement_coded {
                    raw + kernel.min_sum(&self.encoded[self.raw_len..], &w[self.raw_len..])
                } else {
                    raw
                }
            }
            None => kernel.min_sum(&self.encoded, w),
        }
    }

    /// `|I ∧ w| / (α + |w|)`
    pub(crate) fn choice(
        &self,
        and_norm: f64,
        proto: &FuzzyPrototype,
        alpha: f64,
        eps: f64,
    ) -> f64 {
        safe_div(and_norm, alpha + proto.norm, eps, 0.0)
    }

    /// `|I ∧ w| / |I|`; an all-zero input is covered by every category.
    pub(crate) fn resonance(&self, and_norm: f64, eps: f64) -> f64 {
        safe_div(and_norm, self.norm, eps, 1.0)
    }
}

/// The sparse AND path only pays off on the wide kernel.
pub(crate) fn takes_sparse_path(pattern: &Pattern, threshold: f64, kernel: Kernel) -> bool {
    kernel.is_vectorized() && pattern.sparsity() >= threshold
}

/// FuzzyART geometry marker.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fuzzy;

impl Geometry for Fuzzy {
    type Shape = FuzzyShape;
    type Prototype = FuzzyPrototype;
    type Input = FuzzyInput;
    /// `|I ∧ w|`
    type Eval = f64;

    const NAME: &'static str = "FuzzyART";

    fn validate_shape(_shape: &FuzzyShape) -> Result<()> {
        Ok(())
    }

    fn prepare(
        pattern: &Pattern,
        params: &ArtParams<FuzzyShape>,
        kernel: Kernel,
    ) -> Result<FuzzyInput> {
        require_finite(pattern)?;
        Ok(FuzzyInput::encode(
            pattern.values(),
            params.shape.complement_coding,
            takes_sparse_path(pattern, params.perf.sparse_threshold, kernel),
            kernel,
        ))
    }

    fn layout_compatible(committed: &FuzzyShape, shape: &FuzzyShape) -> bool {
        committed.complement_coding == shape.complement_coding
    }

    fn is_sparse(input: &FuzzyInput) -> bool {
        input.is_sparse()
    }

    fn activation(
        input: &FuzzyInput,
        prototype: &FuzzyPrototype,
        params: &ArtParams<FuzzyShape>,
        kernel: Kernel,
    ) -> (f64, f64) {
        let and_norm = input.and_norm(&prototype.weights, kernel);
        (
            input.choice(and_norm, prototype, params.choice_alpha, params.epsilon),
            and_norm,
        )
    }

    fn match_score(
        input: &FuzzyInput,
        _prototype: &FuzzyPrototype,
        and_norm: &f64,
        params: &ArtParams<FuzzyShape>,
    ) -> f64 {
        input.resonance(*and_norm, params.epsilon)
    }

    fn update(
        prototype: &mut FuzzyPrototype,
        input: &FuzzyInput,
        _and_norm: &f64,
        params: &ArtParams<FuzzyShape>,
        kernel: Kernel,
    ) {
        prototype.learn(input, params.learning_rate, kernel);
    }

    fn new_prototype(input: &FuzzyInput, _params: &ArtParams<FuzzyShape>) -> FuzzyPrototype {
        FuzzyPrototype {
            weights: input.encoded.clone(),
            norm: input.norm,
            complement_coded: input.complement_coded,
        }
    }

    fn prototype_len(prototype: &FuzzyPrototype) -> usize {
        prototype.weights.len()
    }
}
