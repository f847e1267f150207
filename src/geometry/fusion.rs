//! FusionART geometry (Tan, Carpenter & Grossberg, 2007).
//!
//! A pattern is split into contiguous channels, one per sensory modality.
//! Each channel keeps its own fuzzy prototype, and the channel scores are
//! fused with the configured weights `γ`:
//!
//! - choice: `T = Σ γ_k · T_k`
//! - match:  `M = Σ γ_k · M_k / Σ γ_k`
//!
//! Both sums run over *active* channels only. A channel is skipped when it is
//! listed in `skip_channels`, or when `skip_missing_channels` is set and the
//! channel carries NaN/infinite values. Skipped channels are neither scored
//! nor updated, so a degraded modality cannot veto a match.

use super::fuzzy::{takes_sparse_path, FuzzyInput, FuzzyPrototype};
use super::Geometry;
use crate::config::ArtParams;
use crate::error::{ArtError, Result};
use crate::kernel::{Kernel, Pattern};
use serde::{Deserialize, Serialize};

/// One channel of a fused pattern.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSpec {
    /// Number of raw pattern dimensions in this channel.
    pub width: usize,
    /// Fusion weight `γ`, >= 0.
    pub weight: f64,
    #[serde(default = "default_true")]
    pub complement_coding: bool,
}

fn default_true() -> bool {
    true
}

impl ChannelSpec {
    pub fn new(width: usize, weight: f64) -> Self {
        Self {
            width,
            weight,
            complement_coding: true,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionShape {
    pub channels: Vec<ChannelSpec>,
    /// Channel indices excluded from scoring and learning.
    pub skip_channels: Vec<usize>,
    /// Treat channels with non-finite values as missing instead of failing.
    pub skip_missing_channels: bool,
}

impl FusionShape {
    /// Channels from parallel width and weight lists.
    pub fn new(widths: &[usize], weights: &[f64]) -> Self {
        Self {
            channels: widths
                .iter()
                .zip(weights.iter())
                .map(|(&w, &g)| ChannelSpec::new(w, g))
                .collect(),
            skip_channels: Vec::new(),
            skip_missing_channels: false,
        }
    }

    pub fn with_skip_channels(mut self, skip: Vec<usize>) -> Self {
        self.skip_channels = skip;
        self
    }

    pub fn with_skip_missing(mut self, enabled: bool) -> Self {
        self.skip_missing_channels = enabled;
        self
    }

    /// Total raw pattern dimension.
    pub fn dimension(&self) -> usize {
        self.channels.iter().map(|c| c.width).sum()
    }
}

/// One fuzzy prototype per channel.
#[derive(Clone, Debug, PartialEq)]
pub struct FusionPrototype {
    channels: Vec<FuzzyPrototype>,
}

impl FusionPrototype {
    pub fn channel(&self, k: usize) -> Option<&FuzzyPrototype> {
        self.channels.get(k)
    }

    pub fn channels(&self) -> &[FuzzyPrototype] {
        &self.channels
    }
}

/// Per-channel encoded inputs; `None` marks a skipped channel.
#[derive(Clone, Debug)]
pub struct FusionInput {
    channels: Vec<Option<FuzzyInput>>,
    kernel: Kernel,
}

impl FusionInput {
    pub fn active_channels(&self) -> usize {
        self.channels.iter().filter(|c| c.is_some()).count()
    }
}

/// FusionART geometry marker.
#[derive(Clone, Copy, Debug, Default)]
pub struct Fusion;

impl Geometry for Fusion {
    type Shape = FusionShape;
    type Prototype = FusionPrototype;
    type Input = FusionInput;
    /// Per-channel `|I_k ∧ w_k|` (0 for skipped channels).
    type Eval = Vec<f64>;

    const NAME: &'static str = "FusionART";

    fn validate_shape(shape: &FusionShape) -> Result<()> {
        if shape.channels.is_empty() {
            return Err(ArtError::invalid_parameter(
                "shape.channels",
                "at least one channel is required",
            ));
        }
        for (k, ch) in shape.channels.iter().enumerate() {
            if ch.width == 0 {
                return Err(ArtError::invalid_parameter(
                    "shape.channels",
                    format!("channel {} has zero width", k),
                ));
            }
            if !ch.weight.is_finite() || ch.weight < 0.0 {
                return Err(ArtError::invalid_parameter(
                    "shape.channels",
                    format!("channel {} weight must be finite and >= 0, got {}", k, ch.weight),
                ));
            }
        }
        if let Some(&bad) = shape.skip_channels.iter().find(|&&k| k >= shape.channels.len()) {
            return Err(ArtError::invalid_parameter(
                "shape.skip_channels",
                format!("channel {} does not exist", bad),
            ));
        }
        let active_weight: f64 = shape
            .channels
            .iter()
            .enumerate()
            .filter(|(k, _)| !shape.skip_channels.contains(k))
            .map(|(_, c)| c.weight)
            .sum();
        if active_weight <= 0.0 {
            return Err(ArtError::invalid_parameter(
                "shape.channels",
                "active channel weights must sum to > 0",
            ));
        }
        Ok(())
    }

    /// Channel widths and coding fix the prototype layout; weights and skips may change.
    fn layout_compatible(committed: &FusionShape, shape: &FusionShape) -> bool {
        committed.channels.len() == shape.channels.len()
            && committed
                .channels
                .iter()
                .zip(shape.channels.iter())
                .all(|(a, b)| a.width == b.width && a.complement_coding == b.complement_coding)
    }

    fn required_dimension(shape: &FusionShape) -> Option<usize> {
        Some(shape.dimension())
    }

    fn prepare(
        pattern: &Pattern,
        params: &ArtParams<FusionShape>,
        kernel: Kernel,
    ) -> Result<FusionInput> {
        let shape = &params.shape;
        let expected = shape.dimension();
        if pattern.dimensions() != expected {
            return Err(ArtError::DimensionMismatch {
                expected,
                got: pattern.dimensions(),
            });
        }

        let mut channels = Vec::with_capacity(shape.channels.len());
        let mut offset = 0;
        for (k, spec) in shape.channels.iter().enumerate() {
            let channel = pattern.slice(offset..offset + spec.width).ok_or_else(|| {
                ArtError::InvalidArgument(format!("channel {} runs past the pattern", k))
            })?;
            offset += spec.width;

            if shape.skip_channels.contains(&k) {
                channels.push(None);
                continue;
            }
            if !channel.is_finite() {
                if shape.skip_missing_channels {
                    channels.push(None);
                    continue;
                }
                return Err(ArtError::InvalidArgument(format!(
                    "channel {} contains non-finite values",
                    k
                )));
            }
            channels.push(Some(FuzzyInput::encode(
                channel.values(),
                spec.complement_coding,
                takes_sparse_path(&channel, params.perf.sparse_threshold, kernel),
                kernel,
            )));
        }

        let input = FusionInput { channels, kernel };
        let live_weight: f64 = input
            .channels
            .iter()
            .zip(shape.channels.iter())
            .filter(|(c, _)| c.is_some())
            .map(|(_, s)| s.weight)
            .sum();
        if live_weight <= 0.0 {
            return Err(ArtError::InvalidArgument(
                "every weighted channel is missing".to_string(),
            ));
        }
        Ok(input)
    }

    fn is_sparse(input: &FusionInput) -> bool {
        input.channels.iter().flatten().any(|c| c.is_sparse())
    }

    fn activation(
        input: &FusionInput,
        prototype: &FusionPrototype,
        params: &ArtParams<FusionShape>,
        kernel: Kernel,
    ) -> (f64, Vec<f64>) {
        let mut and_norms = vec![0.0; input.channels.len()];
        let mut t = 0.0;
        for (k, ((ch, proto), spec)) in input
            .channels
            .iter()
            .zip(prototype.channels.iter())
            .zip(params.shape.channels.iter())
            .enumerate()
        {
            if let Some(ch) = ch {
                let and_norm = ch.and_norm(proto.weights(), kernel);
                and_norms[k] = and_norm;
                t += spec.weight * ch.choice(and_norm, proto, params.choice_alpha, params.epsilon);
            }
        }
        (t, and_norms)
    }

    fn match_score(
        input: &FusionInput,
        _prototype: &FusionPrototype,
        and_norms: &Vec<f64>,
        params: &ArtParams<FusionShape>,
    ) -> f64 {
        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for ((ch, spec), &and_norm) in input
            .channels
            .iter()
            .zip(params.shape.channels.iter())
            .zip(and_norms.iter())
        {
            if let Some(ch) = ch {
                weighted += spec.weight * ch.resonance(and_norm, params.epsilon);
                total_weight += spec.weight;
            }
        }
        super::safe_div(weighted, total_weight, params.epsilon, 0.0)
    }

    fn update(
        prototype: &mut FusionPrototype,
        input: &FusionInput,
        _and_norms: &Vec<f64>,
        params: &ArtParams<FusionShape>,
        kernel: Kernel,
    ) {
        for (proto, ch) in prototype.channels.iter_mut().zip(input.channels.iter()) {
            if let Some(ch) = ch {
                proto.learn(ch, params.learning_rate, kernel);
            }
        }
    }

    fn new_prototype(input: &FusionInput, params: &ArtParams<FusionShape>) -> FusionPrototype {
        let channels = input
            .channels
            .iter()
            .zip(params.shape.channels.iter())
            .map(|(ch, spec)| match ch {
                Some(ch) => FuzzyPrototype::from_weights(
                    ch.encoded().to_vec(),
                    spec.complement_coding,
                    input.kernel,
                ),
                None => {
                    // Uncommitted weights: the first real observation carves them down.
                    let len = if spec.complement_coding {
                        spec.width * 2
                    } else {
                        spec.width
                    };
                    FuzzyPrototype::from_weights(
                        vec![1.0; len],
                        spec.complement_coding,
                        input.kernel,
                    )
                }
            })
            .collect();
        FusionPrototype { channels }
    }

    fn prototype_len(prototype: &FusionPrototype) -> usize {
        prototype.channels.iter().map(|c| c.weights().len()).sum()
    }
}
