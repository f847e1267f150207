//! EllipsoidART geometry (Anagnostopoulos & Georgiopoulos, 2001).
//!
//! A category is a hyper-ellipsoid with centroid `c`, unit major axis `a`
//! and radius `R`; `μ` is the ratio of minor to major axis length. The
//! distance from `x` with `v = x − c` is
//!
//! `d = (1/μ) · sqrt(‖v‖² − (1 − μ²)(a·v)²)`
//!
//! so displacement along the major axis counts at full length and
//! displacement across it is stretched by `1/μ`. Until the category has
//! seen a second point there is no axis and `d = ‖v‖`.
//!
//! - choice: `T = (r̂ − R − max(R, d)) / (r̂ − 2R + α)`
//! - match:  `M = max(0, 1 − (R + max(R, d)) / r̂)`

use super::hypersphere::{grow_ball, resolve_r_hat, validate_r_hat};
use super::{require_finite, safe_div, Geometry};
use crate::config::ArtParams;
use crate::error::{ArtError, Result};
use crate::kernel::{Kernel, Pattern};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EllipsoidShape {
    /// Minor-to-major axis ratio in (0, 1]; 1.0 degenerates to a hypersphere.
    pub mu: f64,
    /// Maximum category size; `None` resolves to `sqrt(dimension)`.
    pub r_hat: Option<f64>,
}

impl Default for EllipsoidShape {
    fn default() -> Self {
        Self {
            mu: 0.5,
            r_hat: None,
        }
    }
}

/// Ellipsoid-shaped category.
#[derive(Clone, Debug, PartialEq)]
pub struct EllipsoidPrototype {
    centroid: Vec<f64>,
    /// All zeros until the first update fixes the orientation.
    major_axis: Vec<f64>,
    has_axis: bool,
    radius: f64,
}

impl EllipsoidPrototype {
    pub fn centroid(&self) -> &[f64] {
        &self.centroid
    }

    /// Unit major axis, or `None` while the category holds a single point.
    pub fn major_axis(&self) -> Option<&[f64]> {
        self.has_axis.then_some(self.major_axis.as_slice())
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

#[derive(Clone, Debug)]
pub struct EllipsoidInput {
    values: Vec<f64>,
    r_hat: f64,
}

fn distance(
    input: &EllipsoidInput,
    prototype: &EllipsoidPrototype,
    mu: f64,
    kernel: Kernel,
) -> f64 {
    let sq = kernel.sq_distance(&input.values, &prototype.centroid);
    if !prototype.has_axis {
        return sq.sqrt();
    }
    // a·v = a·x − a·c
    let proj = kernel.dot(&prototype.major_axis, &input.values)
        - kernel.dot(&prototype.major_axis, &prototype.centroid);
    let inner = (sq - (1.0 - mu * mu) * proj * proj).max(0.0);
    inner.sqrt() / mu
}

/// EllipsoidART geometry marker.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ellipsoid;

impl Geometry for Ellipsoid {
    type Shape = EllipsoidShape;
    type Prototype = EllipsoidPrototype;
    type Input = EllipsoidInput;
    /// Ellipsoidal distance `d`.
    type Eval = f64;

    const NAME: &'static str = "EllipsoidART";

    fn validate_shape(shape: &EllipsoidShape) -> Result<()> {
        if !(shape.mu > 0.0 && shape.mu <= 1.0) {
            return Err(ArtError::invalid_parameter(
                "shape.mu",
                format!("must be in (0, 1], got {}", shape.mu),
            ));
        }
        validate_r_hat(shape.r_hat)
    }

    fn prepare(
        pattern: &Pattern,
        params: &ArtParams<EllipsoidShape>,
        _kernel: Kernel,
    ) -> Result<EllipsoidInput> {
        require_finite(pattern)?;
        Ok(EllipsoidInput {
            values: pattern.values().to_vec(),
            r_hat: resolve_r_hat(params.shape.r_hat, pattern.dimensions()),
        })
    }

    fn activation(
        input: &EllipsoidInput,
        prototype: &EllipsoidPrototype,
        params: &ArtParams<EllipsoidShape>,
        kernel: Kernel,
    ) -> (f64, f64) {
        let dist = distance(input, prototype, params.shape.mu, kernel);
        let r = prototype.radius;
        let t = safe_div(
            input.r_hat - r - r.max(dist),
            input.r_hat - 2.0 * r + params.choice_alpha,
            params.epsilon,
            0.0,
        );
        (t, dist)
    }

    fn match_score(
        input: &EllipsoidInput,
        prototype: &EllipsoidPrototype,
        dist: &f64,
        _params: &ArtParams<EllipsoidShape>,
    ) -> f64 {
        let r = prototype.radius;
        (1.0 - (r + r.max(*dist)) / input.r_hat).max(0.0)
    }

    fn update(
        prototype: &mut EllipsoidPrototype,
        input: &EllipsoidInput,
        dist: &f64,
        params: &ArtParams<EllipsoidShape>,
        kernel: Kernel,
    ) {
        if !prototype.has_axis {
            let norm = kernel.sq_distance(&input.values, &prototype.centroid).sqrt();
            if norm > params.epsilon {
                for ((a, &x), &c) in prototype
                    .major_axis
                    .iter_mut()
                    .zip(input.values.iter())
                    .zip(prototype.centroid.iter())
                {
                    *a = (x - c) / norm;
                }
                prototype.has_axis = true;
            }
        }
        grow_ball(
            &mut prototype.centroid,
            &mut prototype.radius,
            &input.values,
            *dist,
            params.learning_rate,
            params.epsilon,
            kernel,
        );
    }

    fn new_prototype(
        input: &EllipsoidInput,
        _params: &ArtParams<EllipsoidShape>,
    ) -> EllipsoidPrototype {
        EllipsoidPrototype {
            centroid: input.values.clone(),
            major_axis: vec![0.0; input.values.len()],
            has_axis: false,
            radius: 0.0,
        }
    }

    fn prototype_len(prototype: &EllipsoidPrototype) -> usize {
        prototype.centroid.len() * 2 + 1
    }
}
