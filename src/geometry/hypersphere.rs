//! HypersphereART geometry (Anagnostopoulos & Georgiopoulos, 2000).
//!
//! A category is a ball `(c, R)`. With `d = ‖x − c‖` and `r̂` the largest
//! radius a category may reach:
//!
//! - choice: `T = (r̂ − max(R, d)) / (r̂ − R + α)`
//! - match:  `M = max(0, 1 − max(R, d) / r̂)`
//! - update: `R ← R + β/2 · (max(R, d) − R)`,
//!   `c ← c + β/2 · (x − c) · (1 − min(R, d) / d)`
//!
//! `r_hat` defaults to `sqrt(dimension)`, the diameter of the unit cube.

use super::{require_finite, safe_div, Geometry};
use crate::config::ArtParams;
use crate::error::{ArtError, Result};
use crate::kernel::{Kernel, Pattern};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HypersphereShape {
    /// Maximum category radius; `None` resolves to `sqrt(dimension)`.
    pub r_hat: Option<f64>,
}

pub(crate) fn validate_r_hat(r_hat: Option<f64>) -> Result<()> {
    match r_hat {
        Some(r) if !r.is_finite() || r <= 0.0 => Err(ArtError::invalid_parameter(
            "shape.r_hat",
            format!("must be finite and > 0, got {}", r),
        )),
        _ => Ok(()),
    }
}

pub(crate) fn resolve_r_hat(r_hat: Option<f64>, dimension: usize) -> f64 {
    r_hat.unwrap_or_else(|| (dimension.max(1) as f64).sqrt())
}

/// Ball-shaped category.
#[derive(Clone, Debug, PartialEq)]
pub struct SpherePrototype {
    centroid: Vec<f64>,
    radius: f64,
}

impl SpherePrototype {
    pub fn centroid(&self) -> &[f64] {
        &self.centroid
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

/// Input with its resolved `r̂`.
#[derive(Clone, Debug)]
pub struct SphereInput {
    values: Vec<f64>,
    r_hat: f64,
}

/// Shared ball update: grow the radius toward `d` and pull the centroid so
/// the far side of the ball stays put.
pub(crate) fn grow_ball(
    centroid: &mut [f64],
    radius: &mut f64,
    x: &[f64],
    dist: f64,
    rate: f64,
    eps: f64,
    kernel: Kernel,
) {
    let half = rate / 2.0;
    let old = *radius;
    if dist > eps {
        let pull = half * (1.0 - old.min(dist) / dist);
        kernel.move_toward(centroid, x, pull);
    }
    *radius = old + half * (old.max(dist) - old);
}

/// HypersphereART geometry marker.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hypersphere;

impl Geometry for Hypersphere {
    type Shape = HypersphereShape;
    type Prototype = SpherePrototype;
    type Input = SphereInput;
    /// `d = ‖x − c‖`
    type Eval = f64;

    const NAME: &'static str = "HypersphereART";

    fn validate_shape(shape: &HypersphereShape) -> Result<()> {
        validate_r_hat(shape.r_hat)
    }

    fn prepare(
        pattern: &Pattern,
        params: &ArtParams<HypersphereShape>,
        _kernel: Kernel,
    ) -> Result<SphereInput> {
        require_finite(pattern)?;
        Ok(SphereInput {
            values: pattern.values().to_vec(),
            r_hat: resolve_r_hat(params.shape.r_hat, pattern.dimensions()),
        })
    }

    fn activation(
        input: &SphereInput,
        prototype: &SpherePrototype,
        params: &ArtParams<HypersphereShape>,
        kernel: Kernel,
    ) -> (f64, f64) {
        let dist = kernel.sq_distance(&input.values, &prototype.centroid).sqrt();
        let r = prototype.radius;
        let t = safe_div(
            input.r_hat - r.max(dist),
            input.r_hat - r + params.choice_alpha,
            params.epsilon,
            0.0,
        );
        (t, dist)
    }

    fn match_score(
        input: &SphereInput,
        prototype: &SpherePrototype,
        dist: &f64,
        _params: &ArtParams<HypersphereShape>,
    ) -> f64 {
        (1.0 - prototype.radius.max(*dist) / input.r_hat).max(0.0)
    }

    fn update(
        prototype: &mut SpherePrototype,
        input: &SphereInput,
        dist: &f64,
        params: &ArtParams<HypersphereShape>,
        kernel: Kernel,
    ) {
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
        input: &SphereInput,
        _params: &ArtParams<HypersphereShape>,
    ) -> SpherePrototype {
        SpherePrototype {
            centroid: input.values.clone(),
            radius: 0.0,
        }
    }

    fn prototype_len(prototype: &SpherePrototype) -> usize {
        prototype.centroid.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ArtParams<HypersphereShape> {
        ArtParams::new(HypersphereShape { r_hat: Some(1.0) })
    }

    #[test]
    fn test_default_r_hat() {
        let params = ArtParams::new(HypersphereShape::default());
        let input =
            Hypersphere::prepare(&Pattern::filled(4, 0.5), &params, Kernel::SCALAR).unwrap();
        assert!((input.r_hat - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_match_decreases_with_distance() {
        let params = params();
        let k = Kernel::SCALAR;
        let seed = Hypersphere::prepare(&Pattern::new(vec![0.0, 0.0]), &params, k).unwrap();
        let proto = Hypersphere::new_prototype(&seed, &params);

        let near = Hypersphere::prepare(&Pattern::new(vec![0.1, 0.0]), &params, k).unwrap();
        let far = Hypersphere::prepare(&Pattern::new(vec![0.6, 0.0]), &params, k).unwrap();
        let (_, dn) = Hypersphere::activation(&near, &proto, &params, k);
        let (_, df) = Hypersphere::activation(&far, &proto, &params, k);

        let mn = Hypersphere::match_score(&near, &proto, &dn, &params);
        let mf = Hypersphere::match_score(&far, &proto, &df, &params);
        assert!((mn - 0.9).abs() < 1e-12);
        assert!((mf - 0.4).abs() < 1e-12);
    }

    #[test]
    fn test_match_floors_at_zero() {
        let params = params();
        let k = Kernel::SCALAR;
        let seed = Hypersphere::prepare(&Pattern::new(vec![0.0, 0.0]), &params, k).unwrap();
        let proto = Hypersphere::new_prototype(&seed, &params);
        let far = Hypersphere::prepare(&Pattern::new(vec![5.0, 5.0]), &params, k).unwrap();
        let (_, d) = Hypersphere::activation(&far, &proto, &params, k);
        assert_eq!(Hypersphere::match_score(&far, &proto, &d, &params), 0.0);
    }

    #[test]
    fn test_fast_learning_encloses_both_points() {
        let params = params();
        let k = Kernel::SCALAR;
        let seed = Hypersphere::prepare(&Pattern::new(vec![0.0, 0.0]), &params, k).unwrap();
        let mut proto = Hypersphere::new_prototype(&seed, &params);
        let x = Hypersphere::prepare(&Pattern::new(vec![0.4, 0.0]), &params, k).unwrap();
        let (_, d) = Hypersphere::activation(&x, &proto, &params, k);
        Hypersphere::update(&mut proto, &x, &d, &params, k);

        // β = 1: radius = d/2, centroid at the midpoint
        assert!((proto.radius() - 0.2).abs() < 1e-12);
        assert!((proto.centroid()[0] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_r_hat() {
        assert!(Hypersphere::validate_shape(&HypersphereShape { r_hat: Some(0.0) }).is_err());
        assert!(Hypersphere::validate_shape(&HypersphereShape { r_hat: Some(f64::NAN) }).is_err());
        assert!(Hypersphere::validate_shape(&HypersphereShape { r_hat: None }).is_ok());
    }
}
