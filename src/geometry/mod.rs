//! Category geometries.
//!
//! Every ART variant shares the same search/match/update skeleton and only
//! differs in how a category is shaped. A [`Geometry`] supplies the four
//! pieces the skeleton needs:
//!
//! - `activation`: choice score used to rank categories
//! - `match_score`: how well the category covers the input, tested against vigilance
//! - `update`: move the winning prototype toward the input
//! - `new_prototype`: commit a fresh category from the input
//!
//! | Geometry | Prototype | Variant |
//! |----------|-----------|---------|
//! | [`Fuzzy`] | hyper-rectangle (fuzzy weights) | FuzzyART |
//! | [`Hypersphere`] | centroid + radius | HypersphereART |
//! | [`Ellipsoid`] | centroid + major axis + radius | EllipsoidART |
//! | [`Fusion`] | one fuzzy prototype per channel | FusionART |

pub mod ellipsoid;
pub mod fusion;
pub mod fuzzy;
pub mod hypersphere;

pub use ellipsoid::{Ellipsoid, EllipsoidPrototype, EllipsoidShape};
pub use fusion::{ChannelSpec, Fusion, FusionPrototype, FusionShape};
pub use fuzzy::{Fuzzy, FuzzyPrototype, FuzzyShape};
pub use hypersphere::{Hypersphere, HypersphereShape, SpherePrototype};

use crate::config::ArtParams;
use crate::error::{ArtError, Result};
use crate::kernel::{Kernel, Pattern};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

/// Category shape strategy plugged into [`ArtEngine`](crate::engine::ArtEngine).
///
/// All methods are associated functions: a geometry carries no state of its
/// own. Per-call configuration arrives through `params.shape`.
pub trait Geometry: Send + Sync + 'static {
    /// Geometry-specific hyperparameters.
    type Shape: Clone + Debug + PartialEq + Default + Serialize + DeserializeOwned + Send + Sync;
    /// Learned representation of one category.
    type Prototype: Clone + Debug + Send + Sync;
    /// Input after validation and encoding (complement coding, channel split).
    type Input: Send + Sync;
    /// Intermediate values from `activation` reused by `match_score` and `update`.
    type Eval: Clone + Debug + Send + Sync;

    /// Human-readable variant name, used in logs.
    const NAME: &'static str;

    /// Reject out-of-range shape parameters.
    fn validate_shape(shape: &Self::Shape) -> Result<()>;

    /// Input dimension fixed by the shape itself, if any.
    fn required_dimension(_shape: &Self::Shape) -> Option<usize> {
        None
    }

    /// Whether prototypes committed under `committed` can still be scored
    /// under `shape`. Shapes that change prototype lengths must say no.
    fn layout_compatible(_committed: &Self::Shape, _shape: &Self::Shape) -> bool {
        true
    }

    /// Validate values and encode the pattern for this geometry.
    fn prepare(
        pattern: &Pattern,
        params: &ArtParams<Self::Shape>,
        kernel: Kernel,
    ) -> Result<Self::Input>;

    /// Whether the prepared input took the sparse path.
    fn is_sparse(_input: &Self::Input) -> bool {
        false
    }

    fn activation(
        input: &Self::Input,
        prototype: &Self::Prototype,
        params: &ArtParams<Self::Shape>,
        kernel: Kernel,
    ) -> (f64, Self::Eval);

    fn match_score(
        input: &Self::Input,
        prototype: &Self::Prototype,
        eval: &Self::Eval,
        params: &ArtParams<Self::Shape>,
    ) -> f64;

    fn update(
        prototype: &mut Self::Prototype,
        input: &Self::Input,
        eval: &Self::Eval,
        params: &ArtParams<Self::Shape>,
        kernel: Kernel,
    );

    fn new_prototype(input: &Self::Input, params: &ArtParams<Self::Shape>) -> Self::Prototype;

    /// Number of f64 slots the prototype occupies.
    fn prototype_len(prototype: &Self::Prototype) -> usize;
}

/// Shared finiteness check for geometries that accept any real value.
pub(crate) fn require_finite(pattern: &Pattern) -> Result<()> {
    if pattern.is_finite() {
        return Ok(());
    }
    let pos = pattern.values().iter().position(|v| !v.is_finite());
    Err(ArtError::InvalidArgument(format!(
        "pattern value at index {} is not finite",
        pos.unwrap_or_default()
    )))
}

/// Guarded division: returns `fallback` when the denominator is within `eps` of zero.
#[inline]
pub(crate) fn safe_div(num: f64, den: f64, eps: f64, fallback: f64) -> f64 {
    if den.abs() <= eps {
        fallback
    } else {
        num / den
    }
}
