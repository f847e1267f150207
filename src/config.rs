//! Hyperparameter configuration.
//!
//! [`ArtParams`] is the immutable bag of hyperparameters passed by
//! reference to every `learn`/`predict` call. The shared search knobs live
//! at the top level; everything geometry-specific sits in `shape`.
//!
//! Parameters round-trip through JSON. Missing fields take their defaults,
//! so a config file only needs to name what it changes:
//!
//! ```rust
//! use artmap::config::ArtParams;
//! use artmap::geometry::FuzzyShape;
//!
//! let params: ArtParams<FuzzyShape> =
//!     ArtParams::from_json(r#"{"vigilance": 0.8, "perf": {"parallelism_level": 4}}"#).unwrap();
//! assert_eq!(params.vigilance, 0.8);
//! assert_eq!(params.learning_rate, 1.0);
//! ```

use crate::error::{ArtError, Result};
use crate::geometry::Geometry;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

mod defaults {
    pub fn vigilance() -> f64 {
        0.75
    }
    pub fn learning_rate() -> f64 {
        1.0
    }
    pub fn choice_alpha() -> f64 {
        1e-3
    }
    pub fn epsilon() -> f64 {
        1e-9
    }
    pub fn salience_rate() -> f64 {
        0.1
    }
}

/// Resource and execution knobs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerfParams {
    /// Allow a vectorized engine to take its wide path. Ignored by scalar engines.
    pub enable_simd: bool,
    /// Worker threads for the activation scan (1 = sequential).
    pub parallelism_level: usize,
    /// Minimum category count before the scan goes parallel.
    pub parallel_threshold: usize,
    /// Bounded prediction cache entries (0 = disabled).
    pub cache_size: usize,
    /// Input sparsity at or above which the fuzzy sparse path is taken.
    pub sparse_threshold: f64,
}

impl Default for PerfParams {
    fn default() -> Self {
        Self {
            enable_simd: true,
            parallelism_level: 1,
            parallel_threshold: 256,
            cache_size: 0,
            sparse_threshold: 0.5,
        }
    }
}

/// Hyperparameters for a single-layer engine with geometry shape `S`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArtParams<S> {
    /// Match threshold in [0, 1]; higher means stricter, smaller categories.
    #[serde(default = "defaults::vigilance")]
    pub vigilance: f64,
    /// Prototype update magnitude in [0, 1]; 1.0 is fast learning.
    #[serde(default = "defaults::learning_rate")]
    pub learning_rate: f64,
    /// Choice-function tie breaker, >= 0.
    #[serde(default = "defaults::choice_alpha")]
    pub choice_alpha: f64,
    /// Numeric tolerance for the vigilance test and guarded divisions.
    #[serde(default = "defaults::epsilon")]
    pub epsilon: f64,
    /// How many ranked candidates get a vigilance test (None = all).
    #[serde(default)]
    pub max_search_attempts: Option<usize>,
    /// Upper bound on the number of categories (None = unbounded).
    #[serde(default)]
    pub max_categories: Option<usize>,
    /// EMA rate for per-category salience scores.
    #[serde(default = "defaults::salience_rate")]
    pub salience_rate: f64,
    #[serde(default)]
    pub perf: PerfParams,
    #[serde(default)]
    pub shape: S,
}

impl<S: Default> Default for ArtParams<S> {
    fn default() -> Self {
        Self::new(S::default())
    }
}

impl<S> ArtParams<S> {
    /// Default search knobs around the given geometry shape.
    pub fn new(shape: S) -> Self {
        Self {
            vigilance: defaults::vigilance(),
            learning_rate: defaults::learning_rate(),
            choice_alpha: defaults::choice_alpha(),
            epsilon: defaults::epsilon(),
            max_search_attempts: None,
            max_categories: None,
            salience_rate: defaults::salience_rate(),
            perf: PerfParams::default(),
            shape,
        }
    }

    pub fn with_vigilance(mut self, vigilance: f64) -> Self {
        self.vigilance = vigilance;
        self
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_choice_alpha(mut self, alpha: f64) -> Self {
        self.choice_alpha = alpha;
        self
    }

    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    pub fn with_max_search_attempts(mut self, attempts: usize) -> Self {
        self.max_search_attempts = Some(attempts);
        self
    }

    pub fn with_max_categories(mut self, limit: usize) -> Self {
        self.max_categories = Some(limit);
        self
    }

    pub fn with_salience_rate(mut self, rate: f64) -> Self {
        self.salience_rate = rate;
        self
    }

    pub fn with_perf(mut self, perf: PerfParams) -> Self {
        self.perf = perf;
        self
    }

    pub fn with_parallelism(mut self, level: usize, threshold: usize) -> Self {
        self.perf.parallelism_level = level;
        self.perf.parallel_threshold = threshold;
        self
    }

    pub fn with_cache_size(mut self, entries: usize) -> Self {
        self.perf.cache_size = entries;
        self
    }

    pub fn with_simd(mut self, enabled: bool) -> Self {
        self.perf.enable_simd = enabled;
        self
    }

    /// Check every shared knob, then the geometry-specific shape.
    pub fn validate<G>(&self) -> Result<()>
    where
        G: Geometry<Shape = S>,
    {
        unit_interval("vigilance", self.vigilance)?;
        unit_interval("learning_rate", self.learning_rate)?;
        unit_interval("salience_rate", self.salience_rate)?;
        non_negative("choice_alpha", self.choice_alpha)?;
        non_negative("epsilon", self.epsilon)?;

        if self.max_search_attempts == Some(0) {
            return Err(ArtError::invalid_parameter(
                "max_search_attempts",
                "must be at least 1 when set",
            ));
        }
        if self.max_categories == Some(0) {
            return Err(ArtError::invalid_parameter(
                "max_categories",
                "must be at least 1 when set",
            ));
        }
        if self.perf.parallelism_level == 0 {
            return Err(ArtError::invalid_parameter(
                "perf.parallelism_level",
                "must be at least 1",
            ));
        }
        unit_interval("perf.sparse_threshold", self.perf.sparse_threshold)?;

        G::validate_shape(&self.shape)
    }
}

impl<S> ArtParams<S>
where
    Self: Serialize + DeserializeOwned,
{
    /// Parse parameters from JSON; absent fields take defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize parameters to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub(crate) fn unit_interval(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ArtError::invalid_parameter(
            name,
            format!("must be in [0, 1], got {}", value),
        ));
    }
    Ok(())
}

pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(ArtError::invalid_parameter(
            name,
            format!("must be finite and >= 0, got {}", value),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Fuzzy, FuzzyShape, Hypersphere, HypersphereShape};

    #[test]
    fn test_defaults_validate() {
        let params: ArtParams<FuzzyShape> = ArtParams::default();
        assert!(params.validate::<Fuzzy>().is_ok());
    }

    #[test]
    fn test_out_of_range_vigilance() {
        let params = ArtParams::new(FuzzyShape::default()).with_vigilance(1.5);
        match params.validate::<Fuzzy>() {
            Err(ArtError::InvalidParameter { name, .. }) => assert_eq!(name, "vigilance"),
            other => panic!("expected InvalidParameter, got {:?}", other),
        }
    }

    #[test]
    fn test_nan_rejected() {
        let params = ArtParams::new(FuzzyShape::default()).with_learning_rate(f64::NAN);
        assert!(params.validate::<Fuzzy>().is_err());
    }

    #[test]
    fn test_zero_limits_rejected() {
        let params = ArtParams::new(FuzzyShape::default()).with_max_categories(0);
        assert!(params.validate::<Fuzzy>().is_err());
        let params = ArtParams::new(FuzzyShape::default()).with_parallelism(0, 10);
        assert!(params.validate::<Fuzzy>().is_err());
    }

    #[test]
    fn test_shape_validation_delegated() {
        let params = ArtParams::new(HypersphereShape { r_hat: Some(-1.0) });
        assert!(params.validate::<Hypersphere>().is_err());
    }

    #[test]
    fn test_json_partial_config() {
        let params: ArtParams<FuzzyShape> =
            ArtParams::from_json(r#"{"vigilance": 0.9, "shape": {"complement_coding": false}}"#)
                .unwrap();
        assert_eq!(params.vigilance, 0.9);
        assert!(!params.shape.complement_coding);
        assert_eq!(params.perf, PerfParams::default());
    }

    #[test]
    fn test_json_malformed() {
        let err = ArtParams::<FuzzyShape>::from_json("{not json").unwrap_err();
        assert!(matches!(err, ArtError::Config(_)));
    }

    #[test]
    fn test_json_round_trip_preserves_params() {
        let params = ArtParams::new(FuzzyShape::default())
            .with_vigilance(0.6)
            .with_max_categories(12)
            .with_cache_size(32);
        let restored: ArtParams<FuzzyShape> =
            ArtParams::from_json(&params.to_json().unwrap()).unwrap();
        assert_eq!(params, restored);
    }
}
