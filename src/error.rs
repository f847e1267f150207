//! Error types for artmap.

use thiserror::Error;

/// artmap error types.
#[derive(Error, Debug)]
pub enum ArtError {
    /// Absent or malformed input pattern
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Pattern dimension does not match the engine's expected dimension
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Absent parameter configuration
    #[error("Missing configuration: {0}")]
    MissingConfiguration(String),

    /// A hyperparameter is out of range
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    /// JSON configuration could not be read or written
    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_json::Error),

    /// The worker pool for the parallel scan could not be built
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// The engine was used after `release()`
    #[error("Engine has been released")]
    Released,
}

impl ArtError {
    /// True for the invalid-argument family: absent patterns and dimension
    /// mismatches. Missing configuration is deliberately not part of it.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            ArtError::InvalidArgument(_) | ArtError::DimensionMismatch { .. }
        )
    }

    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        ArtError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Result type alias for artmap operations.
pub type Result<T> = std::result::Result<T, ArtError>;
