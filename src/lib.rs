//! # artmap: Adaptive Resonance Theory clustering
//!
//! Incremental, online clustering with the ART family of networks. Every
//! variant shares one vigilance-gated search/match/update loop and plugs in
//! its own category geometry.
//!
//! ## Quick Start
//!
//! ```rust
//! use artmap::{ArtParams, FuzzyArt, FuzzyShape, Pattern};
//!
//! let params = ArtParams::new(FuzzyShape::default()).with_vigilance(0.75);
//! let mut art = FuzzyArt::vectorized();
//!
//! for p in [[0.1, 0.1], [0.12, 0.11], [0.8, 0.9], [0.82, 0.88]] {
//!     art.learn(&Pattern::new(p.to_vec()), &params)?;
//! }
//! assert_eq!(art.category_count(), 2);
//!
//! let stats = art.performance_stats();
//! println!("ops: {}, simd ratio: {:.2}", stats.total_operations, stats.simd_utilization_ratio());
//! # Ok::<(), artmap::ArtError>(())
//! ```
//!
//! ## Variants
//!
//! - **FuzzyART**: hyper-rectangle categories with complement coding
//! - **HypersphereART**: ball categories (centroid + radius)
//! - **EllipsoidART**: ellipsoid categories with a learned major axis
//! - **FusionART**: weighted multi-channel fuzzy categories, with channel skipping
//! - **DeepARTMAP**: a fixed pipeline of single-layer engines ([`deep`])
//!
//! Each single-layer engine comes in a scalar form (`new()`) and a
//! lane-chunked form (`vectorized()`); enable the `simd` feature to route
//! dot products and distances through simsimd.
//!
//! ## Layers
//!
//! - [`kernel`]: [`Pattern`] and the numeric [`Kernel`]
//! - [`geometry`]: the [`Geometry`] trait and its four implementations
//! - [`store`], [`search`], [`engine`]: the shared resonance loop
//! - [`stats`]: mergeable [`PerformanceStats`] snapshots
//! - [`deep`]: layered composition

pub mod config;
pub mod deep;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod kernel;
pub mod search;
pub mod stats;
pub mod store;

// Re-exports for convenience
pub use config::{ArtParams, PerfParams};
pub use deep::{BoundLayer, DeepActivation, DeepArtMap, DeepParams, InputRouting, Layer};
pub use engine::{
    ActivationResult, ArtEngine, EllipsoidArt, FitOptions, FusionArt, FuzzyArt, HypersphereArt,
};
pub use error::{ArtError, Result};
pub use geometry::{
    ChannelSpec, Ellipsoid, EllipsoidShape, Fusion, FusionShape, Fuzzy, FuzzyShape, Geometry,
    Hypersphere, HypersphereShape,
};
pub use kernel::{Kernel, Pattern, F64_LANES};
pub use stats::PerformanceStats;
pub use store::{Category, CategoryStore};
