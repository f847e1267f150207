//! Kernel layer: patterns and the numeric kernels every geometry runs on.
//!
//! - [`Pattern`]: immutable fixed-length input vector
//! - [`Kernel`]: scalar or lane-chunked reductions and updates
//!   (fuzzy AND sums, dot products, squared distances)
//!
//! This layer has no dependencies on [`geometry`](crate::geometry) or
//! [`engine`](crate::engine).
//!
//! # Example
//!
//! ```rust
//! use artmap::kernel::{Kernel, Pattern, F64_LANES};
//!
//! let a = Pattern::filled(16, 0.25);
//! let b = Pattern::filled(16, 0.5);
//!
//! let k = Kernel::VECTORIZED;
//! assert_eq!(k.lanes(), F64_LANES);
//! assert_eq!(k.min_sum(a.values(), b.values()), 4.0);
//! assert_eq!(Kernel::SCALAR.min_sum(a.values(), b.values()), 4.0);
//! ```

pub mod lanes;
pub mod pattern;

pub use lanes::{Kernel, F64_LANES};
pub use pattern::Pattern;
