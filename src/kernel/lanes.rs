//! Numeric kernels shared by every category geometry.
//!
//! A [`Kernel`] runs either the plain scalar loops or the lane-chunked
//! variants. The chunked loops keep `F64_LANES` independent accumulators
//! so the compiler can keep them in one vector register.
//!
//! When compiled with the `simd` feature, dot products and squared
//! distances in vectorized mode go through simsimd instead.

/// f64 lanes per 512-bit register.
pub const F64_LANES: usize = 8;

/// Execution path for the numeric primitives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Kernel {
    vectorized: bool,
}

impl Kernel {
    /// Plain scalar loops.
    pub const SCALAR: Kernel = Kernel { vectorized: false };

    /// Lane-chunked loops (and simsimd where available).
    pub const VECTORIZED: Kernel = Kernel { vectorized: true };

    pub fn new(vectorized: bool) -> Self {
        Self { vectorized }
    }

    pub fn is_vectorized(&self) -> bool {
        self.vectorized
    }

    /// Width of one execution lane group: `F64_LANES` when vectorized, else 1.
    pub fn lanes(&self) -> usize {
        if self.vectorized {
            F64_LANES
        } else {
            1
        }
    }

    /// Whether an input of `len` elements actually runs on the wide path.
    pub fn uses_lanes(&self, len: usize) -> bool {
        self.vectorized && len >= F64_LANES
    }

    /// Sum of all elements (the L1 norm for non-negative data).
    #[inline]
    pub fn sum(&self, a: &[f64]) -> f64 {
        if self.vectorized {
            lanes_sum(a)
        } else {
            a.iter().sum()
        }
    }

    /// Sum of element-wise minima: `|a ∧ b|` in fuzzy set terms.
    #[inline]
    pub fn min_sum(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len(), "Dimension mismatch in min_sum");
        if self.vectorized {
            lanes_min_sum(a, b)
        } else {
            a.iter().zip(b.iter()).map(|(&x, &y)| x.min(y)).sum()
        }
    }

    /// `|a ∧ b|` restricted to the listed indices of `a`.
    ///
    /// Valid as a replacement for [`min_sum`](Self::min_sum) when `a` is zero
    /// outside `indices` and `b` is non-negative.
    #[inline]
    pub fn min_sum_sparse(&self, indices: &[usize], a: &[f64], b: &[f64]) -> f64 {
        indices.iter().map(|&i| a[i].min(b[i])).sum()
    }

    /// Raw dot product.
    #[inline]
    pub fn dot(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len(), "Dimension mismatch in dot");
        if self.vectorized {
            simd_dot(a, b)
        } else {
            a.iter().zip(b.iter()).map(|(&x, &y)| x * y).sum()
        }
    }

    /// Squared Euclidean distance.
    #[inline]
    pub fn sq_distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len(), "Dimension mismatch in sq_distance");
        if self.vectorized {
            simd_sq_distance(a, b)
        } else {
            a.iter()
                .zip(b.iter())
                .map(|(&x, &y)| {
                    let d = x - y;
                    d * d
                })
                .sum()
        }
    }

    /// Fuzzy learning step: `w ← rate·(x ∧ w) + (1 − rate)·w`.
    #[inline]
    pub fn fuzzy_update(&self, w: &mut [f64], x: &[f64], rate: f64) {
        debug_assert_eq!(w.len(), x.len(), "Dimension mismatch in fuzzy_update");
        let keep = 1.0 - rate;
        if self.vectorized {
            let mut wc = w.chunks_exact_mut(F64_LANES);
            let mut xc = x.chunks_exact(F64_LANES);
            for (wl, xl) in (&mut wc).zip(&mut xc) {
                for l in 0..F64_LANES {
                    wl[l] = rate * xl[l].min(wl[l]) + keep * wl[l];
                }
            }
            for (wi, &xi) in wc.into_remainder().iter_mut().zip(xc.remainder()) {
                *wi = rate * xi.min(*wi) + keep * *wi;
            }
        } else {
            for (wi, &xi) in w.iter_mut().zip(x.iter()) {
                *wi = rate * xi.min(*wi) + keep * *wi;
            }
        }
    }

    /// Move `c` toward `x`: `c ← c + scale·(x − c)`.
    #[inline]
    pub fn move_toward(&self, c: &mut [f64], x: &[f64], scale: f64) {
        debug_assert_eq!(c.len(), x.len(), "Dimension mismatch in move_toward");
        if self.vectorized {
            let mut cc = c.chunks_exact_mut(F64_LANES);
            let mut xc = x.chunks_exact(F64_LANES);
            for (cl, xl) in (&mut cc).zip(&mut xc) {
                for l in 0..F64_LANES {
                    cl[l] += scale * (xl[l] - cl[l]);
                }
            }
            for (ci, &xi) in cc.into_remainder().iter_mut().zip(xc.remainder()) {
                *ci += scale * (xi - *ci);
            }
        } else {
            for (ci, &xi) in c.iter_mut().zip(x.iter()) {
                *ci += scale * (xi - *ci);
            }
        }
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::SCALAR
    }
}

#[inline]
fn lanes_sum(a: &[f64]) -> f64 {
    let mut acc = [0.0f64; F64_LANES];
    let chunks = a.chunks_exact(F64_LANES);
    let rem = chunks.remainder();
    for chunk in chunks {
        for l in 0..F64_LANES {
            acc[l] += chunk[l];
        }
    }
    acc.iter().sum::<f64>() + rem.iter().sum::<f64>()
}

#[inline]
fn lanes_min_sum(a: &[f64], b: &[f64]) -> f64 {
    let mut acc = [0.0f64; F64_LANES];
    let ca = a.chunks_exact(F64_LANES);
    let cb = b.chunks_exact(F64_LANES);
    let (ra, rb) = (ca.remainder(), cb.remainder());
    for (x, y) in ca.zip(cb) {
        for l in 0..F64_LANES {
            acc[l] += x[l].min(y[l]);
        }
    }
    let tail: f64 = ra.iter().zip(rb.iter()).map(|(&x, &y)| x.min(y)).sum();
    acc.iter().sum::<f64>() + tail
}

#[inline]
fn lanes_dot(a: &[f64], b: &[f64]) -> f64 {
    let mut acc = [0.0f64; F64_LANES];
    let ca = a.chunks_exact(F64_LANES);
    let cb = b.chunks_exact(F64_LANES);
    let (ra, rb) = (ca.remainder(), cb.remainder());
    for (x, y) in ca.zip(cb) {
        for l in 0..F64_LANES {
            acc[l] += x[l] * y[l];
        }
    }
    let tail: f64 = ra.iter().zip(rb.iter()).map(|(&x, &y)| x * y).sum();
    acc.iter().sum::<f64>() + tail
}

#[inline]
fn lanes_sq_distance(a: &[f64], b: &[f64]) -> f64 {
    let mut acc = [0.0f64; F64_LANES];
    let ca = a.chunks_exact(F64_LANES);
    let cb = b.chunks_exact(F64_LANES);
    let (ra, rb) = (ca.remainder(), cb.remainder());
    for (x, y) in ca.zip(cb) {
        for l in 0..F64_LANES {
            let d = x[l] - y[l];
            acc[l] += d * d;
        }
    }
    let tail: f64 = ra
        .iter()
        .zip(rb.iter())
        .map(|(&x, &y)| {
            let d = x - y;
            d * d
        })
        .sum();
    acc.iter().sum::<f64>() + tail
}

#[cfg(feature = "simd")]
#[inline]
fn simd_dot(a: &[f64], b: &[f64]) -> f64 {
    use simsimd::SpatialSimilarity;
    f64::dot(a, b).unwrap_or_else(|| lanes_dot(a, b))
}

#[cfg(not(feature = "simd"))]
#[inline]
fn simd_dot(a: &[f64], b: &[f64]) -> f64 {
    lanes_dot(a, b)
}

#[cfg(feature = "simd")]
#[inline]
fn simd_sq_distance(a: &[f64], b: &[f64]) -> f64 {
    use simsimd::SpatialSimilarity;
    f64::sqeuclidean(a, b).unwrap_or_else(|| lanes_sq_distance(a, b))
}

#[cfg(not(feature = "simd"))]
#[inline]
fn simd_sq_distance(a: &[f64], b: &[f64]) -> f64 {
    lanes_sq_distance(a, b)
}
