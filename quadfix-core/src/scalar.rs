//! Scalar types accepted at the public boundary.
//!
//! Callers may hand in `f32` or `f64` data. Assembly and factorization always
//! run in `f64`; values are widened on the way in and narrowed on the way out.
//! Known values are copied into the solution without conversion.

use std::fmt::Debug;

use num_traits::Float;

/// Floating point type usable for `A`, `B`, `Y`, `Aeq`, `Beq` and `Z`.
pub trait Scalar: Float + Debug + Default + Send + Sync + 'static {
    /// Widen to the working precision.
    fn as_f64(self) -> f64;

    /// Narrow from the working precision.
    fn cast_from_f64(value: f64) -> Self;
}

impl Scalar for f64 {
    #[inline]
    fn as_f64(self) -> f64 {
        self
    }

    #[inline]
    fn cast_from_f64(value: f64) -> Self {
        value
    }
}

impl Scalar for f32 {
    #[inline]
    fn as_f64(self) -> f64 {
        self as f64
    }

    #[inline]
    fn cast_from_f64(value: f64) -> Self {
        value as f32
    }
}
