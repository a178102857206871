//! Linear algebra layer.
//!
//! Sparse helpers, KKT assembly, and the factorization backends.

pub mod sparse;
pub mod kkt;
pub mod backend;
pub mod backends;
