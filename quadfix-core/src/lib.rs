//! Quadfix: quadratic minimization with fixed variables and linear equality
//! constraints.
//!
//! Minimizes `Z'AZ + Z'B + C` subject to `Z(known) = Y` and optionally
//! `Aeq Z = Beq`. The work is split in two phases:
//!
//! - **precompute** partitions the variables, assembles the saddle-point
//!   (KKT) system, picks a sparse factorization and factors it once;
//! - **solve** builds the right-hand side for new `B`, `Y`, `Beq` and
//!   back-substitutes through the cached factorization.
//!
//! This suits mesh-processing callers (smoothing, deformation,
//! parameterization) that solve the same sparsity pattern many times.
//!
//! # Factorization choice
//!
//! | `A(u,u)` symmetric | constraints | positive definite | factorization |
//! |--------------------|-------------|-------------------|---------------|
//! | yes                | no          | yes               | Cholesky      |
//! | yes                | no          | no                | LDLᵀ          |
//! | yes                | yes         | yes               | LDLᵀ          |
//! | yes                | yes         | no                | LU            |
//! | no                 | any         | any               | LU            |
//!
//! # Example
//!
//! ```
//! use ndarray::array;
//! use quadfix_core::{linalg::sparse, precompute, solve};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // min z0² + z1²  s.t.  z0 + z1 = 1
//! let a = sparse::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 1, 1.0)]);
//! let aeq = sparse::from_triplets(1, 2, vec![(0, 0, 1.0), (0, 1, 1.0)]);
//! let data = precompute(&a, &[], Some(&aeq), true)?;
//!
//! let b = array![[0.0], [0.0]];
//! let y = ndarray::Array2::<f64>::zeros((0, 1));
//! let beq = array![[1.0]];
//! let z = solve(&data, b.view(), y.view(), beq.view())?;
//!
//! assert!((z[[0, 0]] - 0.5).abs() < 1e-12);
//! assert!((z[[1, 0]] - 0.5).abs() < 1e-12);
//! # Ok(())
//! # }
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::too_many_arguments)]

pub mod constraints;
pub mod data;
pub mod diagnostics;
pub mod error;
pub mod linalg;
pub mod partition;
pub mod scalar;
pub mod select;
pub mod settings;

use ndarray::{Array2, ArrayView2};
use sprs::CsMat;

// Re-export main types
pub use data::{MinQuadData, Solution};
pub use diagnostics::Diagnostics;
pub use error::{ErrorKind, QuadError, QuadResult};
pub use scalar::Scalar;
pub use select::SolverKind;
pub use settings::PrecomputeSettings;

/// Factor the system for `A`, `known`, `Aeq` with default settings.
pub fn precompute<T: Scalar>(
    a: &CsMat<T>,
    known: &[usize],
    aeq: Option<&CsMat<T>>,
    positive_definite: bool,
) -> QuadResult<MinQuadData<T>> {
    MinQuadData::precompute(a, known, aeq, positive_definite, &PrecomputeSettings::default())
}

/// [`precompute`] with explicit settings.
pub fn precompute_with_settings<T: Scalar>(
    a: &CsMat<T>,
    known: &[usize],
    aeq: Option<&CsMat<T>>,
    positive_definite: bool,
    settings: &PrecomputeSettings,
) -> QuadResult<MinQuadData<T>> {
    MinQuadData::precompute(a, known, aeq, positive_definite, settings)
}

/// Solve against a precomputed record. See [`MinQuadData::solve`].
pub fn solve<T: Scalar>(
    data: &MinQuadData<T>,
    b: ArrayView2<'_, T>,
    y: ArrayView2<'_, T>,
    beq: ArrayView2<'_, T>,
) -> QuadResult<Array2<T>> {
    data.solve(b, y, beq)
}

/// One-shot precompute and solve.
pub fn min_quad_with_fixed<T: Scalar>(
    a: &CsMat<T>,
    b: ArrayView2<'_, T>,
    known: &[usize],
    y: ArrayView2<'_, T>,
    aeq: Option<&CsMat<T>>,
    beq: ArrayView2<'_, T>,
    positive_definite: bool,
) -> QuadResult<Array2<T>> {
    precompute(a, known, aeq, positive_definite)?.solve(b, y, beq)
}
