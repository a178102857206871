//! Sparse Cholesky (LLᵀ) backend.

use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::{Llt, SymbolicLlt};
use faer::{Mat, Side};

use super::to_faer;
use crate::linalg::backend::{check_rhs, check_square, BackendError, FactorBackend, FactorOptions};
use crate::linalg::sparse::{self, SparseCsc};

/// faer supernodal LLᵀ over the upper triangle of the system.
///
/// faer picks its own fill-reducing ordering during the symbolic phase.
pub struct FaerLltBackend {
    dim: usize,
    llt: Option<Llt<usize, f64>>,
}

impl FactorBackend for FaerLltBackend {
    fn factorize(kkt: &SparseCsc, _options: &FactorOptions) -> Result<Self, BackendError> {
        let dim = check_square(kkt)?;
        if dim == 0 {
            return Ok(Self { dim, llt: None });
        }

        let csc = to_faer(&sparse::upper_triangle(kkt))?;

        let symbolic = SymbolicLlt::try_new(csc.symbolic().as_ref(), Side::Upper)
            .map_err(|e| BackendError::Message(format!("symbolic analysis failed: {e:?}")))?;

        let llt = Llt::try_new_with_symbolic(symbolic, csc.as_ref(), Side::Upper)
            .map_err(|e| BackendError::Message(format!("Cholesky factorization failed: {e:?}")))?;

        Ok(Self {
            dim,
            llt: Some(llt),
        })
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn solve_in_place(&self, rhs: &mut Mat<f64>) -> Result<(), BackendError> {
        check_rhs(self.dim, rhs)?;
        if let Some(llt) = self.llt.as_ref() {
            let sol = llt.solve(&*rhs);
            *rhs = sol;
        }
        Ok(())
    }
}
