//! Sparse LU backend, the fallback for non-symmetric or indefinite systems.

use faer::linalg::solvers::Solve;
use faer::sparse::linalg::solvers::Lu;
use faer::Mat;

use super::to_faer;
use crate::linalg::backend::{
    check_rhs, check_square, probe_nonsingular, BackendError, FactorBackend, FactorOptions,
};
use crate::linalg::sparse::SparseCsc;

/// faer sparse LU with partial pivoting over the full matrix.
pub struct FaerLuBackend {
    dim: usize,
    lu: Option<Lu<usize, f64>>,
}

impl FactorBackend for FaerLuBackend {
    fn factorize(kkt: &SparseCsc, _options: &FactorOptions) -> Result<Self, BackendError> {
        let dim = check_square(kkt)?;
        if dim == 0 {
            return Ok(Self { dim, lu: None });
        }

        let csc = to_faer(kkt)?;
        let lu = csc
            .sp_lu()
            .map_err(|e| BackendError::Message(format!("sparse LU factorization failed: {e:?}")))?;

        let backend = Self { dim, lu: Some(lu) };
        probe_nonsingular(&backend)?;
        Ok(backend)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn solve_in_place(&self, rhs: &mut Mat<f64>) -> Result<(), BackendError> {
        check_rhs(self.dim, rhs)?;
        if let Some(lu) = self.lu.as_ref() {
            let sol = lu.solve(&*rhs);
            *rhs = sol;
        }
        Ok(())
    }
}
