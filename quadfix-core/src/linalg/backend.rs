use std::fmt;

use faer::{Mat, Par};
use thiserror::Error;

use super::backends::{FaerLdlBackend, FaerLltBackend, FaerLuBackend};
use super::sparse::SparseCsc;
use crate::select::SolverKind;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0}")]
    Message(String),
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("matrix is not square ({rows}x{cols})")]
    NotSquare { rows: usize, cols: usize },
    #[error("matrix is not symmetric")]
    NotSymmetric,
    #[error("factorization is numerically singular")]
    Singular,
}

/// Knobs handed to a backend at factorization time.
#[derive(Debug, Clone, Copy)]
pub struct FactorOptions {
    pub parallelism: Par,
    /// Number of trailing rows/columns (the Lagrange block) that must be
    /// eliminated after everything else.
    pub trailing_block: usize,
}

impl Default for FactorOptions {
    fn default() -> Self {
        Self {
            parallelism: Par::Seq,
            trailing_block: 0,
        }
    }
}

/// An external sparse factorization: factor once, back-substitute many times.
pub trait FactorBackend: Sized {
    fn factorize(kkt: &SparseCsc, options: &FactorOptions) -> Result<Self, BackendError>;
    fn dim(&self) -> usize;
    /// Overwrite every column of `rhs` with the solution of `K x = rhs`.
    fn solve_in_place(&self, rhs: &mut Mat<f64>) -> Result<(), BackendError>;
}

pub(crate) fn check_square(kkt: &SparseCsc) -> Result<usize, BackendError> {
    if kkt.rows() != kkt.cols() {
        return Err(BackendError::NotSquare {
            rows: kkt.rows(),
            cols: kkt.cols(),
        });
    }
    Ok(kkt.rows())
}

pub(crate) fn check_rhs(dim: usize, rhs: &Mat<f64>) -> Result<(), BackendError> {
    if rhs.nrows() != dim {
        return Err(BackendError::DimensionMismatch {
            expected: dim,
            actual: rhs.nrows(),
        });
    }
    Ok(())
}

/// Solve against a vector of ones and make sure nothing blew up.
///
/// Catches exact zero pivots that a backend accepted without complaint.
pub(crate) fn probe_nonsingular<B: FactorBackend>(backend: &B) -> Result<(), BackendError> {
    let dim = backend.dim();
    if dim == 0 {
        return Ok(());
    }
    let mut probe = Mat::<f64>::from_fn(dim, 1, |_, _| 1.0);
    backend.solve_in_place(&mut probe)?;
    if (0..dim).all(|i| probe[(i, 0)].is_finite()) {
        Ok(())
    } else {
        Err(BackendError::Singular)
    }
}

/// The cached factorization, tagged by the kind that produced it.
pub enum Factorization {
    Cholesky(FaerLltBackend),
    Ldl(FaerLdlBackend),
    Lu(FaerLuBackend),
}

impl Factorization {
    pub fn factorize(
        kind: SolverKind,
        kkt: &SparseCsc,
        options: &FactorOptions,
    ) -> Result<Self, BackendError> {
        Ok(match kind {
            SolverKind::Cholesky => Factorization::Cholesky(FaerLltBackend::factorize(kkt, options)?),
            SolverKind::Ldl => Factorization::Ldl(FaerLdlBackend::factorize(kkt, options)?),
            SolverKind::Lu => Factorization::Lu(FaerLuBackend::factorize(kkt, options)?),
        })
    }

    pub fn kind(&self) -> SolverKind {
        match self {
            Factorization::Cholesky(_) => SolverKind::Cholesky,
            Factorization::Ldl(_) => SolverKind::Ldl,
            Factorization::Lu(_) => SolverKind::Lu,
        }
    }

    pub fn dim(&self) -> usize {
        match self {
            Factorization::Cholesky(b) => b.dim(),
            Factorization::Ldl(b) => b.dim(),
            Factorization::Lu(b) => b.dim(),
        }
    }

    pub fn solve_in_place(&self, rhs: &mut Mat<f64>) -> Result<(), BackendError> {
        match self {
            Factorization::Cholesky(b) => b.solve_in_place(rhs),
            Factorization::Ldl(b) => b.solve_in_place(rhs),
            Factorization::Lu(b) => b.solve_in_place(rhs),
        }
    }
}

impl fmt::Debug for Factorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Factorization")
            .field("kind", &self.kind())
            .field("dim", &self.dim())
            .finish()
    }
}
