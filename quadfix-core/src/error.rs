//! Error types for precompute and solve.

use thiserror::Error;

use crate::linalg::backend::BackendError;
use crate::select::SolverKind;

/// Coarse classification of a [`QuadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad indices or inconsistent shapes.
    MalformedInput,
    /// The selected factorization rejected the assembled matrix.
    Factorization,
    /// Back-substitution failed or produced unusable values.
    Solve,
}

/// Errors reported by [`crate::precompute`] and [`crate::solve`].
#[derive(Error, Debug)]
pub enum QuadError {
    /// A known index is not a valid variable index
    #[error("known index {index} out of range for {n} variables")]
    KnownOutOfRange { index: usize, n: usize },

    /// A known index appears twice
    #[error("known index {0} listed more than once")]
    DuplicateKnown(usize),

    /// An input matrix does not have the expected (rows, cols)
    #[error("{what} has shape {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// The chosen factorization failed on the assembled system
    #[error("{solver} factorization failed: {source}")]
    Factorization {
        solver: SolverKind,
        #[source]
        source: BackendError,
    },

    /// The cached factorization could not back-substitute
    #[error("back-substitution failed: {0}")]
    Solve(#[source] BackendError),

    /// Back-substitution produced NaN or infinity
    #[error("non-finite value in solve space row {row}, column {col}")]
    NonFiniteSolution { row: usize, col: usize },
}

impl QuadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QuadError::KnownOutOfRange { .. }
            | QuadError::DuplicateKnown(_)
            | QuadError::DimensionMismatch { .. } => ErrorKind::MalformedInput,
            QuadError::Factorization { .. } => ErrorKind::Factorization,
            QuadError::Solve(_) | QuadError::NonFiniteSolution { .. } => ErrorKind::Solve,
        }
    }
}

/// Result type for precompute and solve.
pub type QuadResult<T> = Result<T, QuadError>;

pub(crate) fn check_shape(
    what: &'static str,
    actual: (usize, usize),
    expected: (usize, usize),
) -> QuadResult<()> {
    if actual != expected {
        return Err(QuadError::DimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}
