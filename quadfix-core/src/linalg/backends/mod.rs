//! Factorization backends built on faer's sparse solvers.

mod faer_ldl;
mod faer_llt;
mod faer_lu;

pub use faer_ldl::FaerLdlBackend;
pub use faer_llt::FaerLltBackend;
pub use faer_lu::FaerLuBackend;

use faer::sparse::{SparseColMat, Triplet};

use super::backend::BackendError;
use super::sparse::SparseCsc;

/// Convert an sprs matrix into faer's CSC type.
fn to_faer(mat: &SparseCsc) -> Result<SparseColMat<usize, f64>, BackendError> {
    let triplets: Vec<Triplet<usize, usize, f64>> = mat
        .iter()
        .map(|(val, (row, col))| Triplet::new(row, col, *val))
        .collect();

    SparseColMat::try_new_from_triplets(mat.rows(), mat.cols(), &triplets)
        .map_err(|e| BackendError::Message(format!("failed to build faer CSC matrix: {e:?}")))
}
