//! Optional copies of precompute intermediates.

use crate::linalg::kkt::KktSystem;
use crate::linalg::sparse::SparseCsc;

/// Retained when [`crate::PrecomputeSettings::keep_diagnostics`] is set.
///
/// Pair with [`crate::MinQuadData::assemble_rhs`] to reproduce the exact
/// system handed to the factorization.
#[derive(Debug, Clone)]
pub struct Diagnostics {
    kkt: SparseCsc,
    max_asymmetry: f64,
}

impl Diagnostics {
    pub(crate) fn new(system: &KktSystem) -> Self {
        Self {
            kkt: system.matrix().clone(),
            max_asymmetry: system.max_asymmetry(),
        }
    }

    /// The assembled (unknown ∪ lagrange)² matrix, both triangles.
    pub fn kkt(&self) -> &SparseCsc {
        &self.kkt
    }

    pub fn nnz(&self) -> usize {
        self.kkt.nnz()
    }

    /// `max |Auu - Auu'|` measured during assembly.
    pub fn max_asymmetry(&self) -> f64 {
        self.max_asymmetry
    }
}
