//! Precompute configuration.

use faer::Par;

use crate::select::SolverKind;

/// Environment variable read by [`PrecomputeSettings::default`] for the
/// factorization thread count (0 = all cores, 1 = sequential).
pub const THREADS_ENV: &str = "QUADFIX_THREADS";

/// Settings for [`crate::precompute_with_settings`].
#[derive(Debug, Clone, PartialEq)]
pub struct PrecomputeSettings {
    /// Force a factorization instead of the automatic policy.
    ///
    /// Callers implementing a fallback chain (Cholesky, then LDL, then LU)
    /// set this on each retry.
    pub solver: Option<SolverKind>,

    /// Relative tolerance for treating `A(unknown, unknown)` as symmetric
    pub symmetry_tol: f64,

    /// Keep a copy of the assembled KKT matrix in the record
    pub keep_diagnostics: bool,

    /// Threads for the LDLᵀ backend (`None` or `Some(0)` = all cores).
    /// The LLᵀ and LU backends follow faer's global parallelism setting.
    pub threads: Option<usize>,
}

impl Default for PrecomputeSettings {
    fn default() -> Self {
        let threads = std::env::var(THREADS_ENV)
            .ok()
            .and_then(|t| t.parse::<usize>().ok());

        Self {
            solver: None,
            symmetry_tol: 1e-12,
            keep_diagnostics: false,
            threads,
        }
    }
}

impl PrecomputeSettings {
    pub(crate) fn parallelism(&self) -> Par {
        match self.threads {
            None | Some(0) => Par::rayon(0),
            Some(1) => Par::Seq,
            Some(t) => Par::rayon(t),
        }
    }
}
