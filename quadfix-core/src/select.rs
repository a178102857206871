//! Factorization selection policy.

use std::fmt;

/// Which sparse factorization backs a precomputed system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverKind {
    /// LLᵀ. Fastest; only valid for symmetric positive definite systems.
    Cholesky,
    /// LDLᵀ without pivoting. Symmetric indefinite and saddle-point systems.
    Ldl,
    /// LU with partial pivoting. Works for anything non-singular.
    Lu,
}

impl SolverKind {
    /// Pick the cheapest factorization that is valid for the assembled system.
    ///
    /// * `positive_definite` - caller's claim about `A(unknown, unknown)`
    /// * `symmetric` - detected symmetry of `A(unknown, unknown)`
    /// * `constrained` - whether Lagrange rows were appended
    ///
    /// A saddle-point system is never positive definite, so with constraints
    /// the flag only decides between LDLᵀ (the Schur complement is negative
    /// definite and no pivoting is needed) and LU (no such guarantee).
    pub fn select(positive_definite: bool, symmetric: bool, constrained: bool) -> Self {
        if !symmetric {
            return SolverKind::Lu;
        }
        match (constrained, positive_definite) {
            (false, true) => SolverKind::Cholesky,
            (false, false) => SolverKind::Ldl,
            (true, true) => SolverKind::Ldl,
            (true, false) => SolverKind::Lu,
        }
    }

    /// Cholesky and LDLᵀ read a single triangle and assume the other mirrors it.
    pub fn requires_symmetry(self) -> bool {
        matches!(self, SolverKind::Cholesky | SolverKind::Ldl)
    }
}

impl fmt::Display for SolverKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolverKind::Cholesky => "Cholesky",
            SolverKind::Ldl => "LDL",
            SolverKind::Lu => "LU",
        };
        f.write_str(name)
    }
}
