//! KKT system assembly.
//!
//! With the variables split into unknown (u) and known (k) sets and `m`
//! equality rows, the system factored once per problem is
//!
//! ```text
//! K = [ Auu   Aequ^T ]
//!     [ Aequ    0    ]
//! ```
//!
//! and the right-hand side for given `B`, `Y`, `Beq` is
//!
//! ```text
//! rhs = [ -B(u,:)/2 ]  -  preY * Y,      preY = [ Auk  ]
//!       [   Beq     ]                           [ Aeqk ]
//! ```
//!
//! which is the stationarity condition `2 A Z + B + Aeq^T mu = 0` divided by
//! two. The multiplier block of the solution therefore holds `mu / 2`.

use log::debug;
use sprs::{CsMat, TriMat};

use super::sparse::{self, SparseCsc};
use crate::constraints::ConstraintLayout;
use crate::error::{check_shape, QuadResult};
use crate::partition::{Slot, VariablePartition};
use crate::scalar::Scalar;

/// Assembled saddle-point matrix plus the known-value operator.
#[derive(Debug, Clone)]
pub struct KktSystem {
    matrix: SparseCsc,
    pre_y: SparseCsc,
    num_unknown: usize,
    num_constraints: usize,
    max_asymmetry: f64,
    symmetric: bool,
}

impl KktSystem {
    /// Build `K` and `preY` from the caller's `A` and `Aeq`.
    ///
    /// `symmetry_tol` is relative to the largest magnitude in `Auu`.
    pub fn assemble<T: Scalar>(
        a: &CsMat<T>,
        aeq: Option<&CsMat<T>>,
        partition: &VariablePartition,
        layout: &ConstraintLayout,
        symmetry_tol: f64,
    ) -> QuadResult<Self> {
        let n = partition.n();
        check_shape("A", (a.rows(), a.cols()), (n, n))?;

        let nu = partition.num_unknown();
        let nk = partition.num_known();
        let m = layout.num_constraints();
        let dim = layout.solve_dim();

        let mut kkt = TriMat::new((dim, dim));
        let mut pre_y = TriMat::new((dim, nk));

        // ===================================================================
        // Quadratic block: Auu into K, Auk into preY. Known rows drop out.
        // ===================================================================
        for (val, (row, col)) in a.iter() {
            let v = val.as_f64();
            match (partition.slot(row), partition.slot(col)) {
                (Slot::Unknown(r), Slot::Unknown(c)) => kkt.add_triplet(r, c, v),
                (Slot::Unknown(r), Slot::Known(c)) => pre_y.add_triplet(r, c, v),
                _ => {}
            }
        }

        // ===================================================================
        // Constraint blocks: Aequ and its transpose into K, Aeqk into preY.
        // ===================================================================
        if let Some(aeq) = aeq.filter(|_| m > 0) {
            for (val, (row, col)) in aeq.iter() {
                let v = val.as_f64();
                let lag = layout.lagrange_row(row);
                match partition.slot(col) {
                    Slot::Unknown(c) => {
                        kkt.add_triplet(lag, c, v);
                        kkt.add_triplet(c, lag, v);
                    }
                    Slot::Known(c) => pre_y.add_triplet(lag, c, v),
                }
            }
        }

        let matrix: SparseCsc = kkt.to_csc();
        let pre_y: SparseCsc = pre_y.to_csc();

        // The constraint blocks mirror each other, so any asymmetry is in Auu,
        // and the tolerance scales with Auu alone.
        let max_asymmetry = sparse::max_abs_asymmetry(&matrix);
        let scale = matrix
            .iter()
            .filter(|&(_, (row, col))| row < nu && col < nu)
            .fold(1.0_f64, |acc, (v, _)| acc.max(v.abs()));
        let symmetric = max_asymmetry <= symmetry_tol * scale;

        debug!(
            "assembled KKT: unknown={} known={} constraints={} nnz={} pre_y nnz={} symmetric={} (asym {:.3e})",
            nu,
            nk,
            m,
            matrix.nnz(),
            pre_y.nnz(),
            symmetric,
            max_asymmetry
        );

        Ok(Self {
            matrix,
            pre_y,
            num_unknown: nu,
            num_constraints: m,
            max_asymmetry,
            symmetric,
        })
    }

    /// Full (both triangles) KKT matrix.
    pub fn matrix(&self) -> &SparseCsc {
        &self.matrix
    }

    pub fn pre_y(&self) -> &SparseCsc {
        &self.pre_y
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    pub fn max_asymmetry(&self) -> f64 {
        self.max_asymmetry
    }

    pub fn num_constraints(&self) -> usize {
        self.num_constraints
    }

    pub fn dim(&self) -> usize {
        self.num_unknown + self.num_constraints
    }

    pub(crate) fn into_pre_y(self) -> SparseCsc {
        self.pre_y
    }
}
