//! Lagrange multiplier bookkeeping for `Aeq * Z = Beq`.

use sprs::CsMat;

use crate::error::{QuadError, QuadResult};
use crate::partition::VariablePartition;

/// Row/column ordering of the solve space: unknowns first, then one
/// multiplier per constraint row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintLayout {
    /// Synthetic indices `n..n + m`, one per row of `Aeq`.
    lagrange: Vec<usize>,
    /// `unknown` followed by `lagrange`.
    unknown_lagrange: Vec<usize>,
    num_unknown: usize,
}

impl ConstraintLayout {
    /// A missing `Aeq` and an `Aeq` with zero rows both mean "no constraints".
    pub fn new<T>(partition: &VariablePartition, aeq: Option<&CsMat<T>>) -> QuadResult<Self> {
        let n = partition.n();
        let m = aeq.map_or(0, |a| a.rows());

        if let Some(aeq) = aeq {
            if m > 0 && aeq.cols() != n {
                return Err(QuadError::DimensionMismatch {
                    what: "Aeq",
                    expected: (m, n),
                    actual: (aeq.rows(), aeq.cols()),
                });
            }
        }

        let lagrange: Vec<usize> = (n..n + m).collect();
        let unknown_lagrange = partition
            .unknown()
            .iter()
            .chain(lagrange.iter())
            .copied()
            .collect();

        Ok(Self {
            lagrange,
            unknown_lagrange,
            num_unknown: partition.num_unknown(),
        })
    }

    pub fn num_constraints(&self) -> usize {
        self.lagrange.len()
    }

    pub fn is_constrained(&self) -> bool {
        !self.lagrange.is_empty()
    }

    pub fn lagrange(&self) -> &[usize] {
        &self.lagrange
    }

    pub fn unknown_lagrange(&self) -> &[usize] {
        &self.unknown_lagrange
    }

    /// Local row of constraint `row` in the solve space.
    pub fn lagrange_row(&self, row: usize) -> usize {
        self.num_unknown + row
    }

    /// `|unknown| + m`
    pub fn solve_dim(&self) -> usize {
        self.unknown_lagrange.len()
    }
}
