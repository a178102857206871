//! The factorization record and the solve phase.

use std::marker::PhantomData;

use faer::Mat;
use log::{debug, trace, warn};
use ndarray::{Array2, ArrayView1, ArrayView2, Axis};
use sprs::CsMat;

use crate::constraints::ConstraintLayout;
use crate::diagnostics::Diagnostics;
use crate::error::{check_shape, QuadError, QuadResult};
use crate::linalg::backend::{BackendError, FactorOptions, Factorization};
use crate::linalg::kkt::KktSystem;
use crate::linalg::sparse::{self, SparseCsc};
use crate::partition::VariablePartition;
use crate::scalar::Scalar;
use crate::select::SolverKind;
use crate::settings::PrecomputeSettings;

/// Output of [`MinQuadData::solve_full`].
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<T> {
    /// n × cols minimizer; known rows are the caller's `Y` verbatim.
    pub z: Array2<T>,
    /// m × cols multipliers `mu` of `Z'AZ + Z'B + mu'(Aeq Z - Beq)`.
    pub lagrange: Array2<T>,
}

/// Everything a solve needs, computed once from `A`, `known` and `Aeq`.
///
/// `A` and `Aeq` are not referenced after [`MinQuadData::precompute`]
/// returns. The record must be rebuilt if any of them change.
///
/// Solving takes `&self` and allocates its own scratch space, so solves
/// against one record never share mutable state.
#[derive(Debug)]
pub struct MinQuadData<T> {
    partition: VariablePartition,
    layout: ConstraintLayout,
    /// Maps known values into the solve space: `[Auk; Aeqk]`
    pre_y: SparseCsc,
    positive_definite: bool,
    symmetric: bool,
    factorization: Factorization,
    diagnostics: Option<Diagnostics>,
    _scalar: PhantomData<fn() -> T>,
}

impl<T: Scalar> MinQuadData<T> {
    /// Partition, assemble, select a factorization and factor.
    ///
    /// # Arguments
    ///
    /// * `a` - n×n quadratic coefficients
    /// * `known` - indices fixed at solve time; row `i` of `Y` belongs to `known[i]`
    /// * `aeq` - m×n equality constraints, `None` for m = 0
    /// * `positive_definite` - whether `A(unknown, unknown)` is positive definite
    pub fn precompute(
        a: &CsMat<T>,
        known: &[usize],
        aeq: Option<&CsMat<T>>,
        positive_definite: bool,
        settings: &PrecomputeSettings,
    ) -> QuadResult<Self> {
        let partition = VariablePartition::new(a.rows(), known)?;
        let layout = ConstraintLayout::new(&partition, aeq)?;
        let system = KktSystem::assemble(a, aeq, &partition, &layout, settings.symmetry_tol)?;
        let symmetric = system.is_symmetric();

        if positive_definite && !symmetric {
            warn!(
                "A(unknown, unknown) declared positive definite but is not symmetric (asym {:.3e})",
                system.max_asymmetry()
            );
        }

        let kind = settings.solver.unwrap_or_else(|| {
            SolverKind::select(positive_definite, symmetric, layout.is_constrained())
        });
        if kind.requires_symmetry() && !symmetric {
            return Err(QuadError::Factorization {
                solver: kind,
                source: BackendError::NotSymmetric,
            });
        }

        debug!(
            "precompute: n={} known={} constraints={} system={}x{} pd={} symmetric={} solver={}",
            partition.n(),
            partition.num_known(),
            layout.num_constraints(),
            system.dim(),
            system.dim(),
            positive_definite,
            symmetric,
            kind
        );

        let options = FactorOptions {
            parallelism: settings.parallelism(),
            trailing_block: system.num_constraints(),
        };
        let factorization = Factorization::factorize(kind, system.matrix(), &options)
            .map_err(|source| QuadError::Factorization { solver: kind, source })?;

        let diagnostics = settings.keep_diagnostics.then(|| Diagnostics::new(&system));

        Ok(Self {
            partition,
            layout,
            pre_y: system.into_pre_y(),
            positive_definite,
            symmetric,
            factorization,
            diagnostics,
            _scalar: PhantomData,
        })
    }

    /// Minimizer for one or more right-hand-side columns.
    ///
    /// * `b` - n × cols linear coefficients
    /// * `y` - |known| × cols fixed values
    /// * `beq` - m × cols constraint targets
    ///
    /// When there are no known variables (or no constraints) `y` (or `beq`)
    /// may be any array with zero rows.
    pub fn solve(
        &self,
        b: ArrayView2<'_, T>,
        y: ArrayView2<'_, T>,
        beq: ArrayView2<'_, T>,
    ) -> QuadResult<Array2<T>> {
        self.solve_full(b, y, beq).map(|sol| sol.z)
    }

    /// Like [`MinQuadData::solve`] but also returns the Lagrange multipliers.
    pub fn solve_full(
        &self,
        b: ArrayView2<'_, T>,
        y: ArrayView2<'_, T>,
        beq: ArrayView2<'_, T>,
    ) -> QuadResult<Solution<T>> {
        let cols = self.check_inputs(&b, &y, &beq)?;
        let mut rhs = self.build_rhs(&b, &y, &beq, cols);

        self.factorization
            .solve_in_place(&mut rhs)
            .map_err(QuadError::Solve)?;

        for j in 0..cols {
            for row in 0..rhs.nrows() {
                if !rhs[(row, j)].is_finite() {
                    return Err(QuadError::NonFiniteSolution { row, col: j });
                }
            }
        }

        let n = self.partition.n();
        let nu = self.partition.num_unknown();
        let mut z = Array2::<T>::zeros((n, cols));
        for (pos, &index) in self.partition.unknown().iter().enumerate() {
            for j in 0..cols {
                z[[index, j]] = T::cast_from_f64(rhs[(pos, j)]);
            }
        }
        // Known rows are copied, never recomputed.
        for (pos, &index) in self.partition.known().iter().enumerate() {
            for j in 0..cols {
                z[[index, j]] = y[[pos, j]];
            }
        }

        // The solve space holds mu / 2.
        let m = self.layout.num_constraints();
        let mut lagrange = Array2::<T>::zeros((m, cols));
        for row in 0..m {
            for j in 0..cols {
                lagrange[[row, j]] = T::cast_from_f64(2.0 * rhs[(nu + row, j)]);
            }
        }

        trace!("solved {} column(s) with {}", cols, self.factorization.kind());
        Ok(Solution { z, lagrange })
    }

    /// Single-column convenience over slices.
    pub fn solve_vec(&self, b: &[T], y: &[T], beq: &[T]) -> QuadResult<Vec<T>> {
        let b = ArrayView1::from(b).insert_axis(Axis(1));
        let y = ArrayView1::from(y).insert_axis(Axis(1));
        let beq = ArrayView1::from(beq).insert_axis(Axis(1));
        let z = self.solve(b, y, beq)?;
        Ok(z.column(0).to_vec())
    }

    /// The right-hand side handed to the factorization, in `unknown_lagrange`
    /// order: `[-B(unknown,:)/2; Beq] - preY * Y`.
    pub fn assemble_rhs(
        &self,
        b: ArrayView2<'_, T>,
        y: ArrayView2<'_, T>,
        beq: ArrayView2<'_, T>,
    ) -> QuadResult<Array2<T>> {
        let cols = self.check_inputs(&b, &y, &beq)?;
        let rhs = self.build_rhs(&b, &y, &beq, cols);
        Ok(Array2::from_shape_fn((rhs.nrows(), cols), |(i, j)| {
            T::cast_from_f64(rhs[(i, j)])
        }))
    }

    /// Validate shapes; returns the shared column count.
    fn check_inputs(
        &self,
        b: &ArrayView2<'_, T>,
        y: &ArrayView2<'_, T>,
        beq: &ArrayView2<'_, T>,
    ) -> QuadResult<usize> {
        let n = self.partition.n();
        let cols = b.ncols();
        check_shape("B", b.dim(), (n, cols))?;

        let nk = self.partition.num_known();
        if !(nk == 0 && y.nrows() == 0) {
            check_shape("Y", y.dim(), (nk, cols))?;
        }

        let m = self.layout.num_constraints();
        if !(m == 0 && beq.nrows() == 0) {
            check_shape("Beq", beq.dim(), (m, cols))?;
        }

        if self.factorization.dim() != self.layout.solve_dim() {
            return Err(QuadError::Solve(BackendError::DimensionMismatch {
                expected: self.layout.solve_dim(),
                actual: self.factorization.dim(),
            }));
        }
        Ok(cols)
    }

    fn build_rhs(
        &self,
        b: &ArrayView2<'_, T>,
        y: &ArrayView2<'_, T>,
        beq: &ArrayView2<'_, T>,
        cols: usize,
    ) -> Mat<f64> {
        let nu = self.partition.num_unknown();
        let m = self.layout.num_constraints();
        let unknown = self.partition.unknown();

        let mut rhs = Mat::<f64>::from_fn(nu + m, cols, |i, j| {
            if i < nu {
                -0.5 * b[[unknown[i], j]].as_f64()
            } else {
                beq[[i - nu, j]].as_f64()
            }
        });

        if self.partition.num_known() > 0 {
            sparse::spmm_acc(&self.pre_y, |k, j| y[[k, j]].as_f64(), cols, &mut rhs, -1.0);
        }
        rhs
    }

    pub fn n(&self) -> usize {
        self.partition.n()
    }

    pub fn known(&self) -> &[usize] {
        self.partition.known()
    }

    pub fn unknown(&self) -> &[usize] {
        self.partition.unknown()
    }

    /// Synthetic indices `n..n + m`.
    pub fn lagrange(&self) -> &[usize] {
        self.layout.lagrange()
    }

    pub fn unknown_lagrange(&self) -> &[usize] {
        self.layout.unknown_lagrange()
    }

    pub fn num_constraints(&self) -> usize {
        self.layout.num_constraints()
    }

    /// `|unknown| + m`
    pub fn solve_dim(&self) -> usize {
        self.layout.solve_dim()
    }

    /// `[Auk; Aeqk]`, (|unknown| + m) × |known|.
    pub fn pre_y(&self) -> &SparseCsc {
        &self.pre_y
    }

    pub fn solver_kind(&self) -> SolverKind {
        self.factorization.kind()
    }

    pub fn is_positive_definite(&self) -> bool {
        self.positive_definite
    }

    pub fn is_symmetric(&self) -> bool {
        self.symmetric
    }

    pub fn diagnostics(&self) -> Option<&Diagnostics> {
        self.diagnostics.as_ref()
    }
}
