//! Faer sparse LDLᵀ backend for symmetric indefinite and saddle-point systems.
//!
//! The factorization does not pivot, so elimination order matters: a zero
//! diagonal in the Lagrange block must never be eliminated before the
//! quadratic block that fills it in. The matrix is therefore permuted up
//! front with an AMD ordering of the leading block followed by the trailing
//! block in natural order, and faer is told to keep that ordering.

use faer::dyn_stack::{MemBuffer, MemStack};
use faer::linalg::cholesky::ldlt::factor::{LdltParams, LdltRegularization};
use faer::sparse::linalg::amd;
use faer::sparse::linalg::cholesky::{
    factorize_symbolic_cholesky, CholeskySymbolicParams, LdltRef, SymbolicCholesky,
    SymmetricOrdering,
};
use faer::sparse::linalg::SupernodalThreshold;
use faer::sparse::{SparseColMatRef, SymbolicSparseColMatRef};
use faer::{Conj, Mat, Par, Side, Spec};
use log::{debug, warn};

use crate::linalg::backend::{
    check_rhs, check_square, probe_nonsingular, BackendError, FactorBackend, FactorOptions,
};
use crate::linalg::sparse::{self, SparseCsc};

/// Faer LDLᵀ backend.
pub struct FaerLdlBackend {
    n: usize,

    // Permutation applied before factorization (new index -> old index)
    perm: Vec<usize>,

    // Symbolic factorization of the permuted upper triangle
    symbolic: Option<SymbolicCholesky<usize>>,

    // Numeric factor values
    ld_vals: Vec<f64>,

    parallelism: Par,
}

impl FaerLdlBackend {
    /// Permute symmetric matrix PAP' using inverse permutation.
    ///
    /// Input and output both hold the upper triangle only; output columns are
    /// sorted by row index as faer requires.
    fn permute_symmetric(
        colptr: &[usize],
        rowval: &[usize],
        nzval: &[f64],
        iperm: &[usize],
    ) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
        let n = colptr.len() - 1;
        let nnz = nzval.len();

        // Count entries per column in permuted matrix
        let mut col_counts = vec![0usize; n];
        for (old_row, old_col) in iter_csc(colptr, rowval) {
            let nc = iperm[old_row].max(iperm[old_col]);
            col_counts[nc] += 1;
        }

        let mut new_colptr = vec![0usize; n + 1];
        for i in 0..n {
            new_colptr[i + 1] = new_colptr[i] + col_counts[i];
        }

        let mut new_rowval = vec![0usize; nnz];
        let mut new_nzval = vec![0.0; nnz];

        col_counts.fill(0);
        for (orig_idx, (old_row, old_col)) in iter_csc(colptr, rowval).enumerate() {
            let new_row = iperm[old_row];
            let new_col = iperm[old_col];
            let (nr, nc) = if new_row <= new_col {
                (new_row, new_col)
            } else {
                (new_col, new_row)
            };
            let pos = new_colptr[nc] + col_counts[nc];
            new_rowval[pos] = nr;
            new_nzval[pos] = nzval[orig_idx];
            col_counts[nc] += 1;
        }

        // Sort each column by row index
        let mut column: Vec<(usize, f64)> = Vec::new();
        for c in 0..n {
            let start = new_colptr[c];
            let end = new_colptr[c + 1];
            if end - start <= 1 {
                continue;
            }
            column.clear();
            column.extend((start..end).map(|i| (new_rowval[i], new_nzval[i])));
            column.sort_by_key(|&(row, _)| row);
            for (i, &(row, val)) in column.iter().enumerate() {
                new_rowval[start + i] = row;
                new_nzval[start + i] = val;
            }
        }

        (new_colptr, new_rowval, new_nzval)
    }

    /// AMD on the leading `head` block, trailing block appended in order.
    ///
    /// Falls back to the identity if faer's AMD rejects the pattern.
    fn compute_block_ordering(upper: &SparseCsc, head: usize) -> (Vec<usize>, Vec<usize>) {
        let n = upper.cols();
        let identity = || {
            let perm: Vec<usize> = (0..n).collect();
            (perm.clone(), perm)
        };
        if head <= 1 {
            return identity();
        }

        // Leading block pattern
        let mut head_colptr = Vec::with_capacity(head + 1);
        let mut head_rowval = Vec::new();
        head_colptr.push(0);
        for col in 0..head {
            if let Some(view) = upper.outer_view(col) {
                head_rowval.extend(view.indices().iter().copied().filter(|&row| row < head));
            }
            head_colptr.push(head_rowval.len());
        }

        let pattern = SymbolicSparseColMatRef::new_checked(head, head, &head_colptr, None, &head_rowval);

        let mut head_perm = vec![0usize; head];
        let mut head_iperm = vec![0usize; head];
        let mut work = MemBuffer::new(amd::order_scratch::<usize>(head, head_rowval.len()));
        let ordered = amd::order(
            &mut head_perm,
            &mut head_iperm,
            pattern,
            amd::Control::default(),
            MemStack::new(&mut work),
        );

        match ordered {
            Ok(_) => {
                let mut perm = head_perm;
                perm.extend(head..n);
                let mut iperm = vec![0usize; n];
                for (new, &old) in perm.iter().enumerate() {
                    iperm[old] = new;
                }
                (perm, iperm)
            }
            Err(e) => {
                warn!("AMD ordering failed ({:?}), using natural order", e);
                identity()
            }
        }
    }
}

/// Iterate over (row, col) pairs in a CSC matrix.
fn iter_csc<'a>(
    colptr: &'a [usize],
    rowval: &'a [usize],
) -> impl Iterator<Item = (usize, usize)> + 'a {
    let n = colptr.len() - 1;
    (0..n).flat_map(move |col| {
        let start = colptr[col];
        let end = colptr[col + 1];
        rowval[start..end].iter().map(move |&row| (row, col))
    })
}

impl FactorBackend for FaerLdlBackend {
    fn factorize(kkt: &SparseCsc, options: &FactorOptions) -> Result<Self, BackendError> {
        let n = check_square(kkt)?;
        let parallelism = options.parallelism;
        if n == 0 {
            return Ok(Self {
                n,
                perm: Vec::new(),
                symbolic: None,
                ld_vals: Vec::new(),
                parallelism,
            });
        }

        let upper = sparse::upper_triangle(kkt);
        let head = n.saturating_sub(options.trailing_block);
        let (perm, iperm) = Self::compute_block_ordering(&upper, head);

        let indptr = upper.indptr();
        let colptr = indptr.raw_storage();
        let (perm_colptr, perm_rowval, perm_nzval) =
            Self::permute_symmetric(colptr, upper.indices(), upper.data(), &iperm);

        let symb_mat = SymbolicSparseColMatRef::new_checked(n, n, &perm_colptr, None, &perm_rowval);

        let cholesky_params = CholeskySymbolicParams {
            supernodal_flop_ratio_threshold: SupernodalThreshold::AUTO,
            amd_params: amd::Control::default(),
            ..Default::default()
        };

        let symbolic = factorize_symbolic_cholesky(
            symb_mat,
            Side::Upper,
            SymmetricOrdering::Identity, // We've already permuted
            cholesky_params,
        )
        .map_err(|e| BackendError::Message(format!("faer symbolic factorization failed: {:?}", e)))?;

        let mut ld_vals = vec![0.0; symbolic.len_val()];
        let ldlt_params: Spec<LdltParams, f64> = Spec::default();
        let mut work =
            MemBuffer::new(symbolic.factorize_numeric_ldlt_scratch::<f64>(parallelism, ldlt_params));

        // No dynamic regularization: a zero pivot means the system is singular.
        let regularizer = LdltRegularization {
            dynamic_regularization_signs: None,
            dynamic_regularization_delta: 0.0,
            dynamic_regularization_epsilon: 0.0,
        };

        let mat = SparseColMatRef::new(symb_mat, &perm_nzval);
        symbolic
            .factorize_numeric_ldlt(
                &mut ld_vals,
                mat,
                Side::Upper,
                regularizer,
                parallelism,
                MemStack::new(&mut work),
                ldlt_params,
            )
            .map_err(|e| BackendError::Message(format!("faer numeric factorization failed: {:?}", e)))?;

        if ld_vals.iter().any(|v| !v.is_finite()) {
            return Err(BackendError::Singular);
        }

        debug!(
            "LDL factorized: n={} head={} factor values={}",
            n,
            head,
            ld_vals.len()
        );

        let backend = Self {
            n,
            perm,
            symbolic: Some(symbolic),
            ld_vals,
            parallelism,
        };
        probe_nonsingular(&backend)?;
        Ok(backend)
    }

    fn dim(&self) -> usize {
        self.n
    }

    fn solve_in_place(&self, rhs: &mut Mat<f64>) -> Result<(), BackendError> {
        check_rhs(self.n, rhs)?;
        let symbolic = match self.symbolic.as_ref() {
            Some(s) => s,
            None => return Ok(()),
        };
        let cols = rhs.ncols();

        // Permute RHS: permuted[i] = rhs[perm[i]]
        let mut permuted = Mat::<f64>::zeros(self.n, cols);
        for j in 0..cols {
            for (i, &p) in self.perm.iter().enumerate() {
                permuted[(i, j)] = rhs[(p, j)];
            }
        }

        // Scratch is local so that concurrent solves share no state.
        let ldlt = LdltRef::new(symbolic, &self.ld_vals);
        let mut work = MemBuffer::new(symbolic.solve_in_place_scratch::<f64>(cols, self.parallelism));
        ldlt.solve_in_place_with_conj(
            Conj::No,
            permuted.as_mut(),
            self.parallelism,
            MemStack::new(&mut work),
        );

        // Inverse permute: rhs[perm[i]] = permuted[i]
        for j in 0..cols {
            for (i, &p) in self.perm.iter().enumerate() {
                rhs[(p, j)] = permuted[(i, j)];
            }
        }
        Ok(())
    }
}
