//! Sparse matrix types and helpers.
//!
//! The assembled KKT matrix and the `preY` operator are kept in CSC form with
//! `f64` values, which is what the factorization backends consume.

use sprs::{CsMat, TriMat};

use crate::scalar::Scalar;

/// Sparse matrix in CSC format (general, not necessarily symmetric).
pub type SparseCsc = CsMat<f64>;

/// Build a sparse CSC matrix from triplets (row, col, value).
///
/// Duplicate entries are summed.
pub fn from_triplets<I>(nrows: usize, ncols: usize, triplets: I) -> SparseCsc
where
    I: IntoIterator<Item = (usize, usize, f64)>,
{
    let mut tri = TriMat::new((nrows, ncols));
    for (i, j, v) in triplets {
        tri.add_triplet(i, j, v);
    }
    tri.to_csc()
}

/// Build a CSC matrix of any supported scalar type from triplets.
///
/// Mostly useful to callers assembling `A` and `Aeq` in `f32`.
pub fn from_triplets_as<T, I>(nrows: usize, ncols: usize, triplets: I) -> CsMat<T>
where
    T: Scalar,
    I: IntoIterator<Item = (usize, usize, T)>,
{
    let mut tri = TriMat::new((nrows, ncols));
    for (i, j, v) in triplets {
        tri.add_triplet(i, j, v);
    }
    tri.to_csc()
}

/// Keep only the entries with `row <= col`.
pub fn upper_triangle(a: &SparseCsc) -> SparseCsc {
    let mut tri = TriMat::new((a.rows(), a.cols()));
    for (val, (row, col)) in a.iter() {
        if row <= col {
            tri.add_triplet(row, col, *val);
        }
    }
    tri.to_csc()
}

/// Largest absolute stored value, 0 for an empty matrix.
pub fn max_abs(a: &SparseCsc) -> f64 {
    a.data().iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
}

/// Largest entry of `|A - A^T|` for a square matrix.
pub fn max_abs_asymmetry(a: &SparseCsc) -> f64 {
    debug_assert_eq!(a.rows(), a.cols(), "asymmetry is only defined for square matrices");

    let mut tri = TriMat::new((a.rows(), a.cols()));
    for (val, (row, col)) in a.iter() {
        if row != col {
            tri.add_triplet(row, col, *val);
            tri.add_triplet(col, row, -*val);
        }
    }
    let diff: SparseCsc = tri.to_csc();
    max_abs(&diff)
}

/// Dense product accumulation `y[:, j] += alpha * A * x[:, j]` for every column.
///
/// `x` is read through a closure so the caller can feed any dense container.
pub fn spmm_acc<F>(a: &SparseCsc, x: F, cols: usize, y: &mut faer::Mat<f64>, alpha: f64)
where
    F: Fn(usize, usize) -> f64,
{
    debug_assert_eq!(a.rows(), y.nrows());
    debug_assert_eq!(cols, y.ncols());

    if alpha == 0.0 {
        return;
    }
    for (val, (row, col)) in a.iter() {
        for j in 0..cols {
            y[(row, j)] += alpha * (*val) * x(col, j);
        }
    }
}
