//! End-to-end tests for precompute + solve.

use float_eq::assert_float_eq;
use ndarray::{array, Array2};
use quadfix_core::linalg::sparse::{self, SparseCsc};
use quadfix_core::{
    min_quad_with_fixed, precompute, precompute_with_settings, solve, ErrorKind,
    PrecomputeSettings, SolverKind,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn no_rows(cols: usize) -> Array2<f64> {
    Array2::zeros((0, cols))
}

/// 1-D path graph Laplacian: Z'LZ = sum (z_i - z_{i+1})^2
fn path_laplacian(n: usize) -> SparseCsc {
    let mut triplets = Vec::new();
    for i in 0..n - 1 {
        triplets.push((i, i, 1.0));
        triplets.push((i + 1, i + 1, 1.0));
        triplets.push((i, i + 1, -1.0));
        triplets.push((i + 1, i, -1.0));
    }
    sparse::from_triplets(n, n, triplets)
}

fn assert_column(z: &Array2<f64>, col: usize, expected: &[f64], tol: f64) {
    assert_eq!(z.nrows(), expected.len());
    for (i, &e) in expected.iter().enumerate() {
        assert_float_eq!(z[[i, col]], e, abs <= tol);
    }
}

#[test]
fn test_fixed_value_with_diagonal_energy() {
    init_logger();

    // n = 3, A = diag(2, 2, 2), B = 0, Z(0) = 5
    let a = sparse::from_triplets(3, 3, (0..3).map(|i| (i, i, 2.0)));
    let data = precompute(&a, &[0], None, true).expect("precompute failed");
    assert_eq!(data.solver_kind(), SolverKind::Cholesky);

    let b = Array2::<f64>::zeros((3, 1));
    let y = array![[5.0]];
    let z = solve(&data, b.view(), y.view(), no_rows(1).view()).expect("solve failed");

    assert_eq!(z, array![[5.0], [0.0], [0.0]]);
}

#[test]
fn test_sum_constraint_via_ldl() {
    init_logger();

    // min z0^2 + z1^2 s.t. z0 + z1 = 1
    let a = sparse::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 1, 1.0)]);
    let aeq = sparse::from_triplets(1, 2, vec![(0, 0, 1.0), (0, 1, 1.0)]);
    let data = precompute(&a, &[], Some(&aeq), true).expect("precompute failed");
    assert_eq!(data.solver_kind(), SolverKind::Ldl);
    assert_eq!(data.lagrange(), &[2]);
    assert_eq!(data.unknown_lagrange(), &[0, 1, 2]);

    let b = Array2::<f64>::zeros((2, 1));
    let beq = array![[1.0]];
    let sol = data
        .solve_full(b.view(), no_rows(1).view(), beq.view())
        .expect("solve failed");

    assert_column(&sol.z, 0, &[0.5, 0.5], 1e-12);
    // 2 z + mu = 0  ->  mu = -1
    assert_float_eq!(sol.lagrange[[0, 0]], -1.0, abs <= 1e-12);
}

#[test]
fn test_harmonic_interpolation_on_path() {
    init_logger();

    // Fixing both ends of a path makes the minimizer a straight line.
    let a = path_laplacian(5);
    let data = precompute(&a, &[4, 0], None, true).expect("precompute failed");
    assert_eq!(data.solver_kind(), SolverKind::Cholesky);
    assert_eq!(data.unknown(), &[1, 2, 3]);

    let b = Array2::<f64>::zeros((5, 1));
    let y = array![[4.0], [0.0]];
    let z = solve(&data, b.view(), y.view(), no_rows(1).view()).expect("solve failed");

    assert_column(&z, 0, &[0.0, 1.0, 2.0, 3.0, 4.0], 1e-10);
}

#[test]
fn test_known_values_are_copied_exactly() {
    init_logger();

    let a = path_laplacian(6);
    let aeq = sparse::from_triplets(1, 6, vec![(0, 1, 1.0), (0, 2, 1.0), (0, 5, 1.0)]);
    let data = precompute(&a, &[3, 0], Some(&aeq), true).expect("precompute failed");

    let b = array![
        [0.1, -1.0],
        [0.2, 0.0],
        [0.3, 2.0],
        [0.4, 0.0],
        [0.5, 1.0],
        [0.6, 0.0]
    ];
    let y = array![[1.0 / 3.0, -7.25], [std::f64::consts::PI, 1e-300]];
    let beq = array![[2.0, -1.0]];
    let z = solve(&data, b.view(), y.view(), beq.view()).expect("solve failed");

    for j in 0..2 {
        assert_eq!(z[[3, j]].to_bits(), y[[0, j]].to_bits());
        assert_eq!(z[[0, j]].to_bits(), y[[1, j]].to_bits());
    }

    // Aeq Z = Beq
    for j in 0..2 {
        let lhs = z[[1, j]] + z[[2, j]] + z[[5, j]];
        assert_float_eq!(lhs, beq[[0, j]], abs <= 1e-10);
    }
}

#[test]
fn test_constraint_touching_known_variable() {
    init_logger();

    // min z0^2 + z1^2 (+ z2^2) with z2 = 1 and z0 + z2 = 3 -> z = [2, 0, 1]
    let a = sparse::from_triplets(3, 3, (0..3).map(|i| (i, i, 1.0)));
    let aeq = sparse::from_triplets(1, 3, vec![(0, 0, 1.0), (0, 2, 1.0)]);
    let b = Array2::<f64>::zeros((3, 1));
    let y = array![[1.0]];
    let beq = array![[3.0]];

    let z = min_quad_with_fixed(&a, b.view(), &[2], y.view(), Some(&aeq), beq.view(), true)
        .expect("solve failed");

    assert_column(&z, 0, &[2.0, 0.0, 1.0], 1e-12);
}

#[test]
fn test_linear_term_shifts_minimizer() {
    init_logger();

    // min z0^2 + z1^2 - 2 z0 + 4 z1 -> z = [1, -2]
    let a = sparse::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 1, 1.0)]);
    let data = precompute(&a, &[], None, true).expect("precompute failed");

    let z = data.solve_vec(&[-2.0, 4.0], &[], &[]).expect("solve failed");
    assert_float_eq!(z[0], 1.0, abs <= 1e-12);
    assert_float_eq!(z[1], -2.0, abs <= 1e-12);
}

#[test]
fn test_row_major_inputs_match_column_major() {
    init_logger();

    let a = sparse::from_triplets(
        3,
        3,
        vec![
            (0, 0, 2.0), (0, 1, -1.0),
            (1, 0, -1.0), (1, 1, 3.0), (1, 2, 0.5),
            (2, 1, 0.5), (2, 2, 4.0),
        ],
    );
    let aeq = sparse::from_triplets(1, 3, vec![(0, 1, 1.0), (0, 2, 2.0)]);
    let b = array![[1.0], [0.0], [-1.0]];
    let y = array![[0.5]];
    let beq = array![[0.75]];

    let csc = precompute(&a, &[0], Some(&aeq), true).unwrap();
    let z_csc = csc.solve(b.view(), y.view(), beq.view()).unwrap();

    let a_csr = a.to_csr();
    let aeq_csr = aeq.to_csr();
    assert!(a_csr.is_csr());
    let csr = precompute(&a_csr, &[0], Some(&aeq_csr), true).unwrap();
    let z_csr = csr.solve(b.view(), y.view(), beq.view()).unwrap();

    assert_eq!(csc.solver_kind(), csr.solver_kind());
    assert_eq!(z_csc, z_csr);
    assert_float_eq!(z_csr[[1, 0]] + 2.0 * z_csr[[2, 0]], 0.75, abs <= 1e-12);
}

#[test]
fn test_solver_selection() {
    init_logger();

    let a = path_laplacian(4);
    let aeq = sparse::from_triplets(1, 4, vec![(0, 1, 1.0), (0, 2, -1.0)]);

    let chol = precompute(&a, &[0], None, true).unwrap();
    assert_eq!(chol.solver_kind(), SolverKind::Cholesky);
    assert!(chol.is_positive_definite());

    let ldl = precompute(&a, &[0], None, false).unwrap();
    assert_eq!(ldl.solver_kind(), SolverKind::Ldl);

    let saddle = precompute(&a, &[0], Some(&aeq), true).unwrap();
    assert_eq!(saddle.solver_kind(), SolverKind::Ldl);

    let saddle_lu = precompute(&a, &[0], Some(&aeq), false).unwrap();
    assert_eq!(saddle_lu.solver_kind(), SolverKind::Lu);

    // Every path agrees on the answer.
    let b = array![[0.0], [1.0], [-1.0], [0.5]];
    let y = array![[2.0]];
    let z_chol = chol.solve(b.view(), y.view(), no_rows(1).view()).unwrap();
    let z_ldl = ldl.solve(b.view(), y.view(), no_rows(1).view()).unwrap();
    for i in 0..4 {
        assert_float_eq!(z_chol[[i, 0]], z_ldl[[i, 0]], abs <= 1e-10);
    }

    let beq = array![[0.25]];
    let z_ldl = saddle.solve(b.view(), y.view(), beq.view()).unwrap();
    let z_lu = saddle_lu.solve(b.view(), y.view(), beq.view()).unwrap();
    for i in 0..4 {
        assert_float_eq!(z_ldl[[i, 0]], z_lu[[i, 0]], abs <= 1e-10);
    }
    assert_float_eq!(z_lu[[1, 0]] - z_lu[[2, 0]], 0.25, abs <= 1e-10);
}

#[test]
fn test_nonsymmetric_uses_lu() {
    init_logger();

    // A = [[2, 1], [0, 2]], B = [-2, -4]: A z = -B/2 = [1, 2] -> z = [0, 1]
    let a = sparse::from_triplets(2, 2, vec![(0, 0, 2.0), (0, 1, 1.0), (1, 1, 2.0)]);
    let data = precompute(&a, &[], None, false).expect("precompute failed");

    assert!(!data.is_symmetric());
    assert_eq!(data.solver_kind(), SolverKind::Lu);

    let z = data.solve_vec(&[-2.0, -4.0], &[], &[]).expect("solve failed");
    assert_float_eq!(z[0], 0.0, abs <= 1e-12);
    assert_float_eq!(z[1], 1.0, abs <= 1e-12);
}

#[test]
fn test_singular_with_pd_flag_fails() {
    init_logger();

    let a = sparse::from_triplets(2, 2, vec![(0, 0, 1.0), (0, 1, 1.0), (1, 0, 1.0), (1, 1, 1.0)]);
    let err = precompute(&a, &[], None, true).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Factorization);
}

#[test]
fn test_fallback_chain_after_cholesky_failure() {
    init_logger();

    // Indefinite but non-singular: Cholesky fails, LDL succeeds.
    let a = sparse::from_triplets(2, 2, vec![(0, 0, 1.0), (1, 1, -1.0)]);
    assert_eq!(
        precompute(&a, &[], None, true).unwrap_err().kind(),
        ErrorKind::Factorization
    );

    let settings = PrecomputeSettings {
        solver: Some(SolverKind::Ldl),
        ..Default::default()
    };
    let data = precompute_with_settings(&a, &[], None, true, &settings).unwrap();
    assert_eq!(data.solver_kind(), SolverKind::Ldl);

    // Stationary point of z0^2 - z1^2 + 2 z0 + 2 z1 is [-1, 1].
    let z = data.solve_vec(&[2.0, 2.0], &[], &[]).unwrap();
    assert_float_eq!(z[0], -1.0, abs <= 1e-12);
    assert_float_eq!(z[1], 1.0, abs <= 1e-12);
}

#[test]
fn test_determinism_and_idempotent_precompute() {
    init_logger();

    let a = path_laplacian(8);
    let aeq = sparse::from_triplets(2, 8, vec![(0, 2, 1.0), (0, 5, 1.0), (1, 6, 1.0)]);
    let known = [7, 0];
    let b = Array2::from_shape_fn((8, 3), |(i, j)| (i as f64 - 3.5) * (j as f64 + 1.0));
    let y = array![[1.0, 2.0, 3.0], [-1.0, 0.0, 1.0]];
    let beq = array![[0.5, 1.0, 1.5], [0.0, -2.0, 2.0]];

    let first = precompute(&a, &known, Some(&aeq), true).unwrap();
    let second = precompute(&a, &known, Some(&aeq), true).unwrap();

    let z1 = first.solve(b.view(), y.view(), beq.view()).unwrap();
    let z2 = first.solve(b.view(), y.view(), beq.view()).unwrap();
    let z3 = second.solve(b.view(), y.view(), beq.view()).unwrap();

    assert_eq!(z1, z2);
    assert_eq!(z1, z3);
}

#[test]
fn test_batched_columns_match_single_columns() {
    init_logger();

    let a = path_laplacian(6);
    let data = precompute(&a, &[0, 5], None, true).unwrap();

    let b = Array2::from_shape_fn((6, 2), |(i, j)| if j == 0 { i as f64 } else { -(i as f64) });
    let y = array![[0.0, 1.0], [1.0, -1.0]];
    let batched = data.solve(b.view(), y.view(), no_rows(2).view()).unwrap();

    for j in 0..2 {
        let bj = b.column(j).to_vec();
        let yj = y.column(j).to_vec();
        let single = data.solve_vec(&bj, &yj, &[]).unwrap();
        for i in 0..6 {
            assert_float_eq!(batched[[i, j]], single[i], abs <= 1e-12);
        }
    }
}

#[test]
fn test_malformed_inputs() {
    init_logger();

    let a = path_laplacian(3);

    let err = precompute(&a, &[3], None, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    let err = precompute(&a, &[1, 1], None, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    let aeq = sparse::from_triplets(1, 2, vec![(0, 0, 1.0)]);
    let err = precompute(&a, &[], Some(&aeq), true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    let data = precompute(&a, &[0], None, true).unwrap();
    let b = Array2::<f64>::zeros((3, 2));
    let y = Array2::<f64>::zeros((1, 3));
    let err = data.solve(b.view(), y.view(), no_rows(2).view()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);

    let aeq = sparse::from_triplets(1, 3, vec![(0, 1, 1.0)]);
    let constrained = precompute(&a, &[0], Some(&aeq), true).unwrap();
    let y = Array2::<f64>::zeros((1, 2));
    let err = constrained
        .solve(b.view(), y.view(), no_rows(2).view())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedInput);
}

#[test]
fn test_single_precision() {
    init_logger();

    let a = sparse::from_triplets_as::<f32, _>(3, 3, (0..3).map(|i| (i, i, 2.0f32)));
    let data = precompute(&a, &[0], None, true).expect("precompute failed");

    let z = data
        .solve_vec(&[0.0f32, -4.0, 2.0], &[5.0f32], &[])
        .expect("solve failed");

    assert_eq!(z[0], 5.0f32);
    assert_float_eq!(z[1], 1.0f32, abs <= 1e-6);
    assert_float_eq!(z[2], -0.5f32, abs <= 1e-6);
}
