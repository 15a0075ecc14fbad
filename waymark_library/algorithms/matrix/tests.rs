use super::*;
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_matrix(rng: &mut StdRng, rows: usize, cols: usize) -> Matrix {
    let data = (0..rows * cols).map(|_| rng.gen_range(-5.0..5.0)).collect();
    Matrix::new(rows, cols, data).unwrap()
}

/// `B^T B + n I` is symmetric positive definite for any `B`
fn random_spd(rng: &mut StdRng, n: usize) -> Matrix {
    let b = random_matrix(rng, n, n);
    b.transpose()
        .multiply(&b)
        .unwrap()
        .add(&Matrix::identity(n).scale(n as f64))
        .unwrap()
}

#[test]
fn test_new_rejects_wrong_length() {
    let err = Matrix::new(2, 3, vec![1.0; 5]).unwrap_err();
    assert!(matches!(
        err,
        MatrixError::DimensionMismatch { op: "new", .. }
    ));
}

#[test]
fn test_from_rows_and_get() {
    let m = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
    assert_eq!(m.rows(), 2);
    assert_eq!(m.cols(), 3);
    assert_eq!(m.get(1, 2), 6.0);
    assert_eq!(m[(0, 1)], 2.0);
    assert_eq!(m.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
}

#[test]
fn test_from_rows_ragged() {
    let rows = vec![vec![1.0, 2.0], vec![3.0]];
    assert!(Matrix::from_rows(&rows).is_err());
}

#[test]
fn test_from_rows_empty() {
    let rows: Vec<Vec<f64>> = Vec::new();
    let m = Matrix::from_rows(&rows).unwrap();
    assert_eq!(m.shape(), Shape { rows: 0, cols: 0 });
}

#[test]
fn test_set_returns_new_matrix() {
    let m = Matrix::zeros(2, 2);
    let updated = m.set(0, 1, 7.0);

    assert_eq!(updated.get(0, 1), 7.0);
    assert_eq!(m.get(0, 1), 0.0);
}

#[test]
#[should_panic]
fn test_get_out_of_bounds_panics() {
    Matrix::zeros(2, 2).get(0, 2);
}

#[test]
fn test_add_sub_scale() {
    let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
    let b = Matrix::from_rows(&[[0.5, 0.5], [1.0, -1.0]]).unwrap();

    let sum = a.add(&b).unwrap();
    assert_eq!(sum, Matrix::from_rows(&[[1.5, 2.5], [4.0, 3.0]]).unwrap());

    let diff = a.sub(&b).unwrap();
    assert_eq!(diff, Matrix::from_rows(&[[0.5, 1.5], [2.0, 5.0]]).unwrap());

    assert_eq!(a.scale(2.0).get(1, 1), 8.0);
}

#[test]
fn test_add_shape_mismatch() {
    let err = Matrix::zeros(2, 2).add(&Matrix::zeros(2, 3)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Dimension mismatch in add: 2x2 vs 2x3"
    );
    assert!(Matrix::zeros(2, 2).sub(&Matrix::zeros(3, 2)).is_err());
}

#[test]
fn test_multiply() {
    let a = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
    let b = Matrix::from_rows(&[[7.0, 8.0], [9.0, 10.0], [11.0, 12.0]]).unwrap();

    let c = a.multiply(&b).unwrap();
    assert_eq!(c, Matrix::from_rows(&[[58.0, 64.0], [139.0, 154.0]]).unwrap());
}

#[test]
fn test_multiply_propagates_non_finite() {
    let a = Matrix::from_rows(&[[0.0, 1.0]]).unwrap();
    let b = Matrix::column_vector(&[f64::INFINITY, 2.0]);
    assert!(a.multiply(&b).unwrap().get(0, 0).is_nan());

    let b = Matrix::column_vector(&[f64::NAN, 2.0]);
    assert!(a.multiply(&b).unwrap().get(0, 0).is_nan());
}

#[test]
fn test_multiply_mismatch() {
    let a = Matrix::zeros(2, 3);
    let err = a.multiply(&Matrix::zeros(2, 3)).unwrap_err();
    assert!(matches!(
        err,
        MatrixError::DimensionMismatch { op: "multiply", .. }
    ));
}

#[test]
fn test_transpose_involution() {
    let mut rng = StdRng::seed_from_u64(7);
    let a = random_matrix(&mut rng, 3, 5);

    assert_eq!(a.transpose().shape(), Shape { rows: 5, cols: 3 });
    assert_eq!(a.transpose().transpose(), a);
}

#[test]
fn test_trace_rectangular() {
    let a = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
    assert_eq!(a.trace(), 6.0);
    assert_eq!(Matrix::identity(4).trace(), 4.0);
}

#[test]
fn test_row_column_norm() {
    let a = Matrix::from_rows(&[[3.0, 0.0], [4.0, 0.0]]).unwrap();
    assert_eq!(a.row(1).data(), &[4.0, 0.0]);
    assert_eq!(a.column(0).data(), &[3.0, 4.0]);
    assert_relative_eq!(a.frobenius_norm(), 5.0);
}

#[test]
fn test_inverse_known() {
    let a = Matrix::from_rows(&[[4.0, 7.0], [2.0, 6.0]]).unwrap();
    let inv = a.inverse().unwrap();

    assert_relative_eq!(inv.get(0, 0), 0.6, epsilon = 1e-12);
    assert_relative_eq!(inv.get(0, 1), -0.7, epsilon = 1e-12);
    assert_relative_eq!(inv.get(1, 0), -0.2, epsilon = 1e-12);
    assert_relative_eq!(inv.get(1, 1), 0.4, epsilon = 1e-12);
}

#[test]
fn test_inverse_needs_pivoting() {
    // Zero in the leading position
    let a = Matrix::from_rows(&[[0.0, 1.0], [1.0, 0.0]]).unwrap();
    let inv = a.inverse().unwrap();
    assert!(inv.approx_eq(&a, 1e-12));
}

#[test]
fn test_inverse_random_products_identity() {
    let mut rng = StdRng::seed_from_u64(42);
    for n in 1..=6 {
        let a = random_spd(&mut rng, n);
        let product = a.multiply(&a.inverse().unwrap()).unwrap();
        assert!(product.approx_eq(&Matrix::identity(n), 1e-8));
    }
}

#[test]
fn test_inverse_does_not_mutate() {
    let a = Matrix::from_rows(&[[2.0, 1.0], [1.0, 3.0]]).unwrap();
    let before = a.clone();
    let _ = a.inverse().unwrap();
    assert_eq!(a, before);
}

#[test]
fn test_inverse_singular() {
    let a = Matrix::from_rows(&[[1.0, 2.0], [2.0, 4.0]]).unwrap();
    let err = a.inverse().unwrap_err();
    assert!(matches!(err, MatrixError::SingularMatrix { .. }));
    assert!(err.to_string().starts_with("Matrix is singular"));
}

#[test]
fn test_inverse_non_square() {
    assert!(matches!(
        Matrix::zeros(2, 3).inverse(),
        Err(MatrixError::DimensionMismatch { op: "inverse", .. })
    ));
}

#[test]
fn test_solve_single_rhs() {
    let a = Matrix::from_rows(&[[2.0, 1.0, -1.0], [-3.0, -1.0, 2.0], [-2.0, 1.0, 2.0]]).unwrap();
    let b = Matrix::column_vector(&[8.0, -11.0, -3.0]);

    let x = a.solve(&b).unwrap();
    assert_relative_eq!(x.get(0, 0), 2.0, epsilon = 1e-10);
    assert_relative_eq!(x.get(1, 0), 3.0, epsilon = 1e-10);
    assert_relative_eq!(x.get(2, 0), -1.0, epsilon = 1e-10);
}

#[test]
fn test_solve_multiple_rhs_random() {
    let mut rng = StdRng::seed_from_u64(3);
    let a = random_spd(&mut rng, 5);
    let b = random_matrix(&mut rng, 5, 3);

    let x = a.solve(&b).unwrap();
    assert!(a.multiply(&x).unwrap().approx_eq(&b, 1e-8));
}

#[test]
fn test_solve_singular() {
    let a = Matrix::from_rows(&[[1.0, 2.0], [2.0, 4.0]]).unwrap();
    let b = Matrix::column_vector(&[1.0, 2.0]);
    assert!(matches!(
        a.solve(&b),
        Err(MatrixError::SingularMatrix { .. })
    ));
}

#[test]
fn test_solve_rhs_mismatch() {
    let a = Matrix::identity(3);
    let b = Matrix::column_vector(&[1.0, 2.0]);
    assert!(matches!(
        a.solve(&b),
        Err(MatrixError::DimensionMismatch { op: "solve", .. })
    ));
}

#[test]
fn test_determinant() {
    let a = Matrix::from_rows(&[[4.0, 7.0], [2.0, 6.0]]).unwrap();
    assert_relative_eq!(a.determinant().unwrap(), 10.0, epsilon = 1e-12);

    // Odd permutation flips the sign
    let swapped = Matrix::from_rows(&[[0.0, 1.0], [1.0, 0.0]]).unwrap();
    assert_relative_eq!(swapped.determinant().unwrap(), -1.0, epsilon = 1e-12);

    let b = Matrix::from_rows(&[[2.0, 0.0, 1.0], [1.0, 3.0, 2.0], [1.0, 1.0, 2.0]]).unwrap();
    assert_relative_eq!(b.determinant().unwrap(), 6.0, epsilon = 1e-12);
}

#[test]
fn test_determinant_singular_is_zero() {
    let a = Matrix::from_rows(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]]).unwrap();
    assert!(a.determinant().unwrap().abs() < 1e-9);
}

#[test]
fn test_cholesky_reconstructs() {
    let mut rng = StdRng::seed_from_u64(11);
    let a = random_spd(&mut rng, 4);
    let l = a.cholesky().unwrap();

    for r in 0..4 {
        for c in (r + 1)..4 {
            assert_eq!(l.get(r, c), 0.0);
        }
    }
    assert!(l.multiply(&l.transpose()).unwrap().approx_eq(&a, 1e-9));
}

#[test]
fn test_cholesky_not_positive_definite() {
    let a = Matrix::from_rows(&[[1.0, 2.0], [2.0, 1.0]]).unwrap();
    let err = a.cholesky().unwrap_err();
    assert!(matches!(err, MatrixError::NotPositiveDefinite { row: 1, .. }));

    let negative = Matrix::from_rows(&[[-1.0]]).unwrap();
    assert!(matches!(
        negative.cholesky(),
        Err(MatrixError::NotPositiveDefinite { row: 0, .. })
    ));
}

#[test]
fn test_eigen_diagonal_sorted_by_magnitude() {
    let a = Matrix::from_diagonal(&[1.0, -5.0, 3.0]);
    let eigen = a.eigen_symmetric().unwrap();

    assert_eq!(eigen.values, vec![-5.0, 3.0, 1.0]);
    assert_relative_eq!(eigen.vectors.get(1, 0).abs(), 1.0);
    assert_relative_eq!(eigen.vectors.get(2, 1).abs(), 1.0);
    assert_relative_eq!(eigen.vectors.get(0, 2).abs(), 1.0);
}

#[test]
fn test_eigen_known_2x2() {
    let a = Matrix::from_rows(&[[2.0, 1.0], [1.0, 2.0]]).unwrap();
    let eigen = a.eigen_symmetric().unwrap();

    assert_relative_eq!(eigen.values[0], 3.0, epsilon = 1e-10);
    assert_relative_eq!(eigen.values[1], 1.0, epsilon = 1e-10);

    let v0 = eigen.vectors.column(0);
    assert_relative_eq!(v0.get(0, 0).abs(), 1.0 / 2f64.sqrt(), epsilon = 1e-10);
    assert_relative_eq!(v0.get(1, 0).abs(), 1.0 / 2f64.sqrt(), epsilon = 1e-10);
}

#[test]
fn test_eigen_satisfies_av_equals_lambda_v() {
    let mut rng = StdRng::seed_from_u64(5);
    let a = random_spd(&mut rng, 5);
    let eigen = a.eigen_symmetric().unwrap();

    for (i, lambda) in eigen.values.iter().enumerate() {
        let v = eigen.vectors.column(i);
        let av = a.multiply(&v).unwrap();
        assert!(av.approx_eq(&v.scale(*lambda), 1e-8));
    }

    // Orthonormal eigenvectors
    let vtv = eigen.vectors.transpose().multiply(&eigen.vectors).unwrap();
    assert!(vtv.approx_eq(&Matrix::identity(5), 1e-9));
}

#[test]
fn test_svd_reconstructs_rectangular() {
    let mut rng = StdRng::seed_from_u64(9);
    for (m, n) in [(4, 3), (3, 3), (5, 2), (2, 5), (3, 6)] {
        let a = random_matrix(&mut rng, m, n);
        let svd = a.svd().unwrap();

        // Wide input drops null-space columns of size ~sqrt(eps)
        let tol = if m < n { 1e-6 } else { 1e-8 };
        assert!(svd.reconstruct().unwrap().approx_eq(&a, tol));
        assert!(svd.singular_values.iter().all(|s| *s >= 0.0));
        assert!(svd
            .singular_values
            .windows(2)
            .all(|pair| pair[0] >= pair[1]));
    }
}

#[test]
fn test_svd_rank_deficient() {
    // Second column is identically zero
    let a = Matrix::from_rows(&[[3.0, 0.0], [4.0, 0.0], [0.0, 0.0]]).unwrap();
    let svd = a.svd().unwrap();

    assert_eq!(svd.rank(), 1);
    assert_relative_eq!(svd.singular_values[0], 5.0, epsilon = 1e-12);
    assert_eq!(svd.singular_values[1], 0.0);
    // Column for the zero singular value stays zero
    assert!(svd.u.column(1).frobenius_norm() < 1e-12);
    assert!(svd.reconstruct().unwrap().approx_eq(&a, 1e-8));
}

#[test]
fn test_svd_wide_sorted_and_full_rank() {
    let mut rng = StdRng::seed_from_u64(21);
    for (m, n) in [(1, 3), (2, 5), (3, 6), (3, 5)] {
        for _ in 0..20 {
            let a = random_matrix(&mut rng, m, n);
            let svd = a.svd().unwrap();

            assert_eq!(svd.singular_values.len(), n);
            assert!(svd.singular_values.iter().all(|s| *s >= 0.0));
            assert!(
                svd.singular_values.windows(2).all(|pair| pair[0] >= pair[1]),
                "{m}x{n} unsorted: {:?}",
                svd.singular_values
            );
            assert_eq!(svd.rank(), m, "{m}x{n}: {:?}", svd.singular_values);
            assert!(svd.reconstruct().unwrap().approx_eq(&a, 1e-6));
        }
    }
}

#[test]
fn test_svd_tolerance_scales_with_largest_value() {
    let a = Matrix::from_rows(&[[3.0, 0.0], [4.0, 0.0], [0.0, 0.0]]).unwrap();
    let small = a.svd().unwrap();
    let large = a.scale(1e6).svd().unwrap();

    assert_relative_eq!(large.tolerance(), small.tolerance() * 1e6, max_relative = 1e-12);
    assert_eq!(Matrix::zeros(2, 2).svd().unwrap().tolerance(), SINGULAR_VALUE_TOLERANCE);
    assert_eq!(Matrix::zeros(2, 2).svd().unwrap().rank(), 0);
}

#[test]
fn test_pseudo_inverse_wide_right_inverse() {
    let mut rng = StdRng::seed_from_u64(17);
    for (m, n) in [(2, 5), (3, 6), (1, 4)] {
        for _ in 0..20 {
            let a = random_matrix(&mut rng, m, n);
            let pinv = a.pseudo_inverse().unwrap();
            assert_eq!(pinv.shape(), Shape { rows: n, cols: m });

            assert!(a.multiply(&pinv).unwrap().approx_eq(&Matrix::identity(m), 1e-9));

            // Full row rank: A^+ = A^T (A A^T)^-1
            let at = a.transpose();
            let expected = at.multiply(&a.multiply(&at).unwrap().inverse().unwrap()).unwrap();
            assert!(pinv.approx_eq(&expected, 1e-8));
        }
    }
}

#[test]
fn test_pseudo_inverse_left_inverse() {
    let a = Matrix::from_rows(&[[1.0, 0.0], [0.0, 2.0], [1.0, 1.0]]).unwrap();
    let pinv = a.pseudo_inverse().unwrap();

    assert_eq!(pinv.shape(), Shape { rows: 2, cols: 3 });
    assert!(pinv.multiply(&a).unwrap().approx_eq(&Matrix::identity(2), 1e-9));
}

#[test]
fn test_symmetry_checks() {
    let a = Matrix::from_rows(&[[1.0, 2.0], [2.0, 1.0]]).unwrap();
    assert!(a.is_symmetric(0.0));
    assert!(!a.set(0, 1, 2.1).is_symmetric(1e-3));
    assert!(!Matrix::zeros(2, 3).is_symmetric(1.0));
}

#[test]
fn test_display() {
    let a = Matrix::from_rows(&[[1.0, 2.5]]).unwrap();
    assert_eq!(format!("{a:.1}"), "[1.0, 2.5]\n");
}

#[test]
fn test_serde_validates_length() {
    let a = Matrix::from_rows(&[[1.0, 2.0], [3.0, 4.0]]).unwrap();
    let json = serde_json::to_string(&a).unwrap();
    let back: Matrix = serde_json::from_str(&json).unwrap();
    assert_eq!(back, a);

    let broken = r#"{"rows":2,"cols":2,"data":[1.0,2.0,3.0]}"#;
    assert!(serde_json::from_str::<Matrix>(broken).is_err());
}

#[test]
fn test_error_converts_to_crate_error() {
    let err: waymark_core::WaymarkError = MatrixError::SingularMatrix {
        column: 0,
        pivot: 0.0,
    }
    .into();
    assert!(matches!(err, waymark_core::WaymarkError::Matrix(_)));
}
