// Matrix substrate used the way estimators use it
use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use waymark_core::{WaymarkError, WaymarkResult};
use waymark_library::{Matrix, MatrixError};

/// Least squares line fit `y = a + b t` through the pseudo-inverse
fn fit_line(ts: &[f64], ys: &[f64]) -> WaymarkResult<(f64, f64)> {
    let rows: Vec<[f64; 2]> = ts.iter().map(|t| [1.0, *t]).collect();
    let design = Matrix::from_rows(&rows)?;
    let coeffs = design
        .pseudo_inverse()?
        .multiply(&Matrix::column_vector(ys))?;
    Ok((coeffs.get(0, 0), coeffs.get(1, 0)))
}

#[test]
fn test_least_squares_recovers_line() {
    let mut rng = StdRng::seed_from_u64(11);
    let ts: Vec<f64> = (0..25).map(|i| i as f64 * 0.4).collect();
    let ys: Vec<f64> = ts
        .iter()
        .map(|t| 1.5 - 0.75 * t + rng.gen_range(-1e-3..1e-3))
        .collect();

    let (a, b) = fit_line(&ts, &ys).unwrap();
    assert_relative_eq!(a, 1.5, epsilon = 1e-2);
    assert_relative_eq!(b, -0.75, epsilon = 1e-3);
}

#[test]
fn test_pseudo_inverse_agrees_with_normal_equations() {
    let mut rng = StdRng::seed_from_u64(3);
    let data: Vec<f64> = (0..18).map(|_| rng.gen_range(-2.0..2.0)).collect();
    let a = Matrix::new(6, 3, data).unwrap();
    let b = Matrix::column_vector(&[1.0, -1.0, 0.5, 2.0, 0.0, 3.0]);

    let via_pinv = a.pseudo_inverse().unwrap().multiply(&b).unwrap();

    let at = a.transpose();
    let via_normal = at
        .multiply(&a)
        .unwrap()
        .solve(&at.multiply(&b).unwrap())
        .unwrap();

    assert!(via_pinv.approx_eq(&via_normal, 1e-8));
}

#[test]
fn test_covariance_update_stays_positive_definite() {
    // P' = (I - K H) P with K = P H^T (H P H^T + R)^-1
    let p = Matrix::from_rows(&[[0.5, 0.1, 0.0], [0.1, 0.4, 0.05], [0.0, 0.05, 0.3]]).unwrap();
    let h = Matrix::from_rows(&[[1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]).unwrap();
    let r = Matrix::identity(2).scale(0.01);

    let s = h.multiply(&p).unwrap().multiply(&h.transpose()).unwrap().add(&r).unwrap();
    let k = p
        .multiply(&h.transpose())
        .unwrap()
        .multiply(&s.inverse().unwrap())
        .unwrap();
    let updated = Matrix::identity(3)
        .sub(&k.multiply(&h).unwrap())
        .unwrap()
        .multiply(&p)
        .unwrap();

    assert!(updated.trace() < p.trace());
    let l = updated.cholesky().unwrap();
    assert!(l.multiply(&l.transpose()).unwrap().approx_eq(&updated, 1e-9));

    // Determinant of a PD matrix is the product of the squared Cholesky diagonal
    let det_from_l: f64 = (0..3).map(|i| l.get(i, i) * l.get(i, i)).product();
    assert_relative_eq!(updated.determinant().unwrap(), det_from_l, max_relative = 1e-9);
}

#[test]
fn test_eigenvalues_of_spd_match_singular_values() {
    let mut rng = StdRng::seed_from_u64(99);
    let b = Matrix::new(4, 4, (0..16).map(|_| rng.gen_range(-1.0..1.0)).collect()).unwrap();
    let spd = b
        .transpose()
        .multiply(&b)
        .unwrap()
        .add(&Matrix::identity(4))
        .unwrap();

    let eigen = spd.eigen_symmetric().unwrap();
    let svd = spd.svd().unwrap();
    for (lambda, s) in eigen.values.iter().zip(&svd.singular_values) {
        assert_relative_eq!(*lambda, *s, max_relative = 1e-8);
    }
}

#[test]
fn test_singular_system_surfaces_as_crate_error() {
    fn solve_checked(a: &Matrix, b: &Matrix) -> WaymarkResult<Matrix> {
        Ok(a.solve(b)?)
    }

    let a = Matrix::from_rows(&[[1.0, 2.0], [2.0, 4.0]]).unwrap();
    let b = Matrix::column_vector(&[1.0, 2.0]);

    assert!(matches!(a.solve(&b), Err(MatrixError::SingularMatrix { .. })));
    let err = solve_checked(&a, &b).unwrap_err();
    assert!(matches!(err, WaymarkError::Matrix(_)));
    assert!(err.to_string().contains("singular"));
}
