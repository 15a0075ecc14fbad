//! Inversion and factorizations
//!
//! Each routine copies its input into an explicit working buffer; the
//! receiver is never modified.

use super::{
    Matrix, MatrixError, MatrixResult, JACOBI_TOLERANCE, PIVOT_TOLERANCE,
    SINGULAR_VALUE_TOLERANCE,
};
use std::cmp::Ordering;
use tracing::{debug, trace};

/// Eigen-pairs of a symmetric matrix
#[derive(Debug, Clone, PartialEq)]
pub struct SymmetricEigen {
    /// Eigenvalues sorted by descending absolute value
    pub values: Vec<f64>,
    /// Eigenvectors as columns, in the same order as `values`
    pub vectors: Matrix,
}

/// Singular value decomposition `A = U * diag(S) * V^T`
#[derive(Debug, Clone, PartialEq)]
pub struct Svd {
    /// `m x n`; columns for zero singular values are left zero
    pub u: Matrix,
    /// `n` singular values, non-negative, descending
    pub singular_values: Vec<f64>,
    /// `n x n` right singular vectors as columns
    pub v: Matrix,
}

impl Svd {
    /// `U * diag(S) * V^T`
    pub fn reconstruct(&self) -> MatrixResult<Matrix> {
        self.u
            .multiply(&Matrix::from_diagonal(&self.singular_values))?
            .multiply(&self.v.transpose())
    }

    /// Cutoff below which a singular value counts as zero
    ///
    /// Null-space singular values from `A^T A` land near `sqrt(eps) * s_max`.
    /// Cutoff is `max(m, n) * s_max * sqrt(eps)`, floored at
    /// [`SINGULAR_VALUE_TOLERANCE`].
    pub fn tolerance(&self) -> f64 {
        let dim = self.u.rows.max(self.v.rows) as f64;
        let s_max = self.singular_values.first().copied().unwrap_or(0.0);
        (dim * s_max * f64::EPSILON.sqrt()).max(SINGULAR_VALUE_TOLERANCE)
    }

    /// Number of singular values above [`Svd::tolerance`]
    pub fn rank(&self) -> usize {
        let tol = self.tolerance();
        self.singular_values.iter().filter(|s| **s > tol).count()
    }
}

/// Packed LU factors of `P * A`
///
/// `lu` holds the unit-lower `L` below the diagonal and `U` on and above it.
struct LuFactors {
    n: usize,
    lu: Vec<f64>,
    perm: Vec<usize>,
    sign: f64,
}

impl LuFactors {
    fn factor(a: &Matrix) -> Self {
        let n = a.rows;
        let mut lu = a.data.clone();
        let mut perm: Vec<usize> = (0..n).collect();
        let mut sign = 1.0;

        for k in 0..n {
            let mut pivot_row = k;
            let mut pivot_mag = lu[k * n + k].abs();
            for r in (k + 1)..n {
                let mag = lu[r * n + k].abs();
                if mag > pivot_mag {
                    pivot_row = r;
                    pivot_mag = mag;
                }
            }

            if pivot_row != k {
                for c in 0..n {
                    lu.swap(k * n + c, pivot_row * n + c);
                }
                perm.swap(k, pivot_row);
                sign = -sign;
            }

            // Singular column: leave it for the caller to detect on the diagonal.
            if pivot_mag < PIVOT_TOLERANCE {
                continue;
            }

            let pivot = lu[k * n + k];
            for r in (k + 1)..n {
                let factor = lu[r * n + k] / pivot;
                lu[r * n + k] = factor;
                if factor == 0.0 {
                    continue;
                }
                for c in (k + 1)..n {
                    lu[r * n + c] -= factor * lu[k * n + c];
                }
            }
        }

        Self { n, lu, perm, sign }
    }

    fn determinant(&self) -> f64 {
        let mut det = self.sign;
        for i in 0..self.n {
            let d = self.lu[i * self.n + i];
            if d.abs() < PIVOT_TOLERANCE {
                return 0.0;
            }
            det *= d;
        }
        det
    }

    fn solve(&self, b: &Matrix) -> MatrixResult<Matrix> {
        let n = self.n;
        let m = b.cols;
        let mut x = vec![0.0; n * m];

        for col in 0..m {
            // Forward substitution on the permuted right-hand side.
            let mut y = vec![0.0; n];
            for i in 0..n {
                let mut sum = b.data[self.perm[i] * m + col];
                for j in 0..i {
                    sum -= self.lu[i * n + j] * y[j];
                }
                y[i] = sum;
            }

            for i in (0..n).rev() {
                let pivot = self.lu[i * n + i];
                if pivot.abs() < PIVOT_TOLERANCE {
                    return Err(MatrixError::SingularMatrix { column: i, pivot });
                }
                let mut sum = y[i];
                for j in (i + 1)..n {
                    sum -= self.lu[i * n + j] * x[j * m + col];
                }
                x[i * m + col] = sum / pivot;
            }
        }

        Ok(Matrix {
            rows: n,
            cols: m,
            data: x,
        })
    }
}

impl Matrix {
    /// Inverse by Gauss-Jordan elimination with partial pivoting on `[A | I]`
    ///
    /// Fails with `SingularMatrix` when the best available pivot in some
    /// column is below [`PIVOT_TOLERANCE`].
    pub fn inverse(&self) -> MatrixResult<Matrix> {
        self.check_square("inverse")?;
        let n = self.rows;
        let w = 2 * n;

        let mut aug = vec![0.0; n * w];
        for r in 0..n {
            aug[r * w..r * w + n].copy_from_slice(&self.data[r * n..(r + 1) * n]);
            aug[r * w + n + r] = 1.0;
        }

        for col in 0..n {
            let mut pivot_row = col;
            for r in (col + 1)..n {
                if aug[r * w + col].abs() > aug[pivot_row * w + col].abs() {
                    pivot_row = r;
                }
            }

            let pivot = aug[pivot_row * w + col];
            if pivot.abs() < PIVOT_TOLERANCE {
                return Err(MatrixError::SingularMatrix { column: col, pivot });
            }

            if pivot_row != col {
                for c in 0..w {
                    aug.swap(col * w + c, pivot_row * w + c);
                }
            }

            for c in 0..w {
                aug[col * w + c] /= pivot;
            }

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = aug[r * w + col];
                if factor == 0.0 {
                    continue;
                }
                for c in 0..w {
                    aug[r * w + c] -= factor * aug[col * w + c];
                }
            }
        }

        let mut data = Vec::with_capacity(n * n);
        for r in 0..n {
            data.extend_from_slice(&aug[r * w + n..(r + 1) * w]);
        }
        Ok(Matrix {
            rows: n,
            cols: n,
            data,
        })
    }

    /// Solve `self * x = b` by LU decomposition with partial pivoting
    ///
    /// `b` may carry several right-hand sides as columns.
    pub fn solve(&self, b: &Matrix) -> MatrixResult<Matrix> {
        self.check_square("solve")?;
        if b.rows != self.rows {
            return Err(MatrixError::DimensionMismatch {
                op: "solve",
                left: self.shape(),
                right: b.shape(),
            });
        }
        LuFactors::factor(self).solve(b)
    }

    /// Determinant via LU; `0.0` when a pivot falls below
    /// [`PIVOT_TOLERANCE`]
    ///
    /// Only non-square input is an error.
    pub fn determinant(&self) -> MatrixResult<f64> {
        self.check_square("determinant")?;
        Ok(LuFactors::factor(self).determinant())
    }

    /// Lower-triangular `L` with `L * L^T = self`
    pub fn cholesky(&self) -> MatrixResult<Matrix> {
        self.check_square("cholesky")?;
        let n = self.rows;
        let mut l = vec![0.0; n * n];

        for i in 0..n {
            for j in 0..=i {
                let mut sum = self.data[i * n + j];
                for k in 0..j {
                    sum -= l[i * n + k] * l[j * n + k];
                }

                if i == j {
                    if sum <= 0.0 {
                        return Err(MatrixError::NotPositiveDefinite { row: i, value: sum });
                    }
                    l[i * n + i] = sum.sqrt();
                } else {
                    l[i * n + j] = sum / l[j * n + j];
                }
            }
        }

        Ok(Matrix {
            rows: n,
            cols: n,
            data: l,
        })
    }

    /// Eigendecomposition of a symmetric matrix by cyclic Jacobi rotations
    ///
    /// Sweeps until the largest off-diagonal magnitude drops below
    /// [`JACOBI_TOLERANCE`] or `100 * n * n` sweeps have run; in the latter
    /// case the current estimate is returned as is. Only the upper triangle
    /// drives the rotations, so mildly asymmetric input is tolerated.
    pub fn eigen_symmetric(&self) -> MatrixResult<SymmetricEigen> {
        self.check_square("eigen_symmetric")?;
        let n = self.rows;
        let mut a = self.data.clone();
        let mut v = Matrix::identity(n).data;

        let max_sweeps = 100 * n * n;
        let mut sweeps = 0;
        loop {
            let off = max_off_diagonal(&a, n);
            if off < JACOBI_TOLERANCE {
                trace!(sweeps, off, "jacobi converged");
                break;
            }
            if sweeps >= max_sweeps {
                debug!(sweeps, off, "jacobi sweep cap reached, returning best estimate");
                break;
            }

            for p in 0..n {
                for q in (p + 1)..n {
                    let apq = a[p * n + q];
                    if apq == 0.0 {
                        continue;
                    }
                    let theta = (a[q * n + q] - a[p * n + p]) / (2.0 * apq);
                    let sign = if theta >= 0.0 { 1.0 } else { -1.0 };
                    let t = sign / (theta.abs() + (theta * theta + 1.0).sqrt());
                    let c = 1.0 / (t * t + 1.0).sqrt();
                    let s = t * c;
                    rotate(&mut a, &mut v, n, (p, q), (c, s));
                }
            }
            sweeps += 1;
        }

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&i, &j| {
            let (li, lj) = (a[i * n + i].abs(), a[j * n + j].abs());
            lj.partial_cmp(&li).unwrap_or(Ordering::Equal)
        });

        let values = order.iter().map(|&i| a[i * n + i]).collect();
        let mut vectors = vec![0.0; n * n];
        for (dst, &src) in order.iter().enumerate() {
            for r in 0..n {
                vectors[r * n + dst] = v[r * n + src];
            }
        }

        Ok(SymmetricEigen {
            values,
            vectors: Matrix {
                rows: n,
                cols: n,
                data: vectors,
            },
        })
    }

    /// Singular value decomposition through the eigendecomposition of `A^T A`
    ///
    /// Singular values are `sqrt(max(0, lambda))` sorted descending, `V`
    /// holds the matching eigenvectors and `U = A * V * diag(1 / S)` for
    /// singular values above [`SINGULAR_VALUE_TOLERANCE`]. Accuracy degrades
    /// with the square of the condition number; fine for the small,
    /// well-conditioned systems used in estimation and control.
    pub fn svd(&self) -> MatrixResult<Svd> {
        let ata = self.transpose().multiply(self)?;
        let eigen = ata.eigen_symmetric()?;

        // Clamped negatives can sit ahead of tiny positives in |lambda| order
        let mut pairs: Vec<(f64, usize)> = eigen
            .values
            .iter()
            .map(|l| l.max(0.0).sqrt())
            .enumerate()
            .map(|(i, s)| (s, i))
            .collect();
        pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

        let k = pairs.len();
        let singular_values: Vec<f64> = pairs.iter().map(|(s, _)| *s).collect();
        let mut v = vec![0.0; k * k];
        for (dst, (_, src)) in pairs.iter().enumerate() {
            for r in 0..k {
                v[r * k + dst] = eigen.vectors.data[r * k + src];
            }
        }
        let v = Matrix {
            rows: k,
            cols: k,
            data: v,
        };
        let av = self.multiply(&v)?;

        let (m, n) = (av.rows, av.cols);
        let mut u = vec![0.0; m * n];
        for (j, s) in singular_values.iter().enumerate() {
            if *s <= SINGULAR_VALUE_TOLERANCE {
                continue;
            }
            for r in 0..m {
                u[r * n + j] = av.data[r * n + j] / s;
            }
        }

        Ok(Svd {
            u: Matrix {
                rows: m,
                cols: n,
                data: u,
            },
            singular_values,
            v,
        })
    }

    /// Moore-Penrose pseudo-inverse `V * diag(1 / S) * U^T`
    ///
    /// Singular values at or below [`Svd::tolerance`] are dropped. Wide
    /// input is inverted as `pinv(A^T)^T` so the decomposition runs on the
    /// smaller Gram matrix, which has no null space at full row rank.
    pub fn pseudo_inverse(&self) -> MatrixResult<Matrix> {
        if self.rows < self.cols {
            return Ok(self.transpose().pseudo_inverse()?.transpose());
        }

        let svd = self.svd()?;
        let tol = svd.tolerance();
        let inv_s: Vec<f64> = svd
            .singular_values
            .iter()
            .map(|s| if *s > tol { 1.0 / s } else { 0.0 })
            .collect();

        svd.v
            .multiply(&Matrix::from_diagonal(&inv_s))?
            .multiply(&svd.u.transpose())
    }
}

fn max_off_diagonal(a: &[f64], n: usize) -> f64 {
    let mut max = 0.0_f64;
    for p in 0..n {
        for q in (p + 1)..n {
            max = max.max(a[p * n + q].abs());
        }
    }
    max
}

/// Apply `A <- J^T A J` and `V <- V J` for the rotation in the (p, q) plane
fn rotate(a: &mut [f64], v: &mut [f64], n: usize, (p, q): (usize, usize), (c, s): (f64, f64)) {
    for k in 0..n {
        let akp = a[k * n + p];
        let akq = a[k * n + q];
        a[k * n + p] = c * akp - s * akq;
        a[k * n + q] = s * akp + c * akq;
    }
    for k in 0..n {
        let apk = a[p * n + k];
        let aqk = a[q * n + k];
        a[p * n + k] = c * apk - s * aqk;
        a[q * n + k] = s * apk + c * aqk;
    }
    for k in 0..n {
        let vkp = v[k * n + p];
        let vkq = v[k * n + q];
        v[k * n + p] = c * vkp - s * vkq;
        v[k * n + q] = s * vkp + c * vkq;
    }
}
