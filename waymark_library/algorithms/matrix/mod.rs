//! Dense Matrix Substrate
//!
//! Immutable, row-major `f64` matrices for state estimation and control.
//!
//! # Features
//!
//! - Elementwise arithmetic, products, transpose, trace
//! - Gauss-Jordan inverse and LU solve with partial pivoting
//! - Determinant via the same LU factorization
//! - Cholesky, symmetric eigendecomposition (cyclic Jacobi), SVD
//! - Every operation returns a new matrix; operands are never mutated
//!
//! # Example
//!
//! ```rust
//! use waymark_library::algorithms::matrix::Matrix;
//!
//! let a = Matrix::from_rows(&[[4.0, 7.0], [2.0, 6.0]]).unwrap();
//! let a_inv = a.inverse().unwrap();
//!
//! let product = a.multiply(&a_inv).unwrap();
//! assert!(product.approx_eq(&Matrix::identity(2), 1e-10));
//! ```

mod decomposition;

#[cfg(test)]
mod tests;

pub use decomposition::{Svd, SymmetricEigen};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;
use thiserror::Error;
use waymark_core::WaymarkError;

/// Pivots with a smaller magnitude are treated as zero by inverse, solve
/// and determinant
pub const PIVOT_TOLERANCE: f64 = 1e-14;

/// Jacobi iteration stops once every off-diagonal entry is below this
pub const JACOBI_TOLERANCE: f64 = 1e-12;

/// SVD leaves the `U` column zero for singular values at or below this.
/// Also the floor of [`Svd::tolerance`].
pub const SINGULAR_VALUE_TOLERANCE: f64 = 1e-10;

/// Matrix shape, printed as `rows x cols`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// Matrix errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    #[error("Dimension mismatch in {op}: {left} vs {right}")]
    DimensionMismatch {
        op: &'static str,
        left: Shape,
        right: Shape,
    },

    #[error("Matrix is singular (pivot {pivot:e} in column {column})")]
    SingularMatrix { column: usize, pivot: f64 },

    #[error("Matrix is not positive definite (diagonal term {value} at row {row})")]
    NotPositiveDefinite { row: usize, value: f64 },
}

impl From<MatrixError> for WaymarkError {
    fn from(e: MatrixError) -> Self {
        WaymarkError::Matrix(e.to_string())
    }
}

/// Result type for matrix operations
pub type MatrixResult<T> = Result<T, MatrixError>;

/// Serialized form; deserialization goes through [`Matrix::new`] so the
/// length invariant holds for every value that exists.
#[derive(Deserialize)]
struct MatrixData {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl TryFrom<MatrixData> for Matrix {
    type Error = MatrixError;

    fn try_from(raw: MatrixData) -> MatrixResult<Self> {
        Matrix::new(raw.rows, raw.cols, raw.data)
    }
}

/// Immutable dense matrix, row-major
///
/// Invariant: `data.len() == rows * cols`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "MatrixData")]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Create from row-major data
    ///
    /// Fails with `DimensionMismatch` when `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> MatrixResult<Self> {
        if data.len() != rows * cols {
            return Err(MatrixError::DimensionMismatch {
                op: "new",
                left: Shape { rows, cols },
                right: Shape {
                    rows: data.len(),
                    cols: 1,
                },
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// `rows x cols` matrix of zeros
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        }
    }

    /// `n x n` identity
    pub fn identity(n: usize) -> Self {
        let mut data = vec![0.0; n * n];
        for i in 0..n {
            data[i * n + i] = 1.0;
        }
        Self { rows: n, cols: n, data }
    }

    /// Square matrix with `values` on the diagonal
    pub fn from_diagonal(values: &[f64]) -> Self {
        let n = values.len();
        let mut data = vec![0.0; n * n];
        for (i, v) in values.iter().enumerate() {
            data[i * n + i] = *v;
        }
        Self { rows: n, cols: n, data }
    }

    /// Build from a slice of rows
    ///
    /// All rows must have the same length; an empty slice gives a `0x0`
    /// matrix.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> MatrixResult<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::with_capacity(rows.len() * cols);

        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(MatrixError::DimensionMismatch {
                    op: "from_rows",
                    left: Shape { rows: 1, cols },
                    right: Shape {
                        rows: i,
                        cols: row.len(),
                    },
                });
            }
            data.extend_from_slice(row);
        }

        Ok(Self {
            rows: rows.len(),
            cols,
            data,
        })
    }

    /// `n x 1` column vector
    pub fn column_vector(values: &[f64]) -> Self {
        Self {
            rows: values.len(),
            cols: 1,
            data: values.to_vec(),
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> Shape {
        Shape {
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Row-major backing data
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }

    /// Element at `(r, c)`
    ///
    /// # Panics
    /// If `r >= rows` or `c >= cols`.
    pub fn get(&self, r: usize, c: usize) -> f64 {
        assert!(
            r < self.rows && c < self.cols,
            "index ({r}, {c}) out of bounds for {} matrix",
            self.shape()
        );
        self.data[r * self.cols + c]
    }

    /// Copy of this matrix with `(r, c)` replaced by `value`
    ///
    /// # Panics
    /// If `r >= rows` or `c >= cols`.
    pub fn set(&self, r: usize, c: usize, value: f64) -> Matrix {
        assert!(
            r < self.rows && c < self.cols,
            "index ({r}, {c}) out of bounds for {} matrix",
            self.shape()
        );
        let mut out = self.clone();
        out.data[r * self.cols + c] = value;
        out
    }

    /// Row `r` as a `1 x cols` matrix
    pub fn row(&self, r: usize) -> Matrix {
        assert!(r < self.rows, "row {r} out of bounds for {} matrix", self.shape());
        let start = r * self.cols;
        Self {
            rows: 1,
            cols: self.cols,
            data: self.data[start..start + self.cols].to_vec(),
        }
    }

    /// Column `c` as a `rows x 1` matrix
    pub fn column(&self, c: usize) -> Matrix {
        assert!(c < self.cols, "column {c} out of bounds for {} matrix", self.shape());
        Self {
            rows: self.rows,
            cols: 1,
            data: (0..self.rows).map(|r| self.data[r * self.cols + c]).collect(),
        }
    }

    fn check_same_shape(&self, other: &Matrix, op: &'static str) -> MatrixResult<()> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(MatrixError::DimensionMismatch {
                op,
                left: self.shape(),
                right: other.shape(),
            });
        }
        Ok(())
    }

    pub(crate) fn check_square(&self, op: &'static str) -> MatrixResult<()> {
        if !self.is_square() {
            return Err(MatrixError::DimensionMismatch {
                op,
                left: self.shape(),
                right: Shape {
                    rows: self.cols,
                    cols: self.rows,
                },
            });
        }
        Ok(())
    }

    /// Elementwise sum
    pub fn add(&self, other: &Matrix) -> MatrixResult<Matrix> {
        self.check_same_shape(other, "add")?;
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a + b).collect(),
        })
    }

    /// Elementwise difference
    pub fn sub(&self, other: &Matrix) -> MatrixResult<Matrix> {
        self.check_same_shape(other, "sub")?;
        Ok(Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().zip(&other.data).map(|(a, b)| a - b).collect(),
        })
    }

    /// Multiply every element by `s`
    pub fn scale(&self, s: f64) -> Matrix {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|v| v * s).collect(),
        }
    }

    /// Matrix product `self * other`
    pub fn multiply(&self, other: &Matrix) -> MatrixResult<Matrix> {
        if self.cols != other.rows {
            return Err(MatrixError::DimensionMismatch {
                op: "multiply",
                left: self.shape(),
                right: other.shape(),
            });
        }

        let mut data = vec![0.0; self.rows * other.cols];
        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i * self.cols + k];
                for j in 0..other.cols {
                    data[i * other.cols + j] += a * other.data[k * other.cols + j];
                }
            }
        }

        Ok(Self {
            rows: self.rows,
            cols: other.cols,
            data,
        })
    }

    pub fn transpose(&self) -> Matrix {
        let mut data = vec![0.0; self.data.len()];
        for r in 0..self.rows {
            for c in 0..self.cols {
                data[c * self.rows + r] = self.data[r * self.cols + c];
            }
        }
        Self {
            rows: self.cols,
            cols: self.rows,
            data,
        }
    }

    /// Sum of the `min(rows, cols)` diagonal entries
    pub fn trace(&self) -> f64 {
        (0..self.rows.min(self.cols))
            .map(|i| self.data[i * self.cols + i])
            .sum()
    }

    pub fn frobenius_norm(&self) -> f64 {
        self.data.iter().map(|v| v * v).sum::<f64>().sqrt()
    }

    /// Square and `|a_ij - a_ji| <= tol` everywhere
    pub fn is_symmetric(&self, tol: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        for r in 0..self.rows {
            for c in (r + 1)..self.cols {
                if (self.get(r, c) - self.get(c, r)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Same shape and every element within `tol`
    pub fn approx_eq(&self, other: &Matrix, tol: f64) -> bool {
        self.rows == other.rows
            && self.cols == other.cols
            && self
                .data
                .iter()
                .zip(&other.data)
                .all(|(a, b)| (a - b).abs() <= tol)
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (r, c): (usize, usize)) -> &f64 {
        assert!(
            r < self.rows && c < self.cols,
            "index ({r}, {c}) out of bounds for {} matrix",
            self.shape()
        );
        &self.data[r * self.cols + c]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = f.precision().unwrap_or(4);
        for r in 0..self.rows {
            write!(f, "[")?;
            for c in 0..self.cols {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:.*}", precision, self.data[r * self.cols + c])?;
            }
            writeln!(f, "]")?;
        }
        Ok(())
    }
}
