//! Dense 2-D numeric matrix with the arithmetic the Kalman filter needs:
//! addition, subtraction, product, transpose and inverse (via Crout LU).
//!
//! Transpose and inverse are lazily computed and cached on the matrix that
//! produced them. Every path that changes a matrix's value — wholesale via
//! [`Matrix::set_value`] or elementwise via [`Matrix::set`] — clears both
//! caches. There is deliberately no `IndexMut` that hands out a raw `&mut`
//! row: that would let a caller mutate through the reference without going
//! through the invalidation path, which is exactly the fragility the source
//! this crate is modeled after had.

use std::cell::RefCell;
use std::fmt;

use crate::error::TrackerError;

/// Default epsilon substituted for a pivot that would otherwise be exactly
/// zero during Crout elimination. Keeps LU decomposition from dividing by
/// zero on the rank-deficient `R`-family matrices callers sometimes supply.
pub const DEFAULT_LU_EPSILON: f64 = 1e-30;

type Rows = Vec<Vec<f64>>;

#[derive(Debug)]
pub struct Matrix {
    value: Rows,
    dimx: usize,
    dimy: usize,
    transpose_cache: RefCell<Option<Rows>>,
    inverse_cache: RefCell<Option<Result<Rows, TrackerError>>>,
}

impl Matrix {
    /// Build a matrix from a rectangular list of rows. An empty `value`
    /// (`vec![]`) produces the zero-dimensional empty matrix.
    pub fn new(value: Rows) -> Self {
        let dimx = value.len();
        let dimy = value.first().map_or(0, |row| row.len());
        Matrix {
            value,
            dimx,
            dimy,
            transpose_cache: RefCell::new(None),
            inverse_cache: RefCell::new(None),
        }
    }

    /// The zero-dimensional empty matrix.
    pub fn empty() -> Self {
        Matrix::new(Vec::new())
    }

    pub fn zero(dimx: usize, dimy: usize) -> Result<Self, TrackerError> {
        if dimx < 1 || dimy < 1 {
            return Err(TrackerError::InvalidDimension);
        }
        Ok(Matrix::new(vec![vec![0.0; dimy]; dimx]))
    }

    pub fn identity(dim: usize) -> Result<Self, TrackerError> {
        let mut m = Matrix::zero(dim, dim)?;
        for i in 0..dim {
            m.set(i, i, 1.0);
        }
        Ok(m)
    }

    pub fn size(&self) -> (usize, usize) {
        (self.dimx, self.dimy)
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.value[i][j]
    }

    /// Write a single element, invalidating both caches.
    pub fn set(&mut self, i: usize, j: usize, v: f64) {
        self.value[i][j] = v;
        self.invalidate();
    }

    /// Replace the whole value, invalidating both caches.
    pub fn set_value(&mut self, value: Rows) {
        self.dimx = value.len();
        self.dimy = value.first().map_or(0, |row| row.len());
        self.value = value;
        self.invalidate();
    }

    pub fn value(&self) -> &Rows {
        &self.value
    }

    fn invalidate(&mut self) {
        *self.transpose_cache.borrow_mut() = None;
        *self.inverse_cache.borrow_mut() = None;
    }

    /// Transpose, computed once and cached until the next mutation.
    pub fn t(&self) -> Matrix {
        if let Some(cached) = self.transpose_cache.borrow().as_ref() {
            return Matrix::new(cached.clone());
        }
        let mut out = vec![vec![0.0; self.dimx]; self.dimy];
        for i in 0..self.dimx {
            for j in 0..self.dimy {
                out[j][i] = self.value[i][j];
            }
        }
        *self.transpose_cache.borrow_mut() = Some(out.clone());
        Matrix::new(out)
    }

    /// Crout LU decomposition: `A = L * U` with `L` lower triangular and
    /// `U` unit upper triangular (ones on the diagonal). Any pivot that
    /// would be exactly zero is replaced by `epsilon` rather than left to
    /// divide by zero — a deliberate numerical policy, not error recovery.
    pub fn lu_with_epsilon(&self, epsilon: f64) -> Result<(Matrix, Matrix), TrackerError> {
        if self.dimx != self.dimy {
            return Err(TrackerError::NotSquare);
        }
        let n = self.dimx;
        let mut l = vec![vec![0.0; n]; n];
        let mut u = vec![vec![0.0; n]; n];

        for j in 0..n {
            u[j][j] = 1.0;
            for i in j..n {
                let sum: f64 = (0..j).map(|k| l[i][k] * u[k][j]).sum();
                l[i][j] = self.value[i][j] - sum;
            }
            if l[j][j] == 0.0 {
                l[j][j] = epsilon;
            }
            for i in (j + 1)..n {
                let sum: f64 = (0..j).map(|k| l[j][k] * u[k][i]).sum();
                u[j][i] = (self.value[j][i] - sum) / l[j][j];
            }
        }

        Ok((Matrix::new(l), Matrix::new(u)))
    }

    pub fn lu(&self) -> Result<(Matrix, Matrix), TrackerError> {
        self.lu_with_epsilon(DEFAULT_LU_EPSILON)
    }

    /// Inverse via the cached LU factors: solve `L y = e_i` then `U x = y`
    /// column by column and assemble the columns into `A^-1`. Cached until
    /// invalidated. A true zero pivot surviving the epsilon guard (it
    /// shouldn't, but elimination can still degenerate) is reported as
    /// [`TrackerError::NonInvertible`] rather than panicking.
    pub fn inverse(&self) -> Result<Matrix, TrackerError> {
        if let Some(cached) = self.inverse_cache.borrow().as_ref() {
            return cached.clone().map(Matrix::new);
        }
        let result = self.compute_inverse(DEFAULT_LU_EPSILON);
        *self.inverse_cache.borrow_mut() = Some(result.clone());
        result.map(Matrix::new)
    }

    /// Inverse computed with a caller-chosen pivot epsilon instead of
    /// [`DEFAULT_LU_EPSILON`]. Bypasses the cache (which only ever holds
    /// the default-epsilon result) unless `epsilon` is the default.
    pub fn inverse_with_epsilon(&self, epsilon: f64) -> Result<Matrix, TrackerError> {
        if epsilon == DEFAULT_LU_EPSILON {
            return self.inverse();
        }
        self.compute_inverse(epsilon).map(Matrix::new)
    }

    fn compute_inverse(&self, epsilon: f64) -> Result<Rows, TrackerError> {
        let (l, u) = self.lu_with_epsilon(epsilon)?;
        let n = self.dimx;
        let mut inv = vec![vec![0.0; n]; n];

        for col in 0..n {
            // Forward substitution: L * y = e_col
            let mut y = vec![0.0; n];
            for i in 0..n {
                let rhs = if i == col { 1.0 } else { 0.0 };
                let sum: f64 = (0..i).map(|k| l.get(i, k) * y[k]).sum();
                let pivot = l.get(i, i);
                if pivot == 0.0 {
                    log::warn!("matrix inversion hit a true zero pivot at row {}", i);
                    return Err(TrackerError::NonInvertible);
                }
                y[i] = (rhs - sum) / pivot;
            }
            // Back substitution: U * x = y (U has a unit diagonal)
            let mut x = vec![0.0; n];
            for i in (0..n).rev() {
                let sum: f64 = (i + 1..n).map(|k| u.get(i, k) * x[k]).sum();
                x[i] = y[i] - sum;
            }
            for row in 0..n {
                inv[row][col] = x[row];
            }
        }

        Ok(inv)
    }

    fn elementwise(&self, other: &Matrix, op: impl Fn(f64, f64) -> f64) -> Result<Matrix, TrackerError> {
        if self.size() != other.size() {
            return Err(TrackerError::ShapeMismatch);
        }
        let rows = self
            .value
            .iter()
            .zip(other.value.iter())
            .map(|(a, b)| a.iter().zip(b.iter()).map(|(&x, &y)| op(x, y)).collect())
            .collect();
        Ok(Matrix::new(rows))
    }

    pub fn add(&self, other: &Matrix) -> Result<Matrix, TrackerError> {
        self.elementwise(other, |a, b| a + b)
    }

    pub fn sub(&self, other: &Matrix) -> Result<Matrix, TrackerError> {
        self.elementwise(other, |a, b| a - b)
    }

    /// Matrix product. `other` is transposed once so that both operands can
    /// be walked row-major when computing dot products — an optimization,
    /// not part of the contract.
    pub fn mul(&self, other: &Matrix) -> Result<Matrix, TrackerError> {
        if self.dimy != other.dimx {
            return Err(TrackerError::ShapeMismatch);
        }
        let other_t = other.t();
        let mut out = vec![vec![0.0; other.dimy]; self.dimx];
        for i in 0..self.dimx {
            for j in 0..other.dimy {
                let row = &self.value[i];
                let col = &other_t.value[j];
                out[i][j] = row.iter().zip(col.iter()).map(|(&a, &b)| a * b).sum();
            }
        }
        Ok(Matrix::new(out))
    }
}

impl Clone for Matrix {
    fn clone(&self) -> Self {
        Matrix::new(self.value.clone())
    }
}

impl PartialEq for Matrix {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl std::ops::Index<usize> for Matrix {
    type Output = [f64];

    fn index(&self, i: usize) -> &Self::Output {
        &self.value[i]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.value {
            writeln!(f, "{:?}", row)?;
        }
        Ok(())
    }
}
