use crate::traits::{FloatScalar, Scalar};

use super::vector::Vector;
use super::Matrix;

impl<T: Scalar> Matrix<T> {
    /// Sum of diagonal elements.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// assert_eq!(m.trace(), 5.0);
    /// ```
    pub fn trace(&self) -> T {
        let n = self.nrows.min(self.ncols);
        (0..n).fold(T::zero(), |acc, i| acc + self[(i, i)])
    }

    /// Extract the diagonal as a `Vector`.
    pub fn diag(&self) -> Vector<T> {
        let n = self.nrows.min(self.ncols);
        Vector::from_vec((0..n).map(|i| self[(i, i)]).collect())
    }

    /// Create a square diagonal matrix from a vector.
    pub fn from_diag(v: &Vector<T>) -> Self {
        let n = v.len();
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = v[i];
        }
        m
    }

    /// Integer matrix power via repeated squaring.
    ///
    /// `pow(0)` returns the identity matrix. Panics if not square.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0, 1.0, 0.0, 1.0]);
    /// let m3 = m.pow(3);
    /// assert_eq!(m3[(0, 1)], 3.0);
    /// ```
    pub fn pow(&self, mut n: u32) -> Self {
        assert!(self.is_square(), "pow requires a square matrix");
        let mut result = Self::eye(self.nrows);
        let mut base = self.clone();
        while n > 0 {
            if n & 1 == 1 {
                result = &result * &base;
            }
            n >>= 1;
            if n > 0 {
                base = &base * &base;
            }
        }
        result
    }

    /// Exact symmetry check (`A[i][j] == A[j][i]` for all `i > j`).
    ///
    /// Non-square matrices are never symmetric.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let sym = Matrix::from_rows(2, 2, &[1.0, 2.0, 2.0, 3.0]);
    /// assert!(sym.is_symmetric());
    /// ```
    pub fn is_symmetric(&self) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.nrows;
        (0..n).all(|i| (0..i).all(|j| self[(i, j)] == self[(j, i)]))
    }
}

impl<T: FloatScalar> Matrix<T> {
    /// Strict row diagonal dominance of the leading square block:
    /// `|a_ii| > Σ_{j≠i} |a_ij|` for every row.
    ///
    /// Trailing right-hand-side columns of a system are ignored.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let a = Matrix::from_rows(2, 3, &[4.0_f64, 1.0, 9.0, 2.0, 5.0, 9.0]);
    /// assert!(a.is_diagonally_dominant());
    /// ```
    pub fn is_diagonally_dominant(&self) -> bool {
        let n = self.nrows.min(self.ncols);
        (0..n).all(|i| {
            let off = (0..n)
                .filter(|&j| j != i)
                .fold(T::zero(), |acc, j| acc + self[(i, j)].abs());
            self[(i, i)].abs() > off
        })
    }

    /// Largest off-diagonal magnitude of a square matrix.
    pub fn max_off_diagonal(&self) -> T {
        let n = self.nrows.min(self.ncols);
        let mut max = T::zero();
        for i in 0..n {
            for j in 0..n {
                if i != j && self[(i, j)].abs() > max {
                    max = self[(i, j)].abs();
                }
            }
        }
        max
    }

    /// Largest magnitude strictly below the diagonal.
    pub fn max_below_diagonal(&self) -> T {
        let mut max = T::zero();
        for i in 1..self.nrows {
            for j in 0..i.min(self.ncols) {
                if self[(i, j)].abs() > max {
                    max = self[(i, j)].abs();
                }
            }
        }
        max
    }
}
