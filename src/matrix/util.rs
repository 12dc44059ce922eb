use core::fmt::{self, Write as _};

use crate::linalg::LinalgError;
use crate::traits::{FloatScalar, Scalar};

use super::vector::Vector;
use super::Matrix;

// ── Slices and rows ─────────────────────────────────────────────────

impl<T> Matrix<T> {
    /// The whole matrix as a flat row-major slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Row `i` as a slice.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let m = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
    /// ```
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        let start = i * self.ncols;
        &self.data[start..start + self.ncols]
    }

    #[inline]
    pub fn row_mut(&mut self, i: usize) -> &mut [T] {
        let start = i * self.ncols;
        &mut self.data[start..start + self.ncols]
    }

    /// Borrow row `src` immutably and row `dst` mutably at the same time.
    ///
    /// Panics if `src == dst`.
    pub(crate) fn row_pair_mut(&mut self, src: usize, dst: usize) -> (&[T], &mut [T]) {
        assert_ne!(src, dst, "row_pair_mut needs two distinct rows");
        let n = self.ncols;
        if src < dst {
            let (head, tail) = self.data.split_at_mut(dst * n);
            (&head[src * n..src * n + n], &mut tail[..n])
        } else {
            let (head, tail) = self.data.split_at_mut(src * n);
            (&tail[..n], &mut head[dst * n..dst * n + n])
        }
    }

    /// Swap two rows in place.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let mut m = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// m.swap_rows(0, 1);
    /// assert_eq!(m.as_slice(), &[3.0, 4.0, 1.0, 2.0]);
    /// ```
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a != b {
            let n = self.ncols;
            for j in 0..n {
                self.data.swap(a * n + j, b * n + j);
            }
        }
    }
}

// ── Columns and systems ─────────────────────────────────────────────

impl<T: Scalar> Matrix<T> {
    /// Extract column `j` as a `Vector`.
    pub fn column(&self, j: usize) -> Vector<T> {
        Vector::from_vec((0..self.nrows).map(|i| self[(i, j)]).collect())
    }

    /// Overwrite column `j`.
    pub fn set_column(&mut self, j: usize, v: &Vector<T>) {
        assert_eq!(v.len(), self.nrows, "vector length mismatch");
        for i in 0..self.nrows {
            self[(i, j)] = v[i];
        }
    }

    /// New matrix made of the listed columns, in the given order.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let m = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let s = m.select_columns(&[2, 0]);
    /// assert_eq!(s.as_slice(), &[3.0, 1.0, 6.0, 4.0]);
    /// ```
    pub fn select_columns(&self, cols: &[usize]) -> Self {
        Matrix::from_fn(self.nrows, cols.len(), |i, k| self[(i, cols[k])])
    }

    /// Leading `nrows x ncols` block.
    pub fn top_left(&self, nrows: usize, ncols: usize) -> Self {
        assert!(
            nrows <= self.nrows && ncols <= self.ncols,
            "block {}x{} exceeds {}x{} matrix",
            nrows,
            ncols,
            self.nrows,
            self.ncols,
        );
        Matrix::from_fn(nrows, ncols, |i, j| self[(i, j)])
    }

    /// Append `b` as an extra column, forming the system `[A | b]`.
    ///
    /// ```
    /// use densolve::{Matrix, Vector};
    /// let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
    /// let sys = a.augment(&Vector::from_slice(&[3.0, 5.0]));
    /// assert_eq!(sys.ncols(), 3);
    /// assert_eq!(sys.row(1), &[1.0, 3.0, 5.0]);
    /// ```
    pub fn augment(&self, b: &Vector<T>) -> Self {
        assert_eq!(b.len(), self.nrows, "right-hand side length mismatch");
        Matrix::from_fn(self.nrows, self.ncols + 1, |i, j| {
            if j < self.ncols {
                self[(i, j)]
            } else {
                b[i]
            }
        })
    }

    /// Append the columns of `rhs`, forming `[A | B]`.
    pub fn augment_matrix(&self, rhs: &Matrix<T>) -> Self {
        assert_eq!(rhs.nrows, self.nrows, "right-hand side row mismatch");
        Matrix::from_fn(self.nrows, self.ncols + rhs.ncols, |i, j| {
            if j < self.ncols {
                self[(i, j)]
            } else {
                rhs[(i, j - self.ncols)]
            }
        })
    }

    /// Rank of a single right-hand-side system (`ncols == nrows + 1`).
    pub fn system_rank(&self) -> Result<usize, LinalgError> {
        if self.ncols != self.nrows + 1 {
            return Err(LinalgError::DimensionMismatch {
                expected: (self.nrows, self.nrows + 1),
                got: (self.nrows, self.ncols),
            });
        }
        Ok(self.nrows)
    }

    /// Split `[A | b]` into the coefficient matrix and the right-hand side.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let sys = Matrix::from_rows(2, 3, &[2.0, 1.0, 3.0, 1.0, 3.0, 5.0]);
    /// let (a, b) = sys.split_system().unwrap();
    /// assert_eq!(a.as_slice(), &[2.0, 1.0, 1.0, 3.0]);
    /// assert_eq!(b.as_slice(), &[3.0, 5.0]);
    /// ```
    pub fn split_system(&self) -> Result<(Matrix<T>, Vector<T>), LinalgError> {
        let n = self.system_rank()?;
        Ok((self.top_left(n, n), self.column(n)))
    }
}

impl<T: FloatScalar> Matrix<T> {
    /// Row in `[from, nrows)` with the largest magnitude in column `col`,
    /// together with that magnitude. The lowest index wins ties.
    pub fn pivot_row(&self, col: usize, from: usize) -> (usize, T) {
        let mut best = from;
        let mut max = self[(from, col)].abs();
        for i in (from + 1)..self.nrows {
            let v = self[(i, col)].abs();
            if v > max {
                max = v;
                best = i;
            }
        }
        (best, max)
    }
}

// ── Display ─────────────────────────────────────────────────────────

impl<T: fmt::Display> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.nrows;
        let n = self.ncols;

        let mut widths = vec![0usize; n];
        for i in 0..m {
            for j in 0..n {
                let w = WriteCounting::count(|wc| write!(wc, "{}", self[(i, j)]));
                widths[j] = widths[j].max(w);
            }
        }

        for i in 0..m {
            write!(f, "│")?;
            for j in 0..n {
                if j > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{:>width$}", self[(i, j)], width = widths[j])?;
            }
            write!(f, "│")?;
            if i + 1 < m {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl<T: fmt::Display> fmt::Display for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, x) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{x}")?;
        }
        write!(f, "]")
    }
}

struct WriteCounting {
    count: usize,
}

impl WriteCounting {
    fn count(f: impl FnOnce(&mut Self) -> fmt::Result) -> usize {
        let mut wc = WriteCounting { count: 0 };
        let _ = f(&mut wc);
        wc.count
    }
}

impl fmt::Write for WriteCounting {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.count += s.chars().count();
        Ok(())
    }
}
