mod norm;
mod ops;
mod square;
mod util;
mod vector;
mod view;

pub use vector::Vector;
pub use view::MatrixView;

use core::ops::{Index, IndexMut};

use crate::linalg::LinalgError;
use crate::traits::{MatrixMut, MatrixRef, Scalar};

/// Dense heap-allocated matrix with runtime dimensions.
///
/// Row-major `Vec<T>` storage: element `(i, j)` lives at `i * ncols + j`, so
/// every row is a contiguous slice. A linear *system* is a matrix whose
/// trailing column(s) hold the right-hand side(s); see
/// [`augment`](Matrix::augment) and [`split_system`](Matrix::split_system).
///
/// # Examples
///
/// ```
/// use densolve::Matrix;
///
/// let a = Matrix::from_rows(2, 2, &[1.0_f64, 2.0, 3.0, 4.0]);
/// assert_eq!(a[(0, 1)], 2.0);
/// assert_eq!(a.nrows(), 2);
/// assert_eq!(a.row(1), &[3.0, 4.0]);
///
/// let id = Matrix::<f64>::eye(3);
/// assert_eq!(id[(2, 2)], 1.0);
/// assert_eq!(id[(0, 1)], 0.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    data: Vec<T>,
    nrows: usize,
    ncols: usize,
}

// ── Constructors ────────────────────────────────────────────────────

impl<T: Scalar> Matrix<T> {
    /// Create an `nrows x ncols` matrix of zeros.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![T::zero(); nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Like [`zeros`](Self::zeros), but reports an allocation failure
    /// instead of aborting. Used for buffers sized by untrusted input.
    ///
    /// ```
    /// use densolve::Matrix;
    /// use densolve::linalg::LinalgError;
    ///
    /// assert!(Matrix::<f64>::try_zeros(3, 4).is_ok());
    /// assert_eq!(
    ///     Matrix::<f64>::try_zeros(usize::MAX, 2).unwrap_err(),
    ///     LinalgError::AllocationFailure { rows: usize::MAX, cols: 2 },
    /// );
    /// ```
    pub fn try_zeros(nrows: usize, ncols: usize) -> Result<Self, LinalgError> {
        let fail = LinalgError::AllocationFailure {
            rows: nrows,
            cols: ncols,
        };
        let len = nrows.checked_mul(ncols).ok_or(fail)?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| fail)?;
        data.resize(len, T::zero());
        Ok(Self { data, nrows, ncols })
    }

    /// Create a matrix filled with `value`.
    pub fn fill(nrows: usize, ncols: usize, value: T) -> Self {
        Self {
            data: vec![value; nrows * ncols],
            nrows,
            ncols,
        }
    }

    /// Create an `n x n` identity matrix.
    pub fn eye(n: usize) -> Self {
        Self::scaled_identity(n, T::one())
    }

    /// Create an `n x n` matrix with `value` on the diagonal.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let m = Matrix::scaled_identity(2, 5.0_f64);
    /// assert_eq!(m.as_slice(), &[5.0, 0.0, 0.0, 5.0]);
    /// ```
    pub fn scaled_identity(n: usize, value: T) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m[(i, i)] = value;
        }
        m
    }

    /// Create a matrix from a flat slice in row-major order.
    ///
    /// Panics if `row_major.len() != nrows * ncols`.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let m = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// assert_eq!(m[(0, 2)], 3.0);
    /// assert_eq!(m[(1, 0)], 4.0);
    /// ```
    pub fn from_rows(nrows: usize, ncols: usize, row_major: &[T]) -> Self {
        assert_eq!(
            row_major.len(),
            nrows * ncols,
            "slice length {} does not match {}x{} matrix",
            row_major.len(),
            nrows,
            ncols,
        );
        Self {
            data: row_major.to_vec(),
            nrows,
            ncols,
        }
    }

    /// Create a matrix from an owned row-major `Vec<T>`.
    ///
    /// Panics if `data.len() != nrows * ncols`.
    pub fn from_vec(nrows: usize, ncols: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            nrows * ncols,
            "vec length {} does not match {}x{} matrix",
            data.len(),
            nrows,
            ncols,
        );
        Self { data, nrows, ncols }
    }
}

impl<T> Matrix<T> {
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    pub fn is_square(&self) -> bool {
        self.nrows == self.ncols
    }

    /// Create a matrix by calling `f(row, col)` for each element.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let m = Matrix::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
    /// assert_eq!(m[(1, 2)], 5.0);
    /// ```
    pub fn from_fn(nrows: usize, ncols: usize, f: impl Fn(usize, usize) -> T) -> Self {
        let mut data = Vec::with_capacity(nrows * ncols);
        for i in 0..nrows {
            for j in 0..ncols {
                data.push(f(i, j));
            }
        }
        Self { data, nrows, ncols }
    }

    /// Borrow the whole matrix as a [`MatrixView`].
    #[inline]
    pub fn view(&self) -> MatrixView<'_, T> {
        MatrixView::from_parts(&self.data, self.nrows, self.ncols)
    }
}

// ── MatrixRef / MatrixMut ───────────────────────────────────────────

impl<T> MatrixRef<T> for Matrix<T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        &self.data[row * self.ncols + col]
    }

    #[inline]
    fn row(&self, i: usize) -> &[T] {
        let start = i * self.ncols;
        &self.data[start..start + self.ncols]
    }
}

impl<T> MatrixMut<T> for Matrix<T> {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        &mut self.data[row * self.ncols + col]
    }

    #[inline]
    fn row_mut(&mut self, i: usize) -> &mut [T] {
        let start = i * self.ncols;
        &mut self.data[start..start + self.ncols]
    }
}

// ── Index ───────────────────────────────────────────────────────────

impl<T> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        &self.data[row * self.ncols + col]
    }
}

impl<T> IndexMut<(usize, usize)> for Matrix<T> {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        &mut self.data[row * self.ncols + col]
    }
}
