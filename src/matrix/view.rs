use crate::linalg::LinalgError;
use crate::traits::{MatrixRef, Scalar};

use super::Matrix;

/// Borrowed row-major matrix over a caller's slice.
///
/// No allocation: the view only records the shape. Implements
/// [`MatrixRef`], so substitution and residual routines accept it in place
/// of an owned [`Matrix`].
///
/// ```
/// use densolve::matrix::MatrixView;
/// use densolve::MatrixRef;
///
/// let data = [2.0_f64, 1.0, 3.0, 0.0, 4.0, 8.0];
/// let v = MatrixView::new(&data, 2, 3).unwrap();
/// assert_eq!(*v.get(1, 2), 8.0);
/// assert_eq!(v.row(0), &[2.0, 1.0, 3.0]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixView<'a, T> {
    data: &'a [T],
    nrows: usize,
    ncols: usize,
}

impl<'a, T> MatrixView<'a, T> {
    /// View `data` as an `nrows x ncols` row-major matrix.
    ///
    /// Fails with [`LinalgError::DimensionMismatch`] when the slice length
    /// does not equal `nrows * ncols`.
    pub fn new(data: &'a [T], nrows: usize, ncols: usize) -> Result<Self, LinalgError> {
        if nrows.checked_mul(ncols) != Some(data.len()) {
            return Err(LinalgError::DimensionMismatch {
                expected: (nrows, ncols),
                got: (1, data.len()),
            });
        }
        Ok(Self::from_parts(data, nrows, ncols))
    }

    #[inline]
    pub(crate) fn from_parts(data: &'a [T], nrows: usize, ncols: usize) -> Self {
        debug_assert_eq!(data.len(), nrows * ncols);
        Self { data, nrows, ncols }
    }

    #[inline]
    pub fn as_slice(&self) -> &'a [T] {
        self.data
    }
}

impl<T: Scalar> MatrixView<'_, T> {
    /// Copy the viewed data into an owned matrix.
    pub fn to_matrix(&self) -> Matrix<T> {
        Matrix::from_rows(self.nrows, self.ncols, self.data)
    }
}

impl<T> MatrixRef<T> for MatrixView<'_, T> {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_checked() {
        let data = [1.0_f64, 2.0, 3.0];
        assert!(MatrixView::new(&data, 2, 2).is_err());
        let v = MatrixView::new(&data, 1, 3).unwrap();
        assert_eq!(v.ncols(), 3);
    }

    #[test]
    fn view_matches_owner() {
        let m = Matrix::from_rows(2, 2, &[1.0_f64, 2.0, 3.0, 4.0]);
        let v = m.view();
        assert_eq!(*v.get(1, 0), 3.0);
        assert_eq!(v.to_matrix(), m);
    }
}
