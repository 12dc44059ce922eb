use core::fmt::{Debug, Display};
use num_traits::{Float, Num, NumCast, One, Zero};

/// Trait for types that can be used as matrix elements.
///
/// Blanket-implemented for all types satisfying the bounds.
/// Covers `f32`, `f64`, and all integer types.
pub trait Scalar: Copy + PartialEq + Debug + Zero + One + Num {}

impl<T: Copy + PartialEq + Debug + Zero + One + Num> Scalar for T {}

/// Trait for floating-point matrix elements.
///
/// Required by every solver and decomposition (pivot magnitudes, `sqrt`,
/// tolerances, trace output). Implemented for `f32` and `f64`.
pub trait FloatScalar: Scalar + Float + Display {
    /// Convert a count (iteration index, dimension) into the float type.
    ///
    /// Counts in this crate are small, so the conversion never fails for
    /// `f32`/`f64`; an unrepresentable value yields NaN.
    #[inline]
    fn from_count(n: usize) -> Self {
        <Self as NumCast>::from(n).unwrap_or_else(Self::nan)
    }

    /// `2` in the float type.
    #[inline]
    fn two() -> Self {
        Self::one() + Self::one()
    }
}

impl<T: Scalar + Float + Display> FloatScalar for T {}

/// Read-only access to a row-major matrix-like type.
///
/// Implemented by the owned [`Matrix`](crate::Matrix) and by the borrowed
/// [`MatrixView`](crate::matrix::MatrixView), so substitution and residual
/// routines work on either without copying.
pub trait MatrixRef<T> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> &T;

    /// Row `i` as a contiguous slice.
    fn row(&self, i: usize) -> &[T];
}

/// Mutable access to a row-major matrix-like type.
pub trait MatrixMut<T>: MatrixRef<T> {
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T;

    /// Row `i` as a contiguous mutable slice.
    fn row_mut(&mut self, i: usize) -> &mut [T];
}

/// Largest element of `values` in absolute value.
#[inline]
pub(crate) fn max_abs<T: FloatScalar>(values: &[T]) -> T {
    values
        .iter()
        .fold(T::zero(), |acc, &x| if x.abs() > acc { x.abs() } else { acc })
}

/// Sign with `sign(0) = +1`, as used by the Jacobi rotation formula.
#[inline]
pub(crate) fn sign<T: FloatScalar>(x: T) -> T {
    if x < T::zero() {
        -T::one()
    } else {
        T::one()
    }
}
