use tracing::debug;

use crate::context::Context;
use crate::linalg::gauss::forward_substitute;
use crate::linalg::{LinalgError, Solution};
use crate::matrix::{Matrix, Vector};
use crate::traits::FloatScalar;

/// Column-by-column Cholesky factorization: `A = L·Lᵗ`.
///
/// Reads only the lower triangle of `a`; returns the lower factor with
/// zeros above the diagonal. A radicand that is not strictly positive
/// yields [`LinalgError::NotPositiveDefinite`].
pub fn cholesky_factor<T: FloatScalar>(
    a: &Matrix<T>,
    ctx: &Context<T>,
) -> Result<Matrix<T>, LinalgError> {
    let n = a.nrows();
    let mut l = Matrix::zeros(n, n);
    for j in 0..n {
        let radicand = (0..j).fold(a[(j, j)], |acc, k| acc - l[(j, k)] * l[(j, k)]);
        ctx.count(2 * j as u64 + 1);
        // `!(x > 0)` also rejects NaN
        if !(radicand > T::zero()) {
            return Err(LinalgError::NotPositiveDefinite);
        }
        let ljj = radicand.sqrt();
        l[(j, j)] = ljj;
        for i in (j + 1)..n {
            let sum = (0..j).fold(a[(i, j)], |acc, k| acc - l[(i, k)] * l[(j, k)]);
            l[(i, j)] = sum / ljj;
            ctx.count(2 * j as u64 + 1);
        }
    }
    Ok(l)
}

/// Solve `Lᵗ·x = b` by back substitution, where L is lower triangular.
fn back_substitute_lt<T: FloatScalar>(l: &Matrix<T>, b: &[T], ctx: &Context<T>) -> Vector<T> {
    let n = l.nrows();
    let mut x = Vector::zeros(n);
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum = sum - l[(j, i)] * x[j];
        }
        x[i] = sum / l[(i, i)];
        ctx.count(2 * (n - i - 1) as u64 + 1);
    }
    x
}

/// Cholesky decomposition of a symmetric positive-definite matrix.
///
/// # Example
///
/// ```
/// use densolve::{Context, Matrix};
/// use densolve::linalg::CholeskyDecomposition;
///
/// let ctx = Context::<f64>::default();
/// let a = Matrix::from_rows(2, 2, &[4.0, 2.0, 2.0, 3.0]);
/// let chol = CholeskyDecomposition::new(&a, &ctx).unwrap();
///
/// let x = chol.solve(&[8.0, 7.0], &ctx).unwrap();
/// assert!((x[0] - 1.25).abs() < 1e-12);
/// assert!((chol.det(&ctx) - 8.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CholeskyDecomposition<T> {
    /// Lower triangular factor L (A = L·Lᵗ).
    l: Matrix<T>,
}

impl<T: FloatScalar> CholeskyDecomposition<T> {
    /// Decompose a symmetric positive-definite matrix.
    ///
    /// Symmetry is checked exactly first ([`LinalgError::NotSymmetric`]),
    /// then positivity of every radicand
    /// ([`LinalgError::NotPositiveDefinite`]).
    pub fn new(a: &Matrix<T>, ctx: &Context<T>) -> Result<Self, LinalgError> {
        if !a.is_square() {
            return Err(LinalgError::DimensionMismatch {
                expected: (a.nrows(), a.nrows()),
                got: (a.nrows(), a.ncols()),
            });
        }
        if !a.is_symmetric() {
            return Err(LinalgError::NotSymmetric);
        }
        let l = cholesky_factor(a, ctx)?;
        ctx.trace_matrix("cholesky factor", &l);
        Ok(Self { l })
    }

    pub fn l(&self) -> &Matrix<T> {
        &self.l
    }

    /// Solve `A·x = b` via `L·y = b`, then `Lᵗ·x = y`.
    pub fn solve(&self, b: &[T], ctx: &Context<T>) -> Result<Vector<T>, LinalgError> {
        let n = self.l.nrows();
        if b.len() != n {
            return Err(LinalgError::DimensionMismatch {
                expected: (n, 1),
                got: (b.len(), 1),
            });
        }
        let y = forward_substitute(&self.l, b, ctx)?;
        Ok(back_substitute_lt(&self.l, y.as_slice(), ctx))
    }

    /// Determinant `(Π l_ii)²`.
    pub fn det(&self, ctx: &Context<T>) -> T {
        let n = self.l.nrows();
        let p = (0..n).fold(T::one(), |acc, i| acc * self.l[(i, i)]);
        ctx.count(n as u64 + 1);
        p * p
    }

    /// Inverse, one solve per unit vector.
    pub fn inverse(&self, ctx: &Context<T>) -> Result<Matrix<T>, LinalgError> {
        let n = self.l.nrows();
        let mut inv = Matrix::zeros(n, n);
        for c in 0..n {
            let x = self.solve(Vector::unit(n, c).as_slice(), ctx)?;
            inv.set_column(c, &x);
        }
        Ok(inv)
    }
}

/// Solve a symmetric positive-definite system `[A | b]` by Cholesky.
pub fn solve_cholesky<T: FloatScalar>(
    system: &Matrix<T>,
    want_det: bool,
    ctx: &Context<T>,
) -> Result<Solution<T>, LinalgError> {
    let (a, b) = system.split_system()?;
    let chol = CholeskyDecomposition::new(&a, ctx)?;
    let x = chol.solve(b.as_slice(), ctx)?;
    if ctx.debug_level() >= 1 {
        debug!(rank = a.nrows(), ops = ctx.ops(), "cholesky solve");
    }
    Ok(Solution::direct(x, want_det.then(|| chol.det(ctx))))
}
