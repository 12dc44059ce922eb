use tracing::debug;

use crate::context::Context;
use crate::linalg::gauss::back_substitute;
use crate::linalg::{LinalgError, Solution};
use crate::matrix::{Matrix, Vector};
use crate::traits::FloatScalar;

/// LU decomposition with partial pivoting, in place.
///
/// On return, `a` holds both factors packed together:
/// - upper triangle (including diagonal): U
/// - strict lower triangle: the multipliers of L (unit diagonal implied)
///
/// `perm[i]` is the original row now at position `i`. Returns `true` if the
/// number of row swaps was even.
pub fn lu_in_place<T: FloatScalar>(
    a: &mut Matrix<T>,
    perm: &mut [usize],
    ctx: &Context<T>,
) -> Result<bool, LinalgError> {
    let n = a.nrows();
    assert_eq!(n, a.ncols(), "LU decomposition requires a square matrix");
    assert_eq!(n, perm.len(), "permutation slice length must match matrix size");

    for (i, p) in perm.iter_mut().enumerate() {
        *p = i;
    }

    let mut even = true;

    for col in 0..n {
        let (max_row, max_val) = a.pivot_row(col, col);
        if max_val == T::zero() {
            return Err(LinalgError::Singular);
        }

        if max_row != col {
            perm.swap(col, max_row);
            a.swap_rows(col, max_row);
            even = !even;
        }

        let inv_pivot = T::one() / a[(col, col)];
        for row in (col + 1)..n {
            let factor = a[(row, col)] * inv_pivot;
            let (pivot_row, target) = a.row_pair_mut(col, row);
            target[col] = factor;
            for (t, &p) in target[col + 1..].iter_mut().zip(&pivot_row[col + 1..]) {
                *t = *t - factor * p;
            }
            ctx.count(1 + 2 * (n - col - 1) as u64);
        }
    }

    Ok(even)
}

/// LU decomposition of a square matrix: `P·A = L·U`.
///
/// Stores the unit-lower factor L, the upper factor U and the row
/// permutation. Use [`solve`](Self::solve), [`det`](Self::det) or
/// [`inverse`](Self::inverse) to work with it.
///
/// # Example
///
/// ```
/// use densolve::{Context, Matrix, Vector};
/// use densolve::linalg::LuDecomposition;
///
/// let ctx = Context::<f64>::default();
/// let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 5.0, 3.0]);
/// let lu = LuDecomposition::new(&a, &ctx).unwrap();
///
/// let x = lu.solve(&[4.0, 11.0], &ctx).unwrap();
/// assert!((x[0] - 1.0).abs() < 1e-12);
/// assert!((x[1] - 2.0).abs() < 1e-12);
/// assert!((lu.det(&ctx) - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct LuDecomposition<T> {
    l: Matrix<T>,
    u: Matrix<T>,
    perm: Vec<usize>,
    even: bool,
}

impl<T: FloatScalar> LuDecomposition<T> {
    /// Decompose a square matrix. Fails with [`LinalgError::Singular`] when
    /// a pivot column is zero (including the final pivot).
    pub fn new(a: &Matrix<T>, ctx: &Context<T>) -> Result<Self, LinalgError> {
        if !a.is_square() {
            return Err(LinalgError::DimensionMismatch {
                expected: (a.nrows(), a.nrows()),
                got: (a.nrows(), a.ncols()),
            });
        }
        let n = a.nrows();
        let mut packed = a.clone();
        let mut perm = vec![0; n];
        let even = lu_in_place(&mut packed, &mut perm, ctx)?;

        let l = Matrix::from_fn(n, n, |i, j| match i.cmp(&j) {
            core::cmp::Ordering::Greater => packed[(i, j)],
            core::cmp::Ordering::Equal => T::one(),
            core::cmp::Ordering::Less => T::zero(),
        });
        let u = Matrix::from_fn(n, n, |i, j| if i <= j { packed[(i, j)] } else { T::zero() });
        ctx.trace_matrix("L", &l);
        ctx.trace_matrix("U", &u);
        Ok(Self { l, u, perm, even })
    }

    /// Unit lower-triangular factor.
    pub fn l(&self) -> &Matrix<T> {
        &self.l
    }

    /// Upper-triangular factor.
    pub fn u(&self) -> &Matrix<T> {
        &self.u
    }

    /// `perm()[i]` is the row of `A` that ended up in row `i`.
    pub fn perm(&self) -> &[usize] {
        &self.perm
    }

    pub fn dim(&self) -> usize {
        self.perm.len()
    }

    /// Solve `A·x = b`: forward substitution of the permuted right-hand
    /// side through L, then back substitution through U.
    pub fn solve(&self, b: &[T], ctx: &Context<T>) -> Result<Vector<T>, LinalgError> {
        let n = self.dim();
        if b.len() != n {
            return Err(LinalgError::DimensionMismatch {
                expected: (n, 1),
                got: (b.len(), 1),
            });
        }
        let mut y = Vector::zeros(n);
        for i in 0..n {
            let row = self.l.row(i);
            let mut sum = b[self.perm[i]];
            for k in 0..i {
                sum = sum - row[k] * y[k];
            }
            y[i] = sum;
            ctx.count(2 * i as u64);
        }
        back_substitute(&self.u, y.as_slice(), ctx)
    }

    /// Determinant: product of U's diagonal, signed by the permutation parity.
    pub fn det(&self, ctx: &Context<T>) -> T {
        let n = self.dim();
        ctx.count(n as u64);
        let sign = if self.even { T::one() } else { -T::one() };
        (0..n).fold(sign, |d, i| d * self.u[(i, i)])
    }

    /// Inverse, one solve per unit vector.
    pub fn inverse(&self, ctx: &Context<T>) -> Result<Matrix<T>, LinalgError> {
        let n = self.dim();
        let mut inv = Matrix::zeros(n, n);
        for c in 0..n {
            let x = self.solve(Vector::unit(n, c).as_slice(), ctx)?;
            inv.set_column(c, &x);
        }
        Ok(inv)
    }
}

/// Solve `[A | b]` through an LU decomposition.
///
/// ```
/// use densolve::{Context, Matrix};
/// use densolve::linalg::solve_lu;
///
/// let ctx = Context::<f64>::default();
/// let sys = Matrix::from_rows(2, 3, &[2.0, 1.0, 3.0, 1.0, 3.0, 5.0]);
/// let sol = solve_lu(&sys, true, &ctx).unwrap();
/// assert!((sol.x[1] - 1.4).abs() < 1e-12);
/// assert!((sol.det.unwrap() - 5.0).abs() < 1e-12);
/// ```
pub fn solve_lu<T: FloatScalar>(
    system: &Matrix<T>,
    want_det: bool,
    ctx: &Context<T>,
) -> Result<Solution<T>, LinalgError> {
    let (a, b) = system.split_system()?;
    let lu = LuDecomposition::new(&a, ctx)?;
    let x = lu.solve(b.as_slice(), ctx)?;
    if ctx.debug_level() >= 1 {
        debug!(rank = a.nrows(), ops = ctx.ops(), "lu solve");
    }
    Ok(Solution::direct(x, want_det.then(|| lu.det(ctx))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {}", msg, a, b);
    }

    #[test]
    fn factors_reproduce_permuted_matrix() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(3, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 10.0]);
        let lu = LuDecomposition::new(&a, &ctx).unwrap();
        let pa = Matrix::from_fn(3, 3, |i, j| a[(lu.perm()[i], j)]);
        let prod = lu.l() * lu.u();
        for i in 0..3 {
            for j in 0..3 {
                assert_near(prod[(i, j)], pa[(i, j)], 1e-12, "PA = LU");
            }
        }
        for i in 0..3 {
            assert_eq!(lu.l()[(i, i)], 1.0);
        }
    }

    #[test]
    fn solve_3x3() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(3, 3, &[2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let lu = LuDecomposition::new(&a, &ctx).unwrap();
        let x = lu.solve(&[8.0, -11.0, -3.0], &ctx).unwrap();
        assert_near(x[0], 2.0, 1e-12, "x");
        assert_near(x[1], 3.0, 1e-12, "y");
        assert_near(x[2], -1.0, 1e-12, "z");
    }

    #[test]
    fn det_3x3() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(3, 3, &[6.0, 1.0, 1.0, 4.0, -2.0, 5.0, 2.0, 8.0, 7.0]);
        let lu = LuDecomposition::new(&a, &ctx).unwrap();
        assert_near(lu.det(&ctx), -306.0, 1e-10, "det");
    }

    #[test]
    fn inverse_2x2() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(2, 2, &[4.0, 7.0, 2.0, 6.0]);
        let inv = LuDecomposition::new(&a, &ctx).unwrap().inverse(&ctx).unwrap();
        let id = &a * &inv;
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_near(id[(i, j)], expected, 1e-12, "A * A^-1");
            }
        }
    }

    #[test]
    fn singular_final_pivot() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(
            LuDecomposition::new(&a, &ctx).unwrap_err(),
            LinalgError::Singular
        );
    }

    #[test]
    fn zero_row_system() {
        let ctx = Context::<f64>::default();
        let sys = Matrix::from_rows(2, 3, &[0.0, 0.0, 0.0, 1.0, 2.0, 3.0]);
        assert_eq!(solve_lu(&sys, false, &ctx).unwrap_err(), LinalgError::Singular);
    }

    #[test]
    fn rhs_length_checked() {
        let ctx = Context::<f64>::default();
        let lu = LuDecomposition::new(&Matrix::eye(2), &ctx).unwrap();
        assert!(matches!(
            lu.solve(&[1.0], &ctx),
            Err(LinalgError::DimensionMismatch { .. })
        ));
    }
}
