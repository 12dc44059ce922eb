use tracing::debug;

use crate::context::Context;
use crate::linalg::{LinalgError, Solution};
use crate::matrix::{Matrix, Vector};
use crate::traits::{FloatScalar, MatrixRef};

/// Which triangle of a matrix holds the coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Triangle {
    Upper,
    Lower,
}

/// Augmented system after elimination, with the row-swap count.
#[derive(Debug, Clone, PartialEq)]
pub struct Reduced<T> {
    pub system: Matrix<T>,
    /// Determinant of the coefficient block, when requested.
    pub det: Option<T>,
    pub swaps: usize,
}

/// Inverse together with the determinant computed along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Inverse<T> {
    pub inverse: Matrix<T>,
    pub det: T,
}

fn check_augmented<T>(system: &Matrix<T>) -> Result<usize, LinalgError> {
    let n = system.nrows();
    if system.ncols() <= n {
        return Err(LinalgError::DimensionMismatch {
            expected: (n, n + 1),
            got: (n, system.ncols()),
        });
    }
    Ok(n)
}

fn check_square<T>(a: &Matrix<T>) -> Result<usize, LinalgError> {
    if !a.is_square() {
        return Err(LinalgError::DimensionMismatch {
            expected: (a.nrows(), a.nrows()),
            got: (a.nrows(), a.ncols()),
        });
    }
    Ok(a.nrows())
}

/// Swap the largest-magnitude row of column `j` (rows `j..`) into row `j`.
///
/// Returns whether a swap happened. A zero maximum means the matrix is
/// singular.
pub(crate) fn partial_pivot<T: FloatScalar>(
    a: &mut Matrix<T>,
    j: usize,
) -> Result<bool, LinalgError> {
    let (p, max) = a.pivot_row(j, j);
    if max == T::zero() {
        return Err(LinalgError::Singular);
    }
    a.swap_rows(p, j);
    Ok(p != j)
}

/// Subtract `factor * row[pivot]` from row `target`, columns `from..`.
pub(crate) fn eliminate_row<T: FloatScalar>(
    a: &mut Matrix<T>,
    pivot: usize,
    target: usize,
    from: usize,
    ctx: &Context<T>,
) {
    let factor = a[(target, pivot)] / a[(pivot, pivot)];
    let (src, dst) = a.row_pair_mut(pivot, target);
    for (d, &s) in dst[from..].iter_mut().zip(&src[from..]) {
        *d = *d - factor * s;
    }
    dst[pivot] = T::zero();
    ctx.count(1 + 2 * (src.len() - from) as u64);
}

/// Product of the diagonal with the sign of the row permutation.
pub(crate) fn determinant<T: FloatScalar>(a: &Matrix<T>, swaps: usize, ctx: &Context<T>) -> T {
    let n = a.nrows().min(a.ncols());
    let mut det = if swaps % 2 == 0 { T::one() } else { -T::one() };
    for i in 0..n {
        det = det * a[(i, i)];
    }
    ctx.count(n as u64);
    det
}

/// Reduce an augmented system `[A | B]` to upper-triangular form by
/// Gaussian elimination with partial pivoting.
///
/// The trailing columns (any number, at least one) are carried along.
/// Fails with [`LinalgError::Singular`] when a pivot column is entirely
/// zero.
pub fn triangularize<T: FloatScalar>(
    system: &Matrix<T>,
    want_det: bool,
    ctx: &Context<T>,
) -> Result<Reduced<T>, LinalgError> {
    let n = check_augmented(system)?;
    let mut a = system.clone();
    let mut swaps = 0;
    for j in 0..n.saturating_sub(1) {
        if partial_pivot(&mut a, j)? {
            swaps += 1;
        }
        for i in (j + 1)..n {
            eliminate_row(&mut a, j, i, j + 1, ctx);
        }
        if ctx.debug_level() >= 3 {
            debug!(pivot = j, value = %a[(j, j)], "elimination step");
        }
    }
    ctx.trace_matrix("triangularized system", &a);
    let det = want_det.then(|| determinant(&a, swaps, ctx));
    Ok(Reduced {
        system: a,
        det,
        swaps,
    })
}

/// `t` must hold at least an `n x n` leading block.
fn check_leading_block<T>(t: &impl MatrixRef<T>, n: usize) -> Result<(), LinalgError> {
    if t.nrows() < n || t.ncols() < n {
        return Err(LinalgError::DimensionMismatch {
            expected: (n, n),
            got: (t.nrows(), t.ncols()),
        });
    }
    Ok(())
}

/// Solve `U·x = b` for upper-triangular `U` (leading `n x n` block of `u`).
pub fn back_substitute<T: FloatScalar>(
    u: &impl MatrixRef<T>,
    b: &[T],
    ctx: &Context<T>,
) -> Result<Vector<T>, LinalgError> {
    let n = b.len();
    check_leading_block(u, n)?;
    let mut x = Vector::zeros(n);
    for i in (0..n).rev() {
        let row = u.row(i);
        let mut sum = b[i];
        for k in (i + 1)..n {
            sum = sum - row[k] * x[k];
        }
        if row[i] == T::zero() {
            return Err(LinalgError::Singular);
        }
        x[i] = sum / row[i];
        ctx.count(2 * (n - i - 1) as u64 + 1);
    }
    Ok(x)
}

/// Solve `L·x = b` for lower-triangular `L` (leading `n x n` block of `l`).
pub fn forward_substitute<T: FloatScalar>(
    l: &impl MatrixRef<T>,
    b: &[T],
    ctx: &Context<T>,
) -> Result<Vector<T>, LinalgError> {
    let n = b.len();
    check_leading_block(l, n)?;
    let mut x = Vector::zeros(n);
    for i in 0..n {
        let row = l.row(i);
        let mut sum = b[i];
        for k in 0..i {
            sum = sum - row[k] * x[k];
        }
        if row[i] == T::zero() {
            return Err(LinalgError::Singular);
        }
        x[i] = sum / row[i];
        ctx.count(2 * i as u64 + 1);
    }
    Ok(x)
}

/// Solve an augmented triangular system `[T | b]`.
///
/// ```
/// use densolve::{Context, Matrix};
/// use densolve::linalg::{solve_triangular, Triangle};
///
/// let ctx = Context::<f64>::default();
/// let upper = Matrix::from_rows(2, 3, &[2.0, 1.0, 4.0, 0.0, 2.0, 2.0]);
/// let sol = solve_triangular(&upper, Triangle::Upper, &ctx).unwrap();
/// assert_eq!(sol.x.as_slice(), &[1.5, 1.0]);
/// ```
pub fn solve_triangular<T: FloatScalar>(
    system: &Matrix<T>,
    triangle: Triangle,
    ctx: &Context<T>,
) -> Result<Solution<T>, LinalgError> {
    let n = system.system_rank()?;
    let b = system.column(n);
    let x = match triangle {
        Triangle::Upper => back_substitute(system, b.as_slice(), ctx)?,
        Triangle::Lower => forward_substitute(system, b.as_slice(), ctx)?,
    };
    Ok(Solution::direct(x, None))
}

/// Solve `[A | b]` by Gaussian elimination with partial pivoting and back
/// substitution. The determinant is computed only when `want_det` is set.
///
/// ```
/// use densolve::{Context, Matrix};
/// use densolve::linalg::solve_gauss;
///
/// let ctx = Context::<f64>::default();
/// let sys = Matrix::from_rows(2, 3, &[2.0, 1.0, 3.0, 1.0, 3.0, 5.0]);
/// let sol = solve_gauss(&sys, true, &ctx).unwrap();
/// assert!((sol.x[0] - 0.8).abs() < 1e-12);
/// assert!((sol.x[1] - 1.4).abs() < 1e-12);
/// assert!((sol.det.unwrap() - 5.0).abs() < 1e-12);
/// ```
pub fn solve_gauss<T: FloatScalar>(
    system: &Matrix<T>,
    want_det: bool,
    ctx: &Context<T>,
) -> Result<Solution<T>, LinalgError> {
    let n = system.system_rank()?;
    let reduced = triangularize(system, want_det, ctx)?;
    let b = reduced.system.column(n);
    let x = back_substitute(&reduced.system, b.as_slice(), ctx)?;
    if ctx.debug_level() >= 1 {
        debug!(rank = n, swaps = reduced.swaps, ops = ctx.ops(), "gauss solve");
    }
    Ok(Solution::direct(x, reduced.det))
}

/// Inverse of a square matrix by elimination on `[A | I]`.
///
/// ```
/// use densolve::{Context, Matrix};
/// use densolve::linalg::inverse_gauss;
///
/// let ctx = Context::<f64>::default();
/// let a = Matrix::from_rows(2, 2, &[4.0, 7.0, 2.0, 6.0]);
/// let inv = inverse_gauss(&a, &ctx).unwrap();
/// assert!((inv.det - 10.0).abs() < 1e-12);
/// assert!((inv.inverse[(0, 0)] - 0.6).abs() < 1e-12);
/// ```
pub fn inverse_gauss<T: FloatScalar>(
    a: &Matrix<T>,
    ctx: &Context<T>,
) -> Result<Inverse<T>, LinalgError> {
    let n = check_square(a)?;
    let augmented = a.augment_matrix(&Matrix::eye(n));
    let reduced = triangularize(&augmented, false, ctx)?;
    let det = determinant(&reduced.system, reduced.swaps, ctx);
    let mut inverse = Matrix::zeros(n, n);
    for c in 0..n {
        let b = reduced.system.column(n + c);
        let x = back_substitute(&reduced.system, b.as_slice(), ctx)?;
        inverse.set_column(c, &x);
    }
    ctx.trace_matrix("inverse", &inverse);
    Ok(Inverse { inverse, det })
}

/// Inverse of a triangular matrix, one unit-vector solve per column.
///
/// Entries outside `triangle` are ignored. A zero diagonal entry is
/// [`LinalgError::Singular`].
pub fn inverse_triangular<T: FloatScalar>(
    a: &Matrix<T>,
    triangle: Triangle,
    ctx: &Context<T>,
) -> Result<Matrix<T>, LinalgError> {
    let n = check_square(a)?;
    let mut inverse = Matrix::zeros(n, n);
    for c in 0..n {
        let e = Vector::unit(n, c);
        let x = match triangle {
            Triangle::Upper => back_substitute(a, e.as_slice(), ctx)?,
            Triangle::Lower => forward_substitute(a, e.as_slice(), ctx)?,
        };
        inverse.set_column(c, &x);
    }
    Ok(inverse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::MatrixView;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!(
            (a - b).abs() < tol,
            "{}: {} vs {} (diff {})",
            msg,
            a,
            b,
            (a - b).abs()
        );
    }

    fn ctx() -> Context<f64> {
        Context::default()
    }

    #[test]
    fn solve_2x2_example() {
        let sys = Matrix::from_rows(2, 3, &[2.0, 1.0, 3.0, 1.0, 3.0, 5.0]);
        let sol = solve_gauss(&sys, false, &ctx()).unwrap();
        assert_near(sol.x[0], 0.8, 1e-12, "x0");
        assert_near(sol.x[1], 1.4, 1e-12, "x1");
        assert!(sol.det.is_none());
    }

    #[test]
    fn solve_3x3_with_pivoting() {
        // 2x + y - z = 8, -3x - y + 2z = -11, -2x + y + 2z = -3
        let sys = Matrix::from_rows(
            3,
            4,
            &[2.0, 1.0, -1.0, 8.0, -3.0, -1.0, 2.0, -11.0, -2.0, 1.0, 2.0, -3.0],
        );
        let sol = solve_gauss(&sys, true, &ctx()).unwrap();
        assert_near(sol.x[0], 2.0, 1e-12, "x");
        assert_near(sol.x[1], 3.0, 1e-12, "y");
        assert_near(sol.x[2], -1.0, 1e-12, "z");
        assert_near(sol.det.unwrap(), -1.0, 1e-12, "det");
    }

    #[test]
    fn determinant_sign_follows_swaps() {
        // first pivot needs a swap: det([[1,2],[3,4]]) = -2
        let sys = Matrix::from_rows(2, 3, &[1.0, 2.0, 0.0, 3.0, 4.0, 0.0]);
        let red = triangularize(&sys, true, &ctx()).unwrap();
        assert_eq!(red.swaps, 1);
        assert_near(red.det.unwrap(), -2.0, 1e-12, "det");
    }

    #[test]
    fn operation_count_2x2() {
        // elimination: 1 multiplier + 2 updates x 2 columns = 5
        // back substitution: 1 + (2 + 1) = 4
        let c = ctx();
        let sys = Matrix::from_rows(2, 3, &[2.0, 1.0, 3.0, 1.0, 3.0, 5.0]);
        solve_gauss(&sys, false, &c).unwrap();
        assert_eq!(c.ops(), 9);
        c.reset_ops();
        solve_gauss(&sys, true, &c).unwrap();
        assert_eq!(c.ops(), 11);
    }

    #[test]
    fn zero_column_is_singular() {
        let sys = Matrix::from_rows(2, 3, &[0.0, 1.0, 1.0, 0.0, 2.0, 2.0]);
        assert_eq!(
            solve_gauss(&sys, false, &ctx()).unwrap_err(),
            LinalgError::Singular
        );
    }

    #[test]
    fn zero_row_is_singular() {
        let sys = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 0.0, 0.0, 0.0]);
        assert_eq!(
            solve_gauss(&sys, false, &ctx()).unwrap_err(),
            LinalgError::Singular
        );
    }

    #[test]
    fn rejects_non_augmented() {
        let a = Matrix::<f64>::eye(2);
        assert!(matches!(
            solve_gauss(&a, false, &ctx()),
            Err(LinalgError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn triangular_solves() {
        let lower = Matrix::from_rows(2, 3, &[2.0, 0.0, 4.0, 1.0, 4.0, 6.0]);
        let sol = solve_triangular(&lower, Triangle::Lower, &ctx()).unwrap();
        assert_near(sol.x[0], 2.0, 1e-12, "x0");
        assert_near(sol.x[1], 1.0, 1e-12, "x1");
    }

    #[test]
    fn substitution_on_borrowed_view() {
        let data = [2.0_f64, 1.0, 0.0, 4.0];
        let u = MatrixView::new(&data, 2, 2).unwrap();
        let x = back_substitute(&u, &[4.0, 8.0], &ctx()).unwrap();
        assert_eq!(x.as_slice(), &[1.0, 2.0]);
    }

    #[test]
    fn oversized_right_hand_side() {
        let u = Matrix::from_rows(2, 2, &[2.0, 1.0, 0.0, 4.0]);
        let expected = LinalgError::DimensionMismatch {
            expected: (3, 3),
            got: (2, 2),
        };
        let b = [1.0, 2.0, 3.0];
        assert_eq!(back_substitute(&u, &b, &ctx()).unwrap_err(), expected);
        assert_eq!(forward_substitute(&u, &b, &ctx()).unwrap_err(), expected);
    }

    #[test]
    fn inverse_times_a_is_identity() {
        let a = Matrix::from_rows(3, 3, &[1.0, 2.0, 3.0, 0.0, 1.0, 4.0, 5.0, 6.0, 0.0]);
        let inv = inverse_gauss(&a, &ctx()).unwrap();
        assert_near(inv.det, 1.0, 1e-12, "det");
        let id = &a * &inv.inverse;
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_near(id[(i, j)], expected, 1e-10, &format!("id[({i},{j})]"));
            }
        }
    }

    #[test]
    fn inverse_of_singular_fails() {
        let a = Matrix::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(
            inverse_gauss(&a, &ctx()).unwrap_err(),
            LinalgError::Singular
        );
    }

    #[test]
    fn triangular_inverse() {
        let u = Matrix::from_rows(2, 2, &[2.0, 1.0, 0.0, 4.0]);
        let inv = inverse_triangular(&u, Triangle::Upper, &ctx()).unwrap();
        assert_eq!(inv.as_slice(), &[0.5, -0.125, 0.0, 0.25]);
        let l = u.transpose();
        let inv_l = inverse_triangular(&l, Triangle::Lower, &ctx()).unwrap();
        assert_eq!(inv_l, inv.transpose());
    }
}
