use tracing::debug;

use crate::context::Context;
use crate::linalg::gauss::{determinant, eliminate_row, partial_pivot, Reduced};
use crate::linalg::{LinalgError, Solution};
use crate::matrix::{Matrix, Vector};
use crate::traits::FloatScalar;

/// Gauss-Jordan reduction of `[A | B]`: every pivot column is cleared both
/// above and below the pivot, leaving a diagonal coefficient block.
///
/// Works on a copy; pivoting and the singularity rule match
/// [`triangularize`](super::triangularize), and the last column is pivot
/// checked as well.
pub fn diagonalize<T: FloatScalar>(
    system: &Matrix<T>,
    want_det: bool,
    ctx: &Context<T>,
) -> Result<Reduced<T>, LinalgError> {
    let n = system.nrows();
    if system.ncols() <= n {
        return Err(LinalgError::DimensionMismatch {
            expected: (n, n + 1),
            got: (n, system.ncols()),
        });
    }
    let mut a = system.clone();
    let mut swaps = 0;
    for j in 0..n {
        if partial_pivot(&mut a, j)? {
            swaps += 1;
        }
        for i in (0..n).filter(|&i| i != j) {
            eliminate_row(&mut a, j, i, j + 1, ctx);
        }
    }
    ctx.trace_matrix("diagonalized system", &a);
    let det = want_det.then(|| determinant(&a, swaps, ctx));
    Ok(Reduced {
        system: a,
        det,
        swaps,
    })
}

/// Solve `[A | b]` by diagonalization followed by one division per row.
///
/// ```
/// use densolve::{Context, Matrix};
/// use densolve::linalg::solve_diagonal;
///
/// let ctx = Context::<f64>::default();
/// let sys = Matrix::from_rows(2, 3, &[2.0, 1.0, 3.0, 1.0, 3.0, 5.0]);
/// let sol = solve_diagonal(&sys, false, &ctx).unwrap();
/// assert!((sol.x[0] - 0.8).abs() < 1e-12);
/// assert!((sol.x[1] - 1.4).abs() < 1e-12);
/// ```
pub fn solve_diagonal<T: FloatScalar>(
    system: &Matrix<T>,
    want_det: bool,
    ctx: &Context<T>,
) -> Result<Solution<T>, LinalgError> {
    let n = system.system_rank()?;
    let reduced = diagonalize(system, want_det, ctx)?;
    let d = &reduced.system;
    let x = Vector::from_vec((0..n).map(|i| d[(i, n)] / d[(i, i)]).collect());
    ctx.count(n as u64);
    if ctx.debug_level() >= 1 {
        debug!(rank = n, swaps = reduced.swaps, ops = ctx.ops(), "diagonal solve");
    }
    Ok(Solution::direct(x, reduced.det))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linalg::solve_gauss;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {}", msg, a, b);
    }

    #[test]
    fn coefficient_block_becomes_diagonal() {
        let ctx = Context::<f64>::default();
        let sys = Matrix::from_rows(
            3,
            4,
            &[4.0, -2.0, 1.0, 11.0, -2.0, 4.0, -2.0, -16.0, 1.0, -2.0, 4.0, 17.0],
        );
        let red = diagonalize(&sys, true, &ctx).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                if i != j {
                    assert_near(red.system[(i, j)], 0.0, 1e-12, "off-diagonal");
                }
            }
        }
        assert_near(red.det.unwrap(), 36.0, 1e-10, "det");
    }

    #[test]
    fn agrees_with_gauss() {
        let ctx = Context::<f64>::default();
        let sys = Matrix::from_rows(
            3,
            4,
            &[1.0, 2.0, 3.0, 14.0, 2.0, -1.0, 1.0, 3.0, 3.0, 0.0, -1.0, 0.0],
        );
        let g = solve_gauss(&sys, true, &ctx).unwrap();
        let d = solve_diagonal(&sys, true, &ctx).unwrap();
        for i in 0..3 {
            assert_near(g.x[i], d.x[i], 1e-12, "x");
        }
        assert_near(g.det.unwrap(), d.det.unwrap(), 1e-10, "det");
    }

    #[test]
    fn singular_last_pivot() {
        let ctx = Context::<f64>::default();
        let sys = Matrix::from_rows(2, 3, &[1.0, 2.0, 1.0, 2.0, 4.0, 2.0]);
        assert_eq!(
            solve_diagonal(&sys, false, &ctx).unwrap_err(),
            LinalgError::Singular
        );
    }
}
