use tracing::{debug, warn};

use crate::context::Context;
use crate::linalg::{Convergence, Eigen, LinalgError};
use crate::matrix::Matrix;
use crate::traits::FloatScalar;

/// Doolittle factorization without pivoting, `A = L·R`, packed in place:
/// multipliers below the diagonal, R on and above it.
fn lr_in_place<T: FloatScalar>(a: &mut Matrix<T>, ctx: &Context<T>) -> Result<(), LinalgError> {
    let n = a.nrows();
    for col in 0..n {
        let pivot = a[(col, col)];
        if pivot == T::zero() {
            return Err(LinalgError::Singular);
        }
        for row in (col + 1)..n {
            let factor = a[(row, col)] / pivot;
            let (pivot_row, target) = a.row_pair_mut(col, row);
            target[col] = factor;
            for (t, &p) in target[col + 1..].iter_mut().zip(&pivot_row[col + 1..]) {
                *t = *t - factor * p;
            }
            ctx.count(1 + 2 * (n - col - 1) as u64);
        }
    }
    Ok(())
}

/// `R·L` from a packed LR factorization.
fn recombine<T: FloatScalar>(lr: &Matrix<T>, ctx: &Context<T>) -> Matrix<T> {
    let n = lr.nrows();
    let out = Matrix::from_fn(n, n, |i, j| {
        // R[i][k] is zero for k < i, L[k][j] is zero for k < j and one at k == j
        let start = i.max(j);
        let mut sum = if i <= j { lr[(i, j)] } else { T::zero() };
        for k in start..n {
            if k == j {
                continue;
            }
            sum = sum + lr[(i, k)] * lr[(k, j)];
        }
        sum
    });
    ctx.count((2 * n * n * n / 3) as u64);
    out
}

/// Eigenvalues by Rutishauser's LR algorithm: factor `A_k = L·R` without
/// pivoting, then `A_{k+1} = R·L`.
///
/// Stops once every entry below the diagonal is within the tolerance; the
/// diagonal then holds the eigenvalues. A zero pivot fails with
/// [`LinalgError::Singular`]. Only the iteration cap bounds the method,
/// so eigenvectors are not produced and the matrix need not be symmetric.
///
/// ```
/// use densolve::{Context, Matrix, Settings};
/// use densolve::linalg::rutishauser_eigen;
///
/// let ctx = Context::new(Settings::<f64>::default().with_tolerance(1e-10).with_max_iter(500));
/// let a = Matrix::from_rows(2, 2, &[4.0, 1.0, 2.0, 3.0]);
/// let eig = rutishauser_eigen(&a, &ctx).unwrap().into_result().unwrap();
/// assert!((eig.values[0] - 5.0).abs() < 1e-8);
/// assert!((eig.values[1] - 2.0).abs() < 1e-8);
/// ```
pub fn rutishauser_eigen<T: FloatScalar>(
    a: &Matrix<T>,
    ctx: &Context<T>,
) -> Result<Eigen<T>, LinalgError> {
    if !a.is_square() {
        return Err(LinalgError::DimensionMismatch {
            expected: (a.nrows(), a.nrows()),
            got: (a.nrows(), a.ncols()),
        });
    }
    let tol = ctx.tolerance();
    let mut work = a.clone();
    let mut iterations = 0;

    let status = loop {
        let below = work.max_below_diagonal();
        if ctx.debug_level() >= 1 {
            debug!(iterations, max_below_diagonal = %below, "lr step");
        }
        if below <= tol {
            break Convergence::Converged;
        }
        if iterations >= ctx.max_iter() {
            warn!(iterations, max_below_diagonal = %below, "rutishauser: iteration limit exceeded");
            break Convergence::IterationLimitExceeded;
        }
        lr_in_place(&mut work, ctx)?;
        work = recombine(&work, ctx);
        iterations += 1;
        ctx.trace_matrix("lr iterate", &work);
    };

    Ok(Eigen {
        values: work.diag(),
        vectors: None,
        iterations,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Settings;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {}", msg, a, b);
    }

    #[test]
    fn one_step_by_hand() {
        // A = [[4,1],[2,3]] = L·R with L = [[1,0],[0.5,1]], R = [[4,1],[0,2.5]]
        // R·L = [[4.5,1],[1.25,2.5]]
        let ctx = Context::new(Settings::<f64>::default().with_max_iter(1));
        let a = Matrix::from_rows(2, 2, &[4.0, 1.0, 2.0, 3.0]);
        let eig = rutishauser_eigen(&a, &ctx).unwrap();
        assert_eq!(eig.iterations, 1);
        assert_eq!(eig.status, Convergence::IterationLimitExceeded);
        assert_near(eig.values[0], 4.5, 1e-12, "a00");
        assert_near(eig.values[1], 2.5, 1e-12, "a11");
    }

    #[test]
    fn trace_is_preserved() {
        let ctx = Context::new(Settings::<f64>::default().with_tolerance(1e-10).with_max_iter(500));
        let a = Matrix::from_rows(3, 3, &[6.0, 2.0, 1.0, 2.0, 5.0, 1.0, 1.0, 1.0, 4.0]);
        let eig = rutishauser_eigen(&a, &ctx).unwrap();
        assert_eq!(eig.status, Convergence::Converged);
        let sum: f64 = eig.values.iter().sum();
        assert_near(sum, 15.0, 1e-9, "trace");
    }

    #[test]
    fn zero_pivot_is_singular() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(2, 2, &[0.0, 1.0, 1.0, 0.0]);
        assert_eq!(
            rutishauser_eigen(&a, &ctx).unwrap_err(),
            LinalgError::Singular
        );
    }

    #[test]
    fn triangular_input_is_already_converged() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(2, 2, &[1.0, 7.0, 0.0, 2.0]);
        let eig = rutishauser_eigen(&a, &ctx).unwrap();
        assert_eq!(eig.iterations, 0);
        assert_eq!(eig.values.as_slice(), &[1.0, 2.0]);
    }
}
