use tracing::{debug, warn};

use crate::context::Context;
use crate::linalg::lu::LuDecomposition;
use crate::linalg::{Convergence, LinalgError};
use crate::matrix::{Matrix, Vector};
use crate::traits::FloatScalar;

/// Which end of the spectrum [`extremal_eigenvalue`] looks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extremal {
    /// Largest magnitude, by iterating with `A`.
    Largest,
    /// Smallest magnitude, by iterating with `A⁻¹` through an LU solve.
    Smallest,
}

/// Result of the power method.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtremalEigen<T> {
    pub value: T,
    /// Eigenvector estimate with unit 2-norm.
    pub vector: Vector<T>,
    pub iterations: usize,
    pub status: Convergence,
}

impl<T> ExtremalEigen<T> {
    /// Turn a non-converged status into an error.
    pub fn into_result(self) -> Result<Self, LinalgError> {
        self.status.check(self.iterations)?;
        Ok(self)
    }
}

enum Operator<'a, T> {
    Direct(&'a Matrix<T>),
    Inverse(LuDecomposition<T>),
}

impl<T: FloatScalar> Operator<'_, T> {
    fn apply(&self, y: &Vector<T>, ctx: &Context<T>) -> Result<Vector<T>, LinalgError> {
        match self {
            Operator::Direct(a) => {
                let n = y.len();
                ctx.count((2 * n * n) as u64);
                Ok(a.mul_vec(y))
            }
            Operator::Inverse(lu) => lu.solve(y.as_slice(), ctx),
        }
    }
}

/// Power method for the largest- or smallest-magnitude eigenvalue.
///
/// Starting from the all-ones vector, each iteration forms `z = A·y`
/// (or `z = A⁻¹·y`), estimates the eigenvalue as `z_k / y_k` at the
/// dominant component `k` of `y`, and rescales `z` by its dominant
/// component. The iteration converges once the relative change of the
/// estimate is within the tolerance and diverges if that change grows
/// after the first comparison.
///
/// For [`Extremal::Smallest`] a singular `A` fails with
/// [`LinalgError::Singular`] and the estimate is inverted before return.
///
/// ```
/// use densolve::{Context, Matrix, Settings};
/// use densolve::linalg::{extremal_eigenvalue, Extremal};
///
/// let ctx = Context::new(Settings::<f64>::default().with_tolerance(1e-12));
/// let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
/// let big = extremal_eigenvalue(&a, Extremal::Largest, &ctx).unwrap();
/// assert!((big.value - (5.0 + 5f64.sqrt()) / 2.0).abs() < 1e-9);
/// ```
pub fn extremal_eigenvalue<T: FloatScalar>(
    a: &Matrix<T>,
    which: Extremal,
    ctx: &Context<T>,
) -> Result<ExtremalEigen<T>, LinalgError> {
    if !a.is_square() {
        return Err(LinalgError::DimensionMismatch {
            expected: (a.nrows(), a.nrows()),
            got: (a.nrows(), a.ncols()),
        });
    }
    let n = a.nrows();
    if n == 0 {
        return Err(LinalgError::InvalidArgument {
            reason: "empty matrix has no eigenvalues",
        });
    }
    let op = match which {
        Extremal::Largest => Operator::Direct(a),
        Extremal::Smallest => Operator::Inverse(LuDecomposition::new(a, ctx)?),
    };

    let tol = ctx.tolerance();
    let mut y = Vector::fill(n, T::one());
    let mut mu = T::zero();
    let mut prev_change: Option<T> = None;
    let mut iterations = 0;

    let status = loop {
        if iterations >= ctx.max_iter() {
            warn!(iterations, estimate = %mu, "power method: iteration limit exceeded");
            break Convergence::IterationLimitExceeded;
        }
        let z = op.apply(&y, ctx)?;
        iterations += 1;

        let (Some(k), Some(kz)) = (y.argmax_abs(), z.argmax_abs()) else {
            break Convergence::Converged;
        };
        let dominant = z[kz];
        if dominant == T::zero() {
            // y lies in the null space
            mu = T::zero();
            break Convergence::Converged;
        }
        let next_mu = z[k] / y[k];
        y = Vector::from_vec(z.iter().map(|&v| v / dominant).collect());
        ctx.count(n as u64 + 1);

        if iterations == 1 {
            mu = next_mu;
            continue;
        }
        let change = if next_mu != T::zero() {
            ((next_mu - mu) / next_mu).abs()
        } else {
            (next_mu - mu).abs()
        };
        ctx.count(2);
        mu = next_mu;
        if ctx.debug_level() >= 1 {
            debug!(iterations, estimate = %mu, %change, "power method");
        }
        if change <= tol {
            break Convergence::Converged;
        }
        if let Some(prev) = prev_change {
            if change > prev {
                warn!(iterations, %change, previous = %prev, "power method diverged");
                break Convergence::Diverged;
            }
        }
        prev_change = Some(change);
    };

    let value = match which {
        Extremal::Largest => mu,
        Extremal::Smallest if mu != T::zero() => T::one() / mu,
        Extremal::Smallest => T::infinity(),
    };
    let vector = y.normalize().unwrap_or(y);
    Ok(ExtremalEigen {
        value,
        vector,
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

    fn tight() -> Context<f64> {
        Context::new(Settings::default().with_tolerance(1e-12).with_max_iter(200))
    }

    #[test]
    fn largest_of_symmetric_2x2() {
        let ctx = tight();
        let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let e = extremal_eigenvalue(&a, Extremal::Largest, &ctx).unwrap();
        assert_eq!(e.status, Convergence::Converged);
        let lambda = (5.0 + 5f64.sqrt()) / 2.0;
        assert_near(e.value, lambda, 1e-9, "lambda");
        assert_near(e.vector.norm(), 1.0, 1e-12, "unit vector");
        let av = a.mul_vec(&e.vector);
        for i in 0..2 {
            assert_near(av[i], lambda * e.vector[i], 1e-6, "A v = lambda v");
        }
    }

    #[test]
    fn smallest_via_inverse_iteration() {
        let ctx = tight();
        let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let e = extremal_eigenvalue(&a, Extremal::Smallest, &ctx)
            .unwrap()
            .into_result()
            .unwrap();
        assert_near(e.value, (5.0 - 5f64.sqrt()) / 2.0, 1e-9, "lambda min");
    }

    #[test]
    fn negative_dominant_eigenvalue_keeps_sign() {
        let ctx = tight();
        let a = Matrix::from_rows(2, 2, &[-5.0, 0.0, 0.0, 1.0]);
        let e = extremal_eigenvalue(&a, Extremal::Largest, &ctx).unwrap();
        assert_near(e.value, -5.0, 1e-9, "lambda");
    }

    #[test]
    fn smallest_of_singular_matrix_fails() {
        let ctx = tight();
        let a = Matrix::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(
            extremal_eigenvalue(&a, Extremal::Smallest, &ctx).unwrap_err(),
            LinalgError::Singular
        );
    }

    #[test]
    fn zero_matrix_converges_to_zero() {
        let ctx = tight();
        let a = Matrix::<f64>::zeros(3, 3);
        let e = extremal_eigenvalue(&a, Extremal::Largest, &ctx).unwrap();
        assert_eq!(e.status, Convergence::Converged);
        assert_eq!(e.value, 0.0);
    }

    #[test]
    fn iteration_cap() {
        let ctx = Context::new(Settings::<f64>::default().with_tolerance(1e-15).with_max_iter(3));
        let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let e = extremal_eigenvalue(&a, Extremal::Largest, &ctx).unwrap();
        assert_eq!(e.status, Convergence::IterationLimitExceeded);
        assert_eq!(e.iterations, 3);
        assert!(e.into_result().is_err());
    }
}
