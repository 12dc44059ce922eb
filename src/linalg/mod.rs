//! Direct and iterative solvers, eigenvalue methods and SVD.
//!
//! Every operation takes a [`Context`](crate::Context) carrying the
//! tolerance, iteration cap and operation counter. Hard failures
//! (singularity, shape errors, missing symmetry) are returned as
//! [`LinalgError`]; iteration outcomes are reported through
//! [`Convergence`] alongside the best iterate found.

pub mod charpoly;
pub mod cholesky;
pub mod compress;
pub mod diag;
pub mod gauss;
pub mod iterative;
pub mod jacobi_eigen;
pub mod lu;
pub mod power;
pub mod rutishauser;
pub mod svd;

pub use charpoly::{char_poly_faddeev, char_poly_leverrier, CharPoly};
pub use cholesky::{solve_cholesky, CholeskyDecomposition};
pub use compress::{compress, Compressed, SvdStats};
pub use diag::{diagonalize, solve_diagonal};
pub use gauss::{
    back_substitute, forward_substitute, inverse_gauss, inverse_triangular, solve_gauss,
    solve_triangular, triangularize, Inverse, Reduced, Triangle,
};
pub use iterative::{
    iterate, solve_gauss_seidel, solve_jacobi, solve_lu_refined, DivergenceMeasure,
    GaussSeidelStep, IterationStep, JacobiStep, LuCorrectionStep, Step,
};
pub use jacobi_eigen::{jacobi_eigen, Eigen};
pub use lu::{solve_lu, LuDecomposition};
pub use power::{extremal_eigenvalue, Extremal, ExtremalEigen};
pub use rutishauser::rutishauser_eigen;
pub use svd::{compute_svd, Svd};

use crate::context::Context;
use crate::matrix::Vector;
use crate::traits::{FloatScalar, MatrixRef};

/// Errors from linear algebra operations.
///
/// ```
/// use densolve::{Context, Matrix};
/// use densolve::linalg::{solve_cholesky, solve_gauss, LinalgError};
///
/// let ctx = Context::<f64>::default();
/// let singular = Matrix::from_rows(2, 3, &[1.0, 2.0, 1.0, 2.0, 4.0, 2.0]);
/// assert_eq!(solve_gauss(&singular, false, &ctx).unwrap_err(), LinalgError::Singular);
///
/// let not_pd = Matrix::from_rows(2, 3, &[1.0, 0.0, 1.0, 0.0, -1.0, 1.0]);
/// assert_eq!(
///     solve_cholesky(&not_pd, false, &ctx).unwrap_err(),
///     LinalgError::NotPositiveDefinite,
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LinalgError {
    /// A pivot (or a diagonal entry used as divisor) is exactly zero.
    #[error("matrix is singular")]
    Singular,
    /// A Cholesky radicand was not positive.
    #[error("matrix is not positive definite")]
    NotPositiveDefinite,
    /// The operation requires `A[i][j] == A[j][i]`.
    #[error("matrix is not symmetric")]
    NotSymmetric,
    /// The iteration cap was reached before convergence.
    #[error("iteration limit exceeded after {iterations} iterations")]
    IterationLimitExceeded { iterations: usize },
    /// The error measure grew between iterations.
    #[error("iteration diverged after {iterations} iterations")]
    Diverged { iterations: usize },
    /// A buffer of the requested size could not be allocated.
    #[error("cannot allocate a {rows}x{cols} matrix")]
    AllocationFailure { rows: usize, cols: usize },
    /// Operand shapes are incompatible.
    #[error(
        "dimension mismatch: expected {}x{}, got {}x{}",
        .expected.0, .expected.1, .got.0, .got.1
    )]
    DimensionMismatch {
        expected: (usize, usize),
        got: (usize, usize),
    },
    /// An argument is outside its valid range.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: &'static str },
}

impl LinalgError {
    /// Process exit status for command-line front ends.
    ///
    /// ```
    /// use densolve::linalg::LinalgError;
    /// assert_eq!(LinalgError::Singular.exit_code(), 8);
    /// assert_eq!(LinalgError::Diverged { iterations: 3 }.exit_code(), 12);
    /// ```
    pub fn exit_code(&self) -> i32 {
        match self {
            LinalgError::DimensionMismatch { .. } | LinalgError::InvalidArgument { .. } => 5,
            LinalgError::NotPositiveDefinite => 6,
            LinalgError::AllocationFailure { .. } => 7,
            LinalgError::Singular => 8,
            LinalgError::IterationLimitExceeded { .. } => 11,
            LinalgError::Diverged { .. } => 12,
            LinalgError::NotSymmetric => 13,
        }
    }
}

/// Outcome of an iterative method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Convergence {
    Converged,
    /// The error grew; the result holds the best iterate seen.
    Diverged,
    /// The cap was reached; the result holds the latest iterate.
    IterationLimitExceeded,
}

impl Convergence {
    /// `Ok` when converged, otherwise the matching [`LinalgError`].
    pub fn check(self, iterations: usize) -> Result<(), LinalgError> {
        match self {
            Convergence::Converged => Ok(()),
            Convergence::Diverged => Err(LinalgError::Diverged { iterations }),
            Convergence::IterationLimitExceeded => {
                Err(LinalgError::IterationLimitExceeded { iterations })
            }
        }
    }
}

/// Iteration metadata attached to iterative solutions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IterationInfo<T> {
    /// Iterations performed after the starting guess.
    pub iterations: usize,
    /// `‖b − A·x‖∞` of the returned iterate.
    pub residual: T,
    /// `‖x_k − x_{k−1}‖∞` of the last accepted step.
    pub correction: T,
    pub status: Convergence,
}

/// Result of solving a linear system.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<T> {
    pub x: Vector<T>,
    /// Determinant of the coefficient matrix, when requested.
    pub det: Option<T>,
    /// Present for iterative solvers and refinement.
    pub iteration: Option<IterationInfo<T>>,
}

impl<T> Solution<T> {
    pub(crate) fn direct(x: Vector<T>, det: Option<T>) -> Self {
        Self {
            x,
            det,
            iteration: None,
        }
    }

    /// Turn a non-converged iteration status into an error.
    ///
    /// Direct solutions pass through unchanged.
    pub fn into_result(self) -> Result<Self, LinalgError> {
        if let Some(info) = &self.iteration {
            info.status.check(info.iterations)?;
        }
        Ok(self)
    }

    pub fn is_converged(&self) -> bool {
        self.iteration
            .as_ref()
            .map_or(true, |info| info.status == Convergence::Converged)
    }
}

/// `‖b − A·x‖∞` over the leading `n x n` block of `a`.
pub(crate) fn residual_inf<T: FloatScalar>(
    a: &impl MatrixRef<T>,
    x: &[T],
    b: &[T],
    ctx: &Context<T>,
) -> T {
    let n = x.len();
    let mut max = T::zero();
    for i in 0..n {
        let row = a.row(i);
        let ax = row[..n]
            .iter()
            .zip(x)
            .fold(T::zero(), |acc, (&aij, &xj)| acc + aij * xj);
        let r = (b[i] - ax).abs();
        if r > max {
            max = r;
        }
    }
    ctx.count(2 * (n * n + n) as u64);
    max
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Matrix;

    #[test]
    fn exit_codes() {
        assert_eq!(LinalgError::NotPositiveDefinite.exit_code(), 6);
        assert_eq!(LinalgError::NotSymmetric.exit_code(), 13);
        assert_eq!(
            LinalgError::IterationLimitExceeded { iterations: 1 }.exit_code(),
            11
        );
        assert_eq!(
            LinalgError::AllocationFailure { rows: 1, cols: 1 }.exit_code(),
            7
        );
        assert_eq!(
            LinalgError::InvalidArgument { reason: "x" }.exit_code(),
            5
        );
    }

    #[test]
    fn error_messages() {
        let e = LinalgError::DimensionMismatch {
            expected: (2, 3),
            got: (2, 2),
        };
        assert_eq!(e.to_string(), "dimension mismatch: expected 2x3, got 2x2");
        assert_eq!(
            LinalgError::Diverged { iterations: 4 }.to_string(),
            "iteration diverged after 4 iterations"
        );
    }

    #[test]
    fn into_result_maps_status() {
        let info = IterationInfo {
            iterations: 7,
            residual: 1.0,
            correction: 0.5,
            status: Convergence::IterationLimitExceeded,
        };
        let sol = Solution {
            x: Vector::from_slice(&[1.0_f64]),
            det: None,
            iteration: Some(info),
        };
        assert!(!sol.is_converged());
        assert_eq!(
            sol.into_result().unwrap_err(),
            LinalgError::IterationLimitExceeded { iterations: 7 }
        );
        let direct = Solution::direct(Vector::from_slice(&[1.0_f64]), Some(2.0));
        assert!(direct.into_result().is_ok());
    }

    #[test]
    fn residual_of_exact_solution() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let r = residual_inf(&a, &[0.8, 1.4], &[3.0, 5.0], &ctx);
        assert!(r < 1e-12);
        assert!(ctx.ops() > 0);
    }
}
