//! Stationary iterative solvers and LU iterative refinement.
//!
//! All three methods share one driver, [`iterate`], and differ only in the
//! [`IterationStep`] that produces the next iterate:
//!
//! ```text
//! x = x0
//! r = ||b - A*x||inf
//! d = 0
//! loop:
//!     if r <= tolerance:            converged
//!     if k == max_iter:             iteration limit exceeded
//!     x', d' = step(x)
//!     r' = ||b - A*x'||inf
//!     if measure(r', d') grew:      diverged (keep best x)
//!     x, r, d = x', r', d'
//! ```
//!
//! The residual is always measured on the caller's system, even when the
//! step works on a preconditioned copy.
//!
//! Jacobi and Gauss-Seidel judge divergence on the correction
//! `d = ‖x' − x‖∞`: under row diagonal dominance the correction contracts
//! every step, while the residual may grow once before it falls. LU
//! refinement judges divergence on the residual.
//!
//! # Preconditioning
//!
//! With [`Preconditioner::Jacobi`] every row of `A` and `b` is scaled by
//! `1 / A[i][i]` before the Jacobi or Gauss-Seidel steps run, giving the
//! stepped system a unit diagonal.

use tracing::{debug, trace, warn};

use crate::context::{Context, Preconditioner};
use crate::linalg::lu::LuDecomposition;
use crate::linalg::{residual_inf, Convergence, IterationInfo, LinalgError, Solution};
use crate::matrix::{Matrix, Vector};
use crate::traits::{FloatScalar, MatrixRef};

/// Next iterate produced by an [`IterationStep`].
#[derive(Debug, Clone, PartialEq)]
pub struct Step<T> {
    pub x: Vector<T>,
    /// `‖x_next − x‖∞`.
    pub correction: T,
}

/// Quantity whose growth stops [`iterate`] with [`Convergence::Diverged`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DivergenceMeasure {
    /// `‖b − A·x‖∞`.
    Residual,
    /// `‖x_next − x‖∞`, compared from the second step on.
    Correction,
}

/// One step of a stationary iteration.
pub trait IterationStep<T: FloatScalar> {
    /// Method name used in log output.
    fn name(&self) -> &'static str;

    fn divergence_measure(&self) -> DivergenceMeasure {
        DivergenceMeasure::Residual
    }

    fn step(&self, x: &[T], ctx: &Context<T>) -> Result<Step<T>, LinalgError>;
}

// ═══════════════════════════════════════════════════════════════════════════
// Steps
// ═══════════════════════════════════════════════════════════════════════════

/// Copy `A`, `b`, optionally scaling rows by the inverse diagonal.
fn prepare<T: FloatScalar>(
    a: &Matrix<T>,
    b: &[T],
    preconditioner: Preconditioner,
    ctx: &Context<T>,
) -> Result<(Matrix<T>, Vector<T>), LinalgError> {
    let n = a.nrows();
    if !a.is_square() {
        return Err(LinalgError::DimensionMismatch {
            expected: (n, n),
            got: (a.nrows(), a.ncols()),
        });
    }
    if b.len() != n {
        return Err(LinalgError::DimensionMismatch {
            expected: (n, 1),
            got: (b.len(), 1),
        });
    }
    if (0..n).any(|i| a[(i, i)] == T::zero()) {
        return Err(LinalgError::Singular);
    }
    let mut a = a.clone();
    let mut b = Vector::from_slice(b);
    if preconditioner == Preconditioner::Jacobi {
        for i in 0..n {
            let inv = T::one() / a[(i, i)];
            for v in a.row_mut(i) {
                *v = *v * inv;
            }
            b[i] = b[i] * inv;
        }
        ctx.count((n * (n + 2)) as u64);
        ctx.trace_matrix("preconditioned matrix", &a);
    }
    Ok((a, b))
}

/// Jacobi step: every component is updated from the previous iterate.
#[derive(Debug, Clone)]
pub struct JacobiStep<T> {
    a: Matrix<T>,
    b: Vector<T>,
}

impl<T: FloatScalar> JacobiStep<T> {
    /// Fails with [`LinalgError::Singular`] on a zero diagonal entry.
    pub fn new(
        a: &Matrix<T>,
        b: &[T],
        preconditioner: Preconditioner,
        ctx: &Context<T>,
    ) -> Result<Self, LinalgError> {
        let (a, b) = prepare(a, b, preconditioner, ctx)?;
        Ok(Self { a, b })
    }
}

impl<T: FloatScalar> IterationStep<T> for JacobiStep<T> {
    fn name(&self) -> &'static str {
        "jacobi"
    }

    fn divergence_measure(&self) -> DivergenceMeasure {
        DivergenceMeasure::Correction
    }

    fn step(&self, x: &[T], ctx: &Context<T>) -> Result<Step<T>, LinalgError> {
        let n = x.len();
        let mut next = Vector::zeros(n);
        let mut correction = T::zero();
        for i in 0..n {
            let row = self.a.row(i);
            let off = (0..n)
                .filter(|&j| j != i)
                .fold(T::zero(), |acc, j| acc + row[j] * x[j]);
            next[i] = (self.b[i] - off) / row[i];
            correction = correction.max((next[i] - x[i]).abs());
        }
        ctx.count((2 * n * n) as u64);
        Ok(Step {
            x: next,
            correction,
        })
    }
}

/// Gauss-Seidel step: updated components are used as soon as available.
#[derive(Debug, Clone)]
pub struct GaussSeidelStep<T> {
    a: Matrix<T>,
    b: Vector<T>,
}

impl<T: FloatScalar> GaussSeidelStep<T> {
    /// Fails with [`LinalgError::Singular`] on a zero diagonal entry.
    pub fn new(
        a: &Matrix<T>,
        b: &[T],
        preconditioner: Preconditioner,
        ctx: &Context<T>,
    ) -> Result<Self, LinalgError> {
        let (a, b) = prepare(a, b, preconditioner, ctx)?;
        Ok(Self { a, b })
    }
}

impl<T: FloatScalar> IterationStep<T> for GaussSeidelStep<T> {
    fn name(&self) -> &'static str {
        "gauss-seidel"
    }

    fn divergence_measure(&self) -> DivergenceMeasure {
        DivergenceMeasure::Correction
    }

    fn step(&self, x: &[T], ctx: &Context<T>) -> Result<Step<T>, LinalgError> {
        let n = x.len();
        let mut next = Vector::from_slice(x);
        for i in 0..n {
            let row = self.a.row(i);
            let off = (0..n)
                .filter(|&j| j != i)
                .fold(T::zero(), |acc, j| acc + row[j] * next[j]);
            next[i] = (self.b[i] - off) / row[i];
        }
        ctx.count((2 * n * n) as u64);
        let correction = next
            .iter()
            .zip(x)
            .fold(T::zero(), |acc, (&u, &v)| acc.max((u - v).abs()));
        Ok(Step {
            x: next,
            correction,
        })
    }
}

/// Iterative-refinement step: solve `A·δ = b − A·x` with an existing LU
/// decomposition and return `x + δ`.
#[derive(Debug, Clone, Copy)]
pub struct LuCorrectionStep<'a, T> {
    a: &'a Matrix<T>,
    b: &'a [T],
    lu: &'a LuDecomposition<T>,
}

impl<'a, T: FloatScalar> LuCorrectionStep<'a, T> {
    pub fn new(a: &'a Matrix<T>, b: &'a [T], lu: &'a LuDecomposition<T>) -> Self {
        Self { a, b, lu }
    }
}

impl<T: FloatScalar> IterationStep<T> for LuCorrectionStep<'_, T> {
    fn name(&self) -> &'static str {
        "lu-refinement"
    }

    fn step(&self, x: &[T], ctx: &Context<T>) -> Result<Step<T>, LinalgError> {
        let n = x.len();
        let r: Vec<T> = (0..n)
            .map(|i| {
                let ax = self.a.row(i)
                    .iter()
                    .zip(x)
                    .fold(T::zero(), |acc, (&a, &v)| acc + a * v);
                self.b[i] - ax
            })
            .collect();
        ctx.count((2 * n * n + n) as u64);
        let delta = self.lu.solve(&r, ctx)?;
        let next = Vector::from_vec(x.iter().zip(delta.iter()).map(|(&v, &d)| v + d).collect());
        ctx.count(n as u64);
        Ok(Step {
            x: next,
            correction: delta.norm_inf(),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Driver
// ═══════════════════════════════════════════════════════════════════════════

/// Run `step` from `x0` until the residual `‖b − A·x‖∞` drops to the
/// tolerance, the step's [`DivergenceMeasure`] grows, or the iteration cap
/// is hit.
///
/// Soft failures are not errors: the returned [`IterationInfo`] carries the
/// status. On divergence the returned iterate is the one with the lowest
/// residual seen; at the cap it is the latest.
pub fn iterate<T, S>(
    a: &impl MatrixRef<T>,
    b: &[T],
    x0: Vector<T>,
    step: &S,
    ctx: &Context<T>,
) -> Result<(Vector<T>, IterationInfo<T>), LinalgError>
where
    T: FloatScalar,
    S: IterationStep<T>,
{
    let tol = ctx.tolerance();
    let mut x = x0;
    let mut residual = residual_inf(a, x.as_slice(), b, ctx);
    let mut best = (x.clone(), residual);
    let mut correction = T::zero();
    let mut iterations = 0;

    let status = loop {
        if ctx.debug_level() >= 1 {
            debug!(method = step.name(), iterations, %residual, %correction, "iteration");
        }
        if ctx.debug_level() >= 2 {
            trace!(method = step.name(), x = %x, "iterate");
        }
        if residual <= tol {
            break Convergence::Converged;
        }
        if iterations >= ctx.max_iter() {
            warn!(method = step.name(), iterations, %residual, "iteration limit exceeded");
            break Convergence::IterationLimitExceeded;
        }
        let next = step.step(x.as_slice(), ctx)?;
        iterations += 1;
        let next_residual = residual_inf(a, next.x.as_slice(), b, ctx);
        // NaN counts as growth
        let grew = match step.divergence_measure() {
            DivergenceMeasure::Residual => !(next_residual <= residual),
            DivergenceMeasure::Correction => iterations > 1 && !(next.correction <= correction),
        };
        if grew {
            warn!(
                method = step.name(),
                iterations,
                residual = %next_residual,
                correction = %next.correction,
                "iteration diverged, keeping best iterate"
            );
            (x, residual) = best;
            break Convergence::Diverged;
        }
        x = next.x;
        residual = next_residual;
        correction = next.correction;
        if residual <= best.1 {
            best = (x.clone(), residual);
        }
    };

    Ok((
        x,
        IterationInfo {
            iterations,
            residual,
            correction,
            status,
        },
    ))
}

fn diagonal_start<T: FloatScalar>(a: &Matrix<T>, b: &Vector<T>, ctx: &Context<T>) -> Vector<T> {
    let n = b.len();
    ctx.count(n as u64);
    Vector::from_vec((0..n).map(|i| b[i] / a[(i, i)]).collect())
}

/// Solve `[A | b]` by Jacobi iteration starting from `x_i = b_i / a_ii`.
///
/// Diagonal dominance is not enforced; check it with
/// [`Matrix::is_diagonally_dominant`] when convergence matters.
///
/// ```
/// use densolve::{Context, Matrix, Settings};
/// use densolve::linalg::solve_jacobi;
///
/// let ctx = Context::new(Settings::<f64>::default().with_tolerance(1e-10));
/// let sys = Matrix::from_rows(2, 3, &[2.0, 1.0, 3.0, 1.0, 3.0, 5.0]);
/// let sol = solve_jacobi(&sys, &ctx).unwrap().into_result().unwrap();
/// assert!((sol.x[0] - 0.8).abs() < 1e-9);
/// ```
pub fn solve_jacobi<T: FloatScalar>(
    system: &Matrix<T>,
    ctx: &Context<T>,
) -> Result<Solution<T>, LinalgError> {
    let (a, b) = system.split_system()?;
    let step = JacobiStep::new(&a, b.as_slice(), ctx.settings().preconditioner, ctx)?;
    let x0 = diagonal_start(&a, &b, ctx);
    let (x, info) = iterate(&a, b.as_slice(), x0, &step, ctx)?;
    Ok(Solution {
        x,
        det: None,
        iteration: Some(info),
    })
}

/// Solve `[A | b]` by Gauss-Seidel iteration starting from `x_i = b_i / a_ii`.
pub fn solve_gauss_seidel<T: FloatScalar>(
    system: &Matrix<T>,
    ctx: &Context<T>,
) -> Result<Solution<T>, LinalgError> {
    let (a, b) = system.split_system()?;
    let step = GaussSeidelStep::new(&a, b.as_slice(), ctx.settings().preconditioner, ctx)?;
    let x0 = diagonal_start(&a, &b, ctx);
    let (x, info) = iterate(&a, b.as_slice(), x0, &step, ctx)?;
    Ok(Solution {
        x,
        det: None,
        iteration: Some(info),
    })
}

/// LU solve followed by iterative refinement with the same factors.
///
/// ```
/// use densolve::{Context, Matrix};
/// use densolve::linalg::{solve_lu_refined, Convergence};
///
/// let ctx = Context::<f64>::default();
/// let sys = Matrix::from_rows(2, 3, &[2.0, 1.0, 3.0, 1.0, 3.0, 5.0]);
/// let sol = solve_lu_refined(&sys, true, &ctx).unwrap();
/// assert_eq!(sol.iteration.unwrap().status, Convergence::Converged);
/// assert!((sol.det.unwrap() - 5.0).abs() < 1e-12);
/// ```
pub fn solve_lu_refined<T: FloatScalar>(
    system: &Matrix<T>,
    want_det: bool,
    ctx: &Context<T>,
) -> Result<Solution<T>, LinalgError> {
    let (a, b) = system.split_system()?;
    let lu = LuDecomposition::new(&a, ctx)?;
    let x0 = lu.solve(b.as_slice(), ctx)?;
    let step = LuCorrectionStep::new(&a, b.as_slice(), &lu);
    let (x, info) = iterate(&a, b.as_slice(), x0, &step, ctx)?;
    Ok(Solution {
        x,
        det: want_det.then(|| lu.det(ctx)),
        iteration: Some(info),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Settings;
    use crate::linalg::solve_gauss;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {}", msg, a, b);
    }

    fn tight() -> Context<f64> {
        Context::new(
            Settings::default()
                .with_tolerance(1e-12)
                .with_max_iter(500),
        )
    }

    fn dominant3() -> Matrix<f64> {
        Matrix::from_rows(
            3,
            4,
            &[10.0, -1.0, 2.0, 6.0, -1.0, 11.0, -1.0, 25.0, 2.0, -1.0, 10.0, -11.0],
        )
    }

    #[test]
    fn jacobi_matches_gauss() {
        let ctx = tight();
        let sys = dominant3();
        let exact = solve_gauss(&sys, false, &ctx).unwrap();
        let sol = solve_jacobi(&sys, &ctx).unwrap();
        let info = sol.iteration.unwrap();
        assert_eq!(info.status, Convergence::Converged);
        assert!(info.residual <= 1e-12);
        for i in 0..3 {
            assert_near(sol.x[i], exact.x[i], 1e-10, "x");
        }
    }

    #[test]
    fn gauss_seidel_needs_fewer_iterations() {
        let ctx = tight();
        let sys = dominant3();
        let j = solve_jacobi(&sys, &ctx).unwrap().iteration.unwrap();
        let gs = solve_gauss_seidel(&sys, &ctx).unwrap();
        let gs_info = gs.iteration.unwrap();
        assert_eq!(gs_info.status, Convergence::Converged);
        assert!(gs_info.iterations < j.iterations);
    }

    #[test]
    fn preconditioned_jacobi_agrees() {
        let ctx = Context::new(
            Settings::default()
                .with_tolerance(1e-12)
                .with_max_iter(500)
                .with_preconditioner(Preconditioner::Jacobi),
        );
        let sys = dominant3();
        let exact = solve_gauss(&sys, false, &ctx).unwrap();
        let sol = solve_jacobi(&sys, &ctx).unwrap().into_result().unwrap();
        for i in 0..3 {
            assert_near(sol.x[i], exact.x[i], 1e-10, "x");
        }
    }

    #[test]
    fn divergence_keeps_starting_iterate() {
        // spectral radius of the Jacobi iteration matrix is sqrt(6); the
        // corrections are 8 then 24, and x0 has the lowest residual
        let ctx = Context::<f64>::default();
        let sys = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 3.0, 1.0, 4.0]);
        let sol = solve_jacobi(&sys, &ctx).unwrap();
        let info = sol.iteration.unwrap();
        assert_eq!(info.status, Convergence::Diverged);
        assert_eq!(info.iterations, 2);
        assert_eq!(sol.x.as_slice(), &[3.0, 4.0]);
        assert_near(info.residual, 9.0, 1e-12, "residual");
        assert_eq!(
            sol.into_result().unwrap_err(),
            LinalgError::Diverged { iterations: 2 }
        );
    }

    #[test]
    fn row_dominant_system_survives_residual_bump() {
        // not column dominant: the Jacobi residual goes 9 -> 0.09 -> 0.81
        // while the corrections shrink 0.9 -> 0.09 -> 0.081
        let sys = Matrix::from_rows(2, 3, &[10.0, 9.0, 0.0, 0.1, 1.0, 1.0]);
        let (a, _) = sys.split_system().unwrap();
        assert!(a.is_diagonally_dominant());
        for ctx in [Context::<f64>::default(), tight()] {
            for sol in [
                solve_jacobi(&sys, &ctx).unwrap(),
                solve_gauss_seidel(&sys, &ctx).unwrap(),
            ] {
                let info = sol.iteration.unwrap();
                assert_eq!(info.status, Convergence::Converged);
                assert!(info.residual <= ctx.tolerance());
                assert_near(sol.x[0], -9.0 / 9.1, 1e-5, "x0");
                assert_near(sol.x[1], 10.0 / 9.1, 1e-5, "x1");
            }
        }
    }

    #[test]
    fn refinement_watches_the_residual() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let lu = LuDecomposition::new(&a, &ctx).unwrap();
        let b = [3.0, 5.0];
        assert_eq!(
            LuCorrectionStep::new(&a, &b, &lu).divergence_measure(),
            DivergenceMeasure::Residual
        );
        let j = JacobiStep::new(&a, &b, Preconditioner::None, &ctx).unwrap();
        assert_eq!(j.divergence_measure(), DivergenceMeasure::Correction);
    }

    #[test]
    fn iteration_cap_reports_latest() {
        let ctx = Context::new(
            Settings::<f64>::default()
                .with_tolerance(1e-14)
                .with_max_iter(2),
        );
        let sys = Matrix::from_rows(2, 3, &[4.0, 1.0, 1.0, 1.0, 3.0, 2.0]);
        let sol = solve_jacobi(&sys, &ctx).unwrap();
        let info = sol.iteration.unwrap();
        assert_eq!(info.status, Convergence::IterationLimitExceeded);
        assert_eq!(info.iterations, 2);
        assert_near(info.residual, 1.0 / 18.0, 1e-12, "residual");
    }

    #[test]
    fn zero_diagonal_is_singular() {
        let ctx = Context::<f64>::default();
        let sys = Matrix::from_rows(2, 3, &[0.0, 1.0, 1.0, 1.0, 0.0, 1.0]);
        assert_eq!(solve_jacobi(&sys, &ctx).unwrap_err(), LinalgError::Singular);
        assert_eq!(
            solve_gauss_seidel(&sys, &ctx).unwrap_err(),
            LinalgError::Singular
        );
    }

    #[test]
    fn refinement_converges_immediately_on_easy_system() {
        let ctx = tight();
        let sol = solve_lu_refined(&dominant3(), true, &ctx).unwrap();
        let info = sol.iteration.unwrap();
        assert_eq!(info.status, Convergence::Converged);
        assert!(info.iterations <= 2);
    }

    #[test]
    fn refinement_never_converges_below_roundoff() {
        let ctx = Context::new(
            Settings::<f64>::default()
                .with_tolerance(1e-300)
                .with_max_iter(5),
        );
        let sys = Matrix::from_rows(
            3,
            4,
            &[1.0, 1.0 / 2.0, 1.0 / 3.0, 1.0, 1.0 / 2.0, 1.0 / 3.0, 1.0 / 4.0, 0.0, 1.0 / 3.0, 1.0 / 4.0, 1.0 / 5.0, 0.0],
        );
        let sol = solve_lu_refined(&sys, false, &ctx).unwrap();
        assert!(!sol.is_converged());
        assert!(sol.into_result().is_err());
    }
}
