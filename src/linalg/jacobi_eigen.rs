//! Cyclic Jacobi eigenvalue method for symmetric matrices.
//!
//! Each sweep visits the rows in order; in row `p` the largest off-diagonal
//! entry `a_pq` (`q > p`) is annihilated by a plane rotation
//!
//! ```text
//! φ = (a_qq − a_pp) / (2·a_pq)
//! t = sign(φ) / (|φ| + sqrt(φ² + 1))
//! c = 1 / sqrt(t² + 1),  s = t·c
//! ```
//!
//! applied as `A ← Jᵗ·A·J`. Accumulating `V ← V·J` from the identity gives
//! the eigenvectors as columns of `V`.

use tracing::{debug, warn};

use crate::context::Context;
use crate::linalg::{Convergence, LinalgError};
use crate::matrix::{Matrix, Vector};
use crate::traits::{sign, FloatScalar};

/// Eigenvalues and (optionally) eigenvectors of a matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Eigen<T> {
    /// Eigenvalues in diagonal order of the final iterate.
    pub values: Vector<T>,
    /// Eigenvectors as columns, matching `values`.
    pub vectors: Option<Matrix<T>>,
    /// Sweeps (Jacobi) or LR steps (Rutishauser) performed.
    pub iterations: usize,
    pub status: Convergence,
}

impl<T> Eigen<T> {
    /// Turn a non-converged status into an error.
    pub fn into_result(self) -> Result<Self, LinalgError> {
        self.status.check(self.iterations)?;
        Ok(self)
    }
}

/// Annihilate `a[p][q]` with a Jacobi rotation, updating `v` if present.
fn rotate<T: FloatScalar>(
    a: &mut Matrix<T>,
    v: Option<&mut Matrix<T>>,
    p: usize,
    q: usize,
    ctx: &Context<T>,
) {
    let n = a.nrows();
    let apq = a[(p, q)];
    let phi = (a[(q, q)] - a[(p, p)]) / (T::two() * apq);
    let t = sign(phi) / (phi.abs() + phi.hypot(T::one()));
    let c = T::one() / t.hypot(T::one());
    let s = t * c;

    a[(p, p)] = a[(p, p)] - t * apq;
    a[(q, q)] = a[(q, q)] + t * apq;
    a[(p, q)] = T::zero();
    a[(q, p)] = T::zero();
    for r in (0..n).filter(|&r| r != p && r != q) {
        let arp = a[(r, p)];
        let arq = a[(r, q)];
        let new_p = c * arp - s * arq;
        let new_q = s * arp + c * arq;
        a[(r, p)] = new_p;
        a[(p, r)] = new_p;
        a[(r, q)] = new_q;
        a[(q, r)] = new_q;
    }
    ctx.count(14 + 6 * (n as u64 - 2));

    if let Some(v) = v {
        for r in 0..n {
            let vrp = v[(r, p)];
            let vrq = v[(r, q)];
            v[(r, p)] = c * vrp - s * vrq;
            v[(r, q)] = s * vrp + c * vrq;
        }
        ctx.count(6 * n as u64);
    }
}

/// One cyclic sweep. Returns `false` if no rotation was needed.
fn sweep<T: FloatScalar>(
    a: &mut Matrix<T>,
    mut v: Option<&mut Matrix<T>>,
    ctx: &Context<T>,
) -> bool {
    let n = a.nrows();
    let mut rotated = false;
    for p in 0..n.saturating_sub(1) {
        let (q, apq) = ((p + 1)..n)
            .map(|q| (q, a[(p, q)].abs()))
            .fold((p + 1, T::zero()), |best, cur| if cur.1 > best.1 { cur } else { best });
        if apq == T::zero() {
            continue;
        }
        rotate(a, v.as_deref_mut(), p, q, ctx);
        rotated = true;
    }
    rotated
}

/// All eigenvalues of a symmetric matrix by the cyclic Jacobi method,
/// with eigenvectors when `want_vectors` is set.
///
/// Converges when every off-diagonal magnitude is within the tolerance or
/// a sweep finds nothing to rotate. If the largest off-diagonal magnitude
/// grows over two consecutive sweeps the method reports
/// [`Convergence::Diverged`] and returns the state of the best sweep.
///
/// ```
/// use densolve::{Context, Matrix};
/// use densolve::linalg::jacobi_eigen;
///
/// let ctx = Context::<f64>::default();
/// let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 2.0]);
/// let eig = jacobi_eigen(&a, true, &ctx).unwrap().into_result().unwrap();
/// let mut values = eig.values.into_vec();
/// values.sort_by(|a, b| a.partial_cmp(b).unwrap());
/// assert!((values[0] - 1.0).abs() < 1e-9);
/// assert!((values[1] - 3.0).abs() < 1e-9);
/// ```
pub fn jacobi_eigen<T: FloatScalar>(
    a: &Matrix<T>,
    want_vectors: bool,
    ctx: &Context<T>,
) -> Result<Eigen<T>, LinalgError> {
    if !a.is_square() {
        return Err(LinalgError::DimensionMismatch {
            expected: (a.nrows(), a.nrows()),
            got: (a.nrows(), a.ncols()),
        });
    }
    if !a.is_symmetric() {
        return Err(LinalgError::NotSymmetric);
    }
    let n = a.nrows();
    let tol = ctx.tolerance();

    let mut work = a.clone();
    let mut v = want_vectors.then(|| Matrix::eye(n));
    let mut off = work.max_off_diagonal();
    let mut best = (work.clone(), v.clone(), off);
    let mut increases = 0;
    let mut sweeps = 0;

    let status = loop {
        if off <= tol {
            break Convergence::Converged;
        }
        if sweeps >= ctx.max_iter() {
            warn!(sweeps, max_off_diagonal = %off, "jacobi eigen: iteration limit exceeded");
            break Convergence::IterationLimitExceeded;
        }
        let rotated = sweep(&mut work, v.as_mut(), ctx);
        sweeps += 1;
        if !rotated {
            break Convergence::Converged;
        }

        let next = work.max_off_diagonal();
        if ctx.debug_level() >= 1 {
            debug!(sweeps, max_off_diagonal = %next, "jacobi sweep");
        }
        ctx.trace_matrix("jacobi iterate", &work);

        increases = if next > off { increases + 1 } else { 0 };
        off = next;
        if off < best.2 {
            best = (work.clone(), v.clone(), off);
        }
        if increases >= 2 {
            warn!(sweeps, max_off_diagonal = %off, "jacobi eigen diverged, keeping best sweep");
            work = best.0;
            v = best.1;
            break Convergence::Diverged;
        }
    };

    Ok(Eigen {
        values: work.diag(),
        vectors: v,
        iterations: sweeps,
        status,
    })
}
