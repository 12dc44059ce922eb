use tracing::debug;

use crate::context::Context;
use crate::linalg::{jacobi_eigen, LinalgError};
use crate::matrix::{Matrix, Vector};
use crate::traits::FloatScalar;

// ── Basis completion ────────────────────────────────────────────────

/// Remove the components of `v` along each (orthonormal) vector in `basis`.
fn project_out<T: FloatScalar>(mut v: Vector<T>, basis: &[Vector<T>], ctx: &Context<T>) -> Vector<T> {
    for q in basis {
        let coeff = q.dot(&v);
        for (x, &qi) in v.as_mut_slice().iter_mut().zip(q.iter()) {
            *x = *x - coeff * qi;
        }
    }
    ctx.count((4 * v.len() * basis.len()) as u64);
    v
}

/// Fill the columns of `u` not marked in `filled` with unit vectors
/// orthogonal to every other column (classical Gram-Schmidt with one
/// reorthogonalization pass).
///
/// Each new column starts from the standard basis vector with the largest
/// residual after projection, so it is never close to the existing span.
fn complete_basis<T: FloatScalar>(u: &mut Matrix<T>, filled: &[bool], ctx: &Context<T>) {
    let m = u.nrows();
    let mut basis: Vec<Vector<T>> = (0..m).filter(|&c| filled[c]).map(|c| u.column(c)).collect();

    for col in (0..m).filter(|&c| !filled[c]) {
        let mut best: Option<(Vector<T>, T)> = None;
        for j in 0..m {
            let r = project_out(Vector::unit(m, j), &basis, ctx);
            let norm = r.norm();
            if best.as_ref().map_or(true, |(_, b)| norm > *b) {
                best = Some((r, norm));
            }
        }
        let Some((r, _)) = best else { return };
        let r = project_out(r, &basis, ctx);
        let q = r.normalize().unwrap_or_else(|| Vector::unit(m, col));
        u.set_column(col, &q);
        basis.push(q);
    }
}

// ── SVD ─────────────────────────────────────────────────────────────

/// Singular value decomposition `A = U·S·Vᵗ` of an `m x n` matrix.
///
/// Computed from the Jacobi eigendecomposition of `AᵗA`: the eigenvalues
/// (clamped at zero, sorted descending) give `σᵢ = sqrt(λᵢ)` and the
/// eigenvectors give `V`. Columns of `U` are `A·vᵢ/σᵢ` for non-zero `σᵢ`;
/// the remaining columns are completed to an orthonormal basis.
///
/// Singular values at or below `σ_max·sqrt(ε)·max(m, n)` are set to
/// exactly zero. The cutoff is relative, so uniformly small matrices keep
/// their full rank.
///
/// # Example
///
/// ```
/// use densolve::{Context, Matrix, Settings};
/// use densolve::linalg::compute_svd;
///
/// let ctx = Context::new(Settings::<f64>::default().with_tolerance(1e-12));
/// let a = Matrix::from_rows(3, 2, &[1.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
/// let svd = compute_svd(&a, &ctx).unwrap();
/// assert!((svd.singular_values()[0] - 2.0).abs() < 1e-10);
/// assert!((svd.singular_values()[1] - 1.0).abs() < 1e-10);
/// assert_eq!(svd.rank(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Svd<T> {
    /// `m x n`, singular values on the leading diagonal.
    s: Matrix<T>,
    /// `m x m` orthonormal.
    u: Matrix<T>,
    /// `n x n` orthonormal.
    v: Matrix<T>,
    singular_values: Vector<T>,
}

impl<T: FloatScalar> Svd<T> {
    #[inline]
    pub fn s(&self) -> &Matrix<T> {
        &self.s
    }

    /// Left singular vectors as columns.
    #[inline]
    pub fn u(&self) -> &Matrix<T> {
        &self.u
    }

    /// Right singular vectors as columns.
    #[inline]
    pub fn v(&self) -> &Matrix<T> {
        &self.v
    }

    /// The `min(m, n)` singular values, sorted descending.
    #[inline]
    pub fn singular_values(&self) -> &Vector<T> {
        &self.singular_values
    }

    /// `U·S·Vᵗ`.
    pub fn reconstruct(&self) -> Matrix<T> {
        &(&self.u * &self.s) * &self.v.transpose()
    }

    /// Number of non-zero singular values.
    pub fn rank(&self) -> usize {
        self.singular_values.iter().filter(|&&s| s > T::zero()).count()
    }

    /// Condition number: σ_max / σ_min.
    ///
    /// Returns infinity if the smallest singular value is zero.
    pub fn condition_number(&self) -> T {
        let p = self.singular_values.len();
        if p == 0 {
            return T::one();
        }
        let s_max = self.singular_values[0];
        let s_min = self.singular_values[p - 1];
        if s_min == T::zero() {
            T::infinity()
        } else {
            s_max / s_min
        }
    }
}

/// Compute the SVD of `a` (any shape).
///
/// Fails with [`LinalgError::Diverged`] or
/// [`LinalgError::IterationLimitExceeded`] when the Jacobi sweeps on `AᵗA`
/// do not converge.
pub fn compute_svd<T: FloatScalar>(a: &Matrix<T>, ctx: &Context<T>) -> Result<Svd<T>, LinalgError> {
    let (m, n) = (a.nrows(), a.ncols());
    let p = m.min(n);
    if p == 0 {
        return Ok(Svd {
            s: Matrix::zeros(m, n),
            u: Matrix::eye(m),
            v: Matrix::eye(n),
            singular_values: Vector::zeros(0),
        });
    }

    let ata = &a.transpose() * a;
    ctx.count((2 * m * n * n) as u64);
    let eig = jacobi_eigen(&ata, true, ctx)?.into_result()?;
    let eigvecs = eig.vectors.unwrap_or_else(|| Matrix::eye(n));

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&i, &j| {
        eig.values[j]
            .partial_cmp(&eig.values[i])
            .unwrap_or(core::cmp::Ordering::Equal)
    });
    let v = eigvecs.select_columns(&order);

    let lambdas: Vec<T> = order.iter().map(|&i| eig.values[i].max(T::zero())).collect();
    let sigma_max = lambdas[0].sqrt();
    let cutoff = sigma_max * T::epsilon().sqrt() * T::from_count(m.max(n));
    let sigma: Vec<T> = lambdas[..p]
        .iter()
        .map(|&l| {
            let s = l.sqrt();
            if s <= cutoff {
                T::zero()
            } else {
                s
            }
        })
        .collect();
    ctx.count(n as u64 + 3);

    let mut u = Matrix::zeros(m, m);
    let mut filled = vec![false; m];
    for (i, &s) in sigma.iter().enumerate() {
        if s == T::zero() {
            continue;
        }
        let av = a.mul_vec(&v.column(i));
        let inv = T::one() / s;
        u.set_column(i, &Vector::from_vec(av.iter().map(|&x| x * inv).collect()));
        filled[i] = true;
        ctx.count((2 * m * n + m + 1) as u64);
    }
    complete_basis(&mut u, &filled, ctx);

    let mut s = Matrix::zeros(m, n);
    for (i, &si) in sigma.iter().enumerate() {
        s[(i, i)] = si;
    }
    let singular_values = Vector::from_vec(sigma);
    if ctx.debug_level() >= 1 {
        debug!(rows = m, cols = n, sweeps = eig.iterations, sigma = %singular_values, "svd");
    }
    ctx.trace_matrix("U", &u);
    ctx.trace_matrix("V", &v);

    Ok(Svd {
        s,
        u,
        v,
        singular_values,
    })
}

impl<T: FloatScalar> Matrix<T> {
    /// Singular value decomposition; see [`compute_svd`].
    pub fn svd(&self, ctx: &Context<T>) -> Result<Svd<T>, LinalgError> {
        compute_svd(self, ctx)
    }
}
