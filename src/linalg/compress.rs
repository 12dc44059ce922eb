use core::fmt;

use tracing::debug;

use crate::context::Context;
use crate::linalg::{LinalgError, Svd};
use crate::matrix::{Matrix, Vector};
use crate::traits::FloatScalar;

/// Summary of a set of singular values. Only positive values count.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvdStats<T> {
    pub rank: usize,
    /// `max / min`, infinite when there are no positive values.
    pub condition: T,
    pub max: T,
    pub min: T,
    pub sum: T,
}

impl<T: FloatScalar> SvdStats<T> {
    pub fn from_values(values: &[T]) -> Self {
        let positive = values.iter().copied().filter(|&s| s > T::zero());
        let (rank, max, min, sum) = positive.fold(
            (0, T::zero(), T::infinity(), T::zero()),
            |(rank, max, min, sum), s| (rank + 1, max.max(s), min.min(s), sum + s),
        );
        if rank == 0 {
            return Self {
                rank,
                condition: T::infinity(),
                max: T::zero(),
                min: T::zero(),
                sum: T::zero(),
            };
        }
        Self {
            rank,
            condition: max / min,
            max,
            min,
            sum,
        }
    }
}

impl<T: fmt::Display> fmt::Display for SvdStats<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rank {}, cond {}, max {}, min {}, sum {}",
            self.rank, self.condition, self.max, self.min, self.sum
        )
    }
}

/// Rank-truncated SVD.
#[derive(Debug, Clone, PartialEq)]
pub struct Compressed<T> {
    /// Retained singular values, descending; the diagonal of the truncated
    /// `k x k` S (see [`Compressed::s_matrix`]).
    pub s: Vector<T>,
    /// `m x k`, retained left singular vectors.
    pub u: Matrix<T>,
    /// `n x k`, retained right singular vectors.
    pub v: Matrix<T>,
    pub before: SvdStats<T>,
    pub after: SvdStats<T>,
}

impl<T: FloatScalar> Compressed<T> {
    /// Number of retained singular values.
    pub fn kept(&self) -> usize {
        self.s.len()
    }

    /// Truncated `k x k` diagonal S, so that `u·S·vᵗ` is the compressed
    /// matrix.
    pub fn s_matrix(&self) -> Matrix<T> {
        Matrix::from_diag(&self.s)
    }

    /// `Σ σᵢ·uᵢ·vᵢᵗ` over the retained triples.
    pub fn reconstruct(&self) -> Matrix<T> {
        let (m, n) = (self.u.nrows(), self.v.nrows());
        let mut out = Matrix::zeros(m, n);
        for (k, &sigma) in self.s.iter().enumerate() {
            for i in 0..m {
                let su = sigma * self.u[(i, k)];
                for (o, j) in out.row_mut(i).iter_mut().zip(0..n) {
                    *o = *o + su * self.v[(j, k)];
                }
            }
        }
        out
    }
}

/// Keep the largest singular values until their sum reaches `retain`
/// times the total, and drop the rest.
///
/// `retain` must lie in `(0, 1]`; `1` keeps every non-zero value.
///
/// ```
/// use densolve::{Context, Matrix, Settings};
/// use densolve::linalg::{compress, compute_svd};
///
/// let ctx = Context::new(Settings::<f64>::default().with_tolerance(1e-12));
/// let a = Matrix::from_rows(3, 3, &[9.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.5]);
/// let svd = compute_svd(&a, &ctx).unwrap();
/// let c = compress(&svd, 0.8, &ctx).unwrap();
/// assert_eq!(c.kept(), 1);
/// assert_eq!(c.before.rank, 3);
/// assert_eq!(c.after.rank, 1);
/// ```
pub fn compress<T: FloatScalar>(
    svd: &Svd<T>,
    retain: T,
    ctx: &Context<T>,
) -> Result<Compressed<T>, LinalgError> {
    // `!(x > 0)` also rejects NaN
    if !(retain > T::zero()) || retain > T::one() {
        return Err(LinalgError::InvalidArgument {
            reason: "retained fraction must lie in (0, 1]",
        });
    }
    let values = svd.singular_values().as_slice();
    let total = values.iter().fold(T::zero(), |acc, &s| acc + s);
    let target = retain * total;

    let mut kept = 0;
    let mut cum = T::zero();
    while kept < values.len() && cum < target {
        cum = cum + values[kept];
        kept += 1;
    }
    ctx.count((values.len() + kept + 1) as u64);

    let cols: Vec<usize> = (0..kept).collect();
    let before = SvdStats::from_values(values);
    let after = SvdStats::from_values(&values[..kept]);
    if ctx.debug_level() >= 1 {
        debug!(kept, of = values.len(), before = %before, after = %after, "svd compression");
    }
    Ok(Compressed {
        s: Vector::from_slice(&values[..kept]),
        u: svd.u().select_columns(&cols),
        v: svd.v().select_columns(&cols),
        before,
        after,
    })
}
