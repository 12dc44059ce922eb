use tracing::debug;

use crate::context::Context;
use crate::linalg::LinalgError;
use crate::matrix::Matrix;
use crate::traits::FloatScalar;

/// Characteristic polynomial `det(λI − A)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CharPoly<T> {
    /// Monic coefficients, highest degree first: `[1, c₁, …, cₙ]`.
    pub coefficients: Vec<T>,
    /// `det(A)`; only computed by [`char_poly_faddeev`].
    pub det: Option<T>,
    /// `A⁻¹`; only computed by [`char_poly_faddeev`] and absent when
    /// the determinant is zero.
    pub inverse: Option<Matrix<T>>,
}

impl<T: FloatScalar> CharPoly<T> {
    pub fn degree(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Evaluate at `x` by Horner's rule.
    pub fn eval(&self, x: T) -> T {
        self.coefficients
            .iter()
            .fold(T::zero(), |acc, &c| acc * x + c)
    }
}

fn check_square<T>(a: &Matrix<T>) -> Result<usize, LinalgError> {
    if !a.is_square() {
        return Err(LinalgError::DimensionMismatch {
            expected: (a.nrows(), a.nrows()),
            got: (a.nrows(), a.ncols()),
        });
    }
    if a.nrows() == 0 {
        return Err(LinalgError::InvalidArgument {
            reason: "characteristic polynomial of an empty matrix",
        });
    }
    Ok(a.nrows())
}

/// Leverrier's method: power sums `s_k = tr(Aᵏ)` turned into coefficients
/// by Newton's identities,
/// `c_k = −(s_k + c₁·s_{k−1} + … + c_{k−1}·s₁) / k`.
pub fn char_poly_leverrier<T: FloatScalar>(
    a: &Matrix<T>,
    ctx: &Context<T>,
) -> Result<CharPoly<T>, LinalgError> {
    let n = check_square(a)?;

    let mut sums = Vec::with_capacity(n);
    let mut power = a.clone();
    sums.push(power.trace());
    for _ in 1..n {
        power = &power * a;
        sums.push(power.trace());
        ctx.count((2 * n * n * n) as u64);
    }
    ctx.count((n * n) as u64);

    let mut coefficients = vec![T::one()];
    for k in 1..=n {
        let acc = (1..k).fold(sums[k - 1], |acc, i| acc + coefficients[i] * sums[k - i - 1]);
        coefficients.push(-acc / T::from_count(k));
        ctx.count(2 * k as u64);
    }
    if ctx.debug_level() >= 1 {
        debug!(degree = n, ops = ctx.ops(), "leverrier");
    }
    Ok(CharPoly {
        coefficients,
        det: None,
        inverse: None,
    })
}

/// Leverrier-Faddeev method.
///
/// ```text
/// A₁ = A,        q₁ = tr(A₁),      B₁ = A₁ − q₁·I
/// A_k = A·B_{k−1}, q_k = tr(A_k)/k, B_k = A_k − q_k·I
/// ```
///
/// gives `det(λI − A) = λⁿ − q₁λⁿ⁻¹ − … − qₙ`, `det(A) = (−1)ⁿ⁻¹·qₙ` and
/// `A⁻¹ = B_{n−1} / qₙ` (with `B₀ = I`).
///
/// ```
/// use densolve::{Context, Matrix};
/// use densolve::linalg::char_poly_faddeev;
///
/// let ctx = Context::<f64>::default();
/// let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
/// let p = char_poly_faddeev(&a, &ctx).unwrap();
/// assert_eq!(p.coefficients, vec![1.0, -5.0, 5.0]);
/// assert_eq!(p.det, Some(5.0));
/// let inv = p.inverse.unwrap();
/// assert!((inv[(0, 0)] - 0.6).abs() < 1e-12);
/// ```
pub fn char_poly_faddeev<T: FloatScalar>(
    a: &Matrix<T>,
    ctx: &Context<T>,
) -> Result<CharPoly<T>, LinalgError> {
    let n = check_square(a)?;

    let mut coefficients = vec![T::one()];
    let mut prev_b = Matrix::eye(n);
    let mut b = Matrix::eye(n);
    let mut q = T::zero();
    for k in 1..=n {
        let ak = if k == 1 { a.clone() } else { a * &b };
        q = ak.trace() / T::from_count(k);
        prev_b = b;
        b = ak;
        for i in 0..n {
            b[(i, i)] = b[(i, i)] - q;
        }
        coefficients.push(-q);
        ctx.count(if k == 1 { 0 } else { (2 * n * n * n) as u64 } + (2 * n) as u64);
    }
    ctx.trace_matrix("faddeev B_n", &b);

    let det = if n % 2 == 1 { q } else { -q };
    let inverse = (q != T::zero()).then(|| prev_b.scale(T::one() / q));
    ctx.count((n * n + 1) as u64);
    if ctx.debug_level() >= 1 {
        debug!(degree = n, %det, ops = ctx.ops(), "leverrier-faddeev");
    }
    Ok(CharPoly {
        coefficients,
        det: Some(det),
        inverse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {}", msg, a, b);
    }

    fn m3() -> Matrix<f64> {
        Matrix::from_rows(3, 3, &[2.0, -1.0, 0.0, 1.0, 3.0, 1.0, 0.0, 2.0, 1.0])
    }

    #[test]
    fn leverrier_2x2() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let p = char_poly_leverrier(&a, &ctx).unwrap();
        assert_eq!(p.coefficients, vec![1.0, -5.0, 5.0]);
        assert!(p.det.is_none());
        assert_eq!(p.degree(), 2);
    }

    #[test]
    fn methods_agree() {
        let ctx = Context::<f64>::default();
        let l = char_poly_leverrier(&m3(), &ctx).unwrap();
        let f = char_poly_faddeev(&m3(), &ctx).unwrap();
        for (x, y) in l.coefficients.iter().zip(&f.coefficients) {
            assert_near(*x, *y, 1e-10, "coefficient");
        }
    }

    #[test]
    fn faddeev_det_and_inverse() {
        let ctx = Context::<f64>::default();
        let a = m3();
        let p = char_poly_faddeev(&a, &ctx).unwrap();
        // 2(3 - 2) + 1(1 - 0) = 3
        assert_near(p.det.unwrap(), 3.0, 1e-12, "det");
        let id = &a * p.inverse.as_ref().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_near(id[(i, j)], expected, 1e-12, "A * A^-1");
            }
        }
        // det(0·I − A) = (−1)ⁿ det(A)
        assert_near(p.eval(0.0), -3.0, 1e-12, "p(0)");
    }

    #[test]
    fn singular_has_no_inverse() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        let p = char_poly_faddeev(&a, &ctx).unwrap();
        assert_eq!(p.det, Some(0.0));
        assert!(p.inverse.is_none());
    }

    #[test]
    fn one_by_one() {
        let ctx = Context::<f64>::default();
        let a = Matrix::from_rows(1, 1, &[4.0]);
        let p = char_poly_faddeev(&a, &ctx).unwrap();
        assert_eq!(p.coefficients, vec![1.0, -4.0]);
        assert_eq!(p.det, Some(4.0));
        assert_eq!(p.inverse.unwrap()[(0, 0)], 0.25);
    }
}
