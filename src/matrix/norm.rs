use crate::traits::{max_abs, FloatScalar};

use super::vector::Vector;
use super::Matrix;

// ── Vector norms ────────────────────────────────────────────────────

impl<T: FloatScalar> Vector<T> {
    /// L2 (Euclidean) norm.
    ///
    /// ```
    /// use densolve::Vector;
    /// let v = Vector::from_slice(&[3.0_f64, 4.0]);
    /// assert!((v.norm() - 5.0).abs() < 1e-12);
    /// ```
    pub fn norm(&self) -> T {
        self.iter()
            .fold(T::zero(), |acc, &x| acc + x * x)
            .sqrt()
    }

    /// Infinity norm (largest magnitude).
    ///
    /// ```
    /// use densolve::Vector;
    /// let v = Vector::from_slice(&[1.0_f64, -7.0, 3.0]);
    /// assert_eq!(v.norm_inf(), 7.0);
    /// ```
    pub fn norm_inf(&self) -> T {
        max_abs(self.as_slice())
    }

    /// Index of the largest-magnitude component (first on ties).
    ///
    /// Returns `None` for an empty vector.
    pub fn argmax_abs(&self) -> Option<usize> {
        let mut best: Option<(usize, T)> = None;
        for (i, &x) in self.iter().enumerate() {
            match best {
                Some((_, m)) if x.abs() <= m => {}
                _ => best = Some((i, x.abs())),
            }
        }
        best.map(|(i, _)| i)
    }

    /// Unit vector in the same direction, or `None` for a zero vector.
    pub fn normalize(&self) -> Option<Self> {
        let n = self.norm();
        if n == T::zero() {
            return None;
        }
        Some(Vector::from_vec(self.iter().map(|&x| x / n).collect()))
    }
}

// ── Matrix norms ────────────────────────────────────────────────────

impl<T: FloatScalar> Matrix<T> {
    /// Element-wise infinity norm: the largest entry magnitude.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0_f64, -9.0, 3.0, 4.0]);
    /// assert_eq!(m.norm_inf(), 9.0);
    /// ```
    pub fn norm_inf(&self) -> T {
        max_abs(&self.data)
    }

    /// Square root of the sum of squared entries (Frobenius norm).
    ///
    /// ```
    /// use densolve::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0_f64, 2.0, 3.0, 4.0]);
    /// assert!((m.norm2() - 30.0_f64.sqrt()).abs() < 1e-12);
    /// ```
    pub fn norm2(&self) -> T {
        self.data
            .iter()
            .fold(T::zero(), |acc, &x| acc + x * x)
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_norms() {
        let v = Vector::from_slice(&[3.0_f64, -4.0]);
        assert!((v.norm() - 5.0).abs() < 1e-12);
        assert_eq!(v.norm_inf(), 4.0);
    }

    #[test]
    fn argmax_abs_first_on_ties() {
        let v = Vector::from_slice(&[1.0_f64, -3.0, 3.0]);
        assert_eq!(v.argmax_abs(), Some(1));
        assert_eq!(Vector::<f64>::zeros(0).argmax_abs(), None);
    }

    #[test]
    fn normalize() {
        let u = Vector::from_slice(&[3.0_f64, 4.0]).normalize().unwrap();
        assert!((u[0] - 0.6).abs() < 1e-12);
        assert!(Vector::<f64>::zeros(2).normalize().is_none());
    }

    #[test]
    fn matrix_norms() {
        let m = Matrix::from_rows(2, 2, &[1.0_f64, -2.0, 3.0, 4.0]);
        assert_eq!(m.norm_inf(), 4.0);
        assert!((m.norm2() - 30.0_f64.sqrt()).abs() < 1e-12);
    }
}
