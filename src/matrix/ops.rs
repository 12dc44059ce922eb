use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::traits::Scalar;

use super::vector::Vector;
use super::Matrix;

// ── Element-wise addition / subtraction ─────────────────────────────

impl<T: Scalar> Matrix<T> {
    fn zip_with(&self, rhs: &Self, op: &str, f: impl Fn(T, T) -> T) -> Self {
        assert_eq!(
            (self.nrows, self.ncols),
            (rhs.nrows, rhs.ncols),
            "dimension mismatch: {}x{} {} {}x{}",
            self.nrows,
            self.ncols,
            op,
            rhs.nrows,
            rhs.ncols,
        );
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Matrix {
            data,
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl<T: Scalar> Add<&Matrix<T>> for &Matrix<T> {
    type Output = Matrix<T>;
    fn add(self, rhs: &Matrix<T>) -> Matrix<T> {
        self.zip_with(rhs, "+", |a, b| a + b)
    }
}

impl<T: Scalar> Sub<&Matrix<T>> for &Matrix<T> {
    type Output = Matrix<T>;
    fn sub(self, rhs: &Matrix<T>) -> Matrix<T> {
        self.zip_with(rhs, "-", |a, b| a - b)
    }
}

// Owned / mixed forms forward to the reference implementation.
macro_rules! forward_binop {
    ($trait:ident, $method:ident) => {
        impl<T: Scalar> $trait for Matrix<T> {
            type Output = Matrix<T>;
            fn $method(self, rhs: Matrix<T>) -> Matrix<T> {
                (&self).$method(&rhs)
            }
        }

        impl<T: Scalar> $trait<&Matrix<T>> for Matrix<T> {
            type Output = Matrix<T>;
            fn $method(self, rhs: &Matrix<T>) -> Matrix<T> {
                (&self).$method(rhs)
            }
        }

        impl<T: Scalar> $trait<Matrix<T>> for &Matrix<T> {
            type Output = Matrix<T>;
            fn $method(self, rhs: Matrix<T>) -> Matrix<T> {
                self.$method(&rhs)
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);

impl<T: Scalar> AddAssign<&Matrix<T>> for Matrix<T> {
    fn add_assign(&mut self, rhs: &Matrix<T>) {
        assert_eq!(
            (self.nrows, self.ncols),
            (rhs.nrows, rhs.ncols),
            "dimension mismatch",
        );
        for (a, &b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a = *a + b;
        }
    }
}

impl<T: Scalar> SubAssign<&Matrix<T>> for Matrix<T> {
    fn sub_assign(&mut self, rhs: &Matrix<T>) {
        assert_eq!(
            (self.nrows, self.ncols),
            (rhs.nrows, rhs.ncols),
            "dimension mismatch",
        );
        for (a, &b) in self.data.iter_mut().zip(rhs.data.iter()) {
            *a = *a - b;
        }
    }
}

// ── Negation ────────────────────────────────────────────────────────

impl<T: Scalar> Neg for &Matrix<T> {
    type Output = Matrix<T>;

    fn neg(self) -> Matrix<T> {
        self.scale(T::zero() - T::one())
    }
}

// ── Matrix multiplication: (M×N) * (N×P) → (M×P) ──────────────────

impl<T: Scalar> Mul<&Matrix<T>> for &Matrix<T> {
    type Output = Matrix<T>;

    fn mul(self, rhs: &Matrix<T>) -> Matrix<T> {
        assert_eq!(
            self.ncols, rhs.nrows,
            "dimension mismatch: {}x{} * {}x{}",
            self.nrows, self.ncols, rhs.nrows, rhs.ncols,
        );
        let m = self.nrows;
        let n = self.ncols;
        let p = rhs.ncols;
        let mut data = vec![T::zero(); m * p];
        for i in 0..m {
            for k in 0..n {
                let a_ik = self.data[i * n + k];
                for j in 0..p {
                    data[i * p + j] = data[i * p + j] + a_ik * rhs.data[k * p + j];
                }
            }
        }
        Matrix {
            data,
            nrows: m,
            ncols: p,
        }
    }
}

// ── Scalar multiplication ───────────────────────────────────────────

impl<T: Scalar> Mul<T> for &Matrix<T> {
    type Output = Matrix<T>;

    fn mul(self, rhs: T) -> Matrix<T> {
        self.scale(rhs)
    }
}

impl<T: Scalar> MulAssign<T> for Matrix<T> {
    fn mul_assign(&mut self, rhs: T) {
        for x in self.data.iter_mut() {
            *x = *x * rhs;
        }
    }
}

impl<T: Scalar> Matrix<T> {
    /// Multiply every element by `value`.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let m = Matrix::from_rows(1, 2, &[1.0, -2.0]).scale(3.0);
    /// assert_eq!(m.as_slice(), &[3.0, -6.0]);
    /// ```
    pub fn scale(&self, value: T) -> Self {
        Matrix {
            data: self.data.iter().map(|&x| x * value).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }

    /// Matrix-vector product `A * x`.
    ///
    /// Panics if `x.len() != self.ncols()`.
    ///
    /// ```
    /// use densolve::{Matrix, Vector};
    /// let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
    /// let y = a.mul_vec(&Vector::from_slice(&[1.0, 1.0]));
    /// assert_eq!(y.as_slice(), &[3.0, 4.0]);
    /// ```
    pub fn mul_vec(&self, x: &Vector<T>) -> Vector<T> {
        assert_eq!(
            self.ncols,
            x.len(),
            "dimension mismatch: {}x{} * {}",
            self.nrows,
            self.ncols,
            x.len(),
        );
        if self.ncols == 0 {
            return Vector::zeros(self.nrows);
        }
        let data = self
            .data
            .chunks_exact(self.ncols)
            .map(|row| {
                row.iter()
                    .zip(x.iter())
                    .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
            })
            .collect();
        Vector::from_vec(data)
    }

    /// Transpose.
    ///
    /// ```
    /// use densolve::Matrix;
    /// let m = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let t = m.transpose();
    /// assert_eq!(t.nrows(), 3);
    /// assert_eq!(t[(2, 1)], 6.0);
    /// ```
    pub fn transpose(&self) -> Self {
        Matrix::from_fn(self.ncols, self.nrows, |i, j| self[(j, i)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub() {
        let a = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let b = Matrix::from_rows(2, 2, &[4.0, 3.0, 2.0, 1.0]);
        assert_eq!((&a + &b).as_slice(), &[5.0; 4]);
        assert_eq!((a.clone() - b).as_slice(), &[-3.0, -1.0, 1.0, 3.0]);
        let mut c = a.clone();
        c += &a;
        c -= &a;
        assert_eq!(c, a);
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn add_mismatch_panics() {
        let a = Matrix::<f64>::zeros(2, 2);
        let b = Matrix::<f64>::zeros(2, 3);
        let _ = &a + &b;
    }

    #[test]
    fn matmul() {
        let a = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let b = Matrix::from_rows(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
        let c = &a * &b;
        assert_eq!(c.as_slice(), &[58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn scalar_ops() {
        let a = Matrix::from_rows(1, 3, &[1.0, -2.0, 0.5]);
        assert_eq!((&a * 2.0).as_slice(), &[2.0, -4.0, 1.0]);
        assert_eq!((-&a).as_slice(), &[-1.0, 2.0, -0.5]);
        let mut b = a.clone();
        b *= 4.0;
        assert_eq!(b.as_slice(), &[4.0, -8.0, 2.0]);
    }

    #[test]
    fn mul_vec_and_transpose() {
        let a = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let y = a.mul_vec(&Vector::from_slice(&[1.0, 0.0, -1.0]));
        assert_eq!(y.as_slice(), &[-2.0, -2.0]);
        assert_eq!(a.transpose().transpose(), a);
    }

    #[test]
    fn mul_vec_zero_columns() {
        let a = Matrix::<f64>::zeros(2, 0);
        let y = a.mul_vec(&Vector::zeros(0));
        assert_eq!(y.as_slice(), &[0.0, 0.0]);
    }
}
