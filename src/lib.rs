//! # densolve
//!
//! Dense linear-system solvers and eigenvalue methods over row-major
//! heap-allocated matrices, generic over `f32` / `f64`.
//!
//! ## Quick start
//!
//! ```
//! use densolve::{Context, Matrix};
//! use densolve::linalg::{solve_gauss, solve_lu_refined};
//!
//! // [A | b] with A = [[2, 1], [1, 3]], b = [3, 5]
//! let system = Matrix::from_rows(2, 3, &[2.0_f64, 1.0, 3.0, 1.0, 3.0, 5.0]);
//! let ctx = Context::default();
//!
//! let sol = solve_gauss(&system, true, &ctx).unwrap();
//! assert!((sol.x[0] - 0.8).abs() < 1e-12);
//! assert!((sol.det.unwrap() - 5.0).abs() < 1e-12);
//!
//! let refined = solve_lu_refined(&system, false, &ctx).unwrap().into_result().unwrap();
//! assert!((refined.x[1] - 1.4).abs() < 1e-12);
//! assert!(ctx.ops() > 0);
//! ```
//!
//! ## Modules
//!
//! - [`matrix`] — `Matrix<T>` (row-major `Vec<T>` storage, runtime shape),
//!   `Vector<T>` and the borrowed [`MatrixView`](matrix::MatrixView).
//!   Arithmetic, transpose, norms, trace, integer powers, symmetry and
//!   diagonal-dominance checks, and helpers for augmented systems.
//!
//! - [`linalg`] — Direct solvers (Gaussian elimination, Gauss-Jordan,
//!   LU with iterative refinement, Cholesky), Jacobi and Gauss-Seidel
//!   iteration, the power method, cyclic Jacobi and Rutishauser LR
//!   eigenvalue methods, characteristic polynomials, SVD and SVD
//!   compression. Errors are reported as [`linalg::LinalgError`].
//!
//! - [`context`] — [`Settings`] (tolerance, iteration cap, preconditioner,
//!   debug level) and the floating-point operation counter, bundled in a
//!   [`Context`] passed to every algorithm.
//!
//! - [`io`] — Reader and writer for the text matrix format.
//!
//! - [`traits`] — Element trait hierarchy:
//!   - [`Scalar`] — all matrix elements (`Copy + PartialEq + Debug + Zero + One + Num`)
//!   - [`FloatScalar`] — real floats, used by every algorithm
//!   - [`MatrixRef`] / [`MatrixMut`] — generic read/write access
//!
//! ## Logging
//!
//! Algorithms emit [`tracing`] events: `debug` per iteration when the
//! context's debug level is at least 1, `trace` matrix dumps at level 2,
//! and `warn` on divergence, iteration limits and rejected settings. No
//! subscriber is installed by the library.

pub mod context;
pub mod io;
pub mod linalg;
pub mod matrix;
pub mod traits;

pub use context::{Context, Preconditioner, Settings};
pub use linalg::{Convergence, LinalgError, Solution};
pub use matrix::{Matrix, Vector};
pub use traits::{FloatScalar, MatrixMut, MatrixRef, Scalar};
