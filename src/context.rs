//! Run configuration and operation accounting.
//!
//! Every solver takes a [`Context`], which bundles the numerical
//! [`Settings`] (tolerance, iteration cap, preconditioner, debug level) with
//! a floating-point operation counter. A context is owned by one caller and
//! is never shared between threads, so runs are deterministic and tests can
//! execute in parallel with independent counters.
//!
//! ```
//! use densolve::{Context, Settings, Preconditioner};
//!
//! let ctx = Context::new(
//!     Settings::<f64>::default()
//!         .with_tolerance(1e-10)
//!         .with_max_iter(500)
//!         .with_preconditioner(Preconditioner::Jacobi),
//! );
//! assert_eq!(ctx.settings().max_iter, 500);
//! assert_eq!(ctx.ops(), 0);
//! ```

use core::cell::Cell;
use core::fmt;

use tracing::{trace, warn};

use crate::matrix::Matrix;
use crate::traits::FloatScalar;

/// Row preconditioner applied before stationary iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preconditioner {
    /// Iterate on the system as given.
    #[default]
    None,
    /// Scale every row of `A` and `b` by `1 / A[i][i]`.
    Jacobi,
}

impl Preconditioner {
    /// Map the numeric selector used on the command line (`0` = none,
    /// `1` = Jacobi) to a preconditioner.
    ///
    /// ```
    /// use densolve::Preconditioner;
    /// assert_eq!(Preconditioner::from_selector(1), Some(Preconditioner::Jacobi));
    /// assert_eq!(Preconditioner::from_selector(7), None);
    /// ```
    pub fn from_selector(selector: u32) -> Option<Self> {
        match selector {
            0 => Some(Preconditioner::None),
            1 => Some(Preconditioner::Jacobi),
            _ => None,
        }
    }
}

impl fmt::Display for Preconditioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preconditioner::None => write!(f, "none"),
            Preconditioner::Jacobi => write!(f, "jacobi"),
        }
    }
}

/// Numerical settings shared by every solver in a run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings<T> {
    /// Absolute tolerance on residual / off-diagonal / relative-change norms.
    pub tolerance: T,
    /// Maximum number of iterations (or sweeps) of an iterative method.
    pub max_iter: usize,
    /// Preconditioner for Jacobi and Gauss-Seidel.
    pub preconditioner: Preconditioner,
    /// Trace verbosity: `1` logs per-iteration errors, `2` also dumps
    /// intermediate matrices, `3` logs individual factor entries.
    pub debug_level: u32,
}

impl Default for Settings<f64> {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            max_iter: 100,
            preconditioner: Preconditioner::None,
            debug_level: 0,
        }
    }
}

impl Default for Settings<f32> {
    fn default() -> Self {
        Self {
            tolerance: 1e-5,
            max_iter: 100,
            preconditioner: Preconditioner::None,
            debug_level: 0,
        }
    }
}

impl<T: FloatScalar> Settings<T> {
    /// Set the tolerance. Non-positive or non-finite values keep the
    /// current tolerance and log a warning.
    pub fn with_tolerance(mut self, tolerance: T) -> Self {
        if tolerance > T::zero() && tolerance.is_finite() {
            self.tolerance = tolerance;
        } else {
            warn!(?tolerance, kept = ?self.tolerance, "invalid tolerance ignored");
        }
        self
    }

    /// Set the iteration cap. Zero keeps the current cap and logs a warning.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        if max_iter > 0 {
            self.max_iter = max_iter;
        } else {
            warn!(kept = self.max_iter, "iteration cap must be positive");
        }
        self
    }

    pub fn with_preconditioner(mut self, preconditioner: Preconditioner) -> Self {
        self.preconditioner = preconditioner;
        self
    }

    pub fn with_debug_level(mut self, debug_level: u32) -> Self {
        self.debug_level = debug_level;
        self
    }
}

/// Counter of floating-point operations performed during a run.
#[derive(Debug, Default)]
pub struct OpCounter {
    count: Cell<u64>,
}

impl OpCounter {
    #[inline]
    pub fn add(&self, n: u64) {
        self.count.set(self.count.get().saturating_add(n));
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.count.get()
    }

    #[inline]
    pub fn reset(&self) {
        self.count.set(0);
    }
}

/// Settings plus operation counter, passed to every operation.
#[derive(Debug)]
pub struct Context<T> {
    settings: Settings<T>,
    ops: OpCounter,
}

impl<T: FloatScalar> Context<T> {
    pub fn new(settings: Settings<T>) -> Self {
        Self {
            settings,
            ops: OpCounter::default(),
        }
    }

    #[inline]
    pub fn settings(&self) -> &Settings<T> {
        &self.settings
    }

    #[inline]
    pub fn tolerance(&self) -> T {
        self.settings.tolerance
    }

    #[inline]
    pub fn max_iter(&self) -> usize {
        self.settings.max_iter
    }

    #[inline]
    pub fn debug_level(&self) -> u32 {
        self.settings.debug_level
    }

    /// Operations counted since creation or the last [`reset_ops`](Self::reset_ops).
    #[inline]
    pub fn ops(&self) -> u64 {
        self.ops.get()
    }

    pub fn reset_ops(&self) {
        self.ops.reset();
    }

    #[inline]
    pub(crate) fn count(&self, n: u64) {
        self.ops.add(n);
    }

    /// Dump a matrix at trace level when the debug level asks for it.
    pub(crate) fn trace_matrix(&self, label: &str, m: &Matrix<T>) {
        if self.settings.debug_level >= 2 {
            trace!(target: "densolve::matrix", "{label} ({}x{}):\n{m}", m.nrows(), m.ncols());
        }
    }
}

impl Default for Context<f64> {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Default for Context<f32> {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}
