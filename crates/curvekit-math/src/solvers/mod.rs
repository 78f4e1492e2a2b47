//! Multi-dimensional root finding.
//!
//! Solvers for square nonlinear systems `F(x) = 0` with an analytic Jacobian:
//!
//! - [`NewtonVectorRootFinder`]: recomputes the Jacobian at every step
//! - [`BroydenVectorRootFinder`]: computes the Jacobian once and applies
//!   rank-one Broyden updates, falling back to a fresh Jacobian when the line
//!   search stalls
//!
//! Both share the same damped iteration. The linear step `J·dx = -F` is solved
//! through a singular value decomposition and then shortened by backtracking
//! until `½|F|²` decreases sufficiently. Convergence requires both
//! `|dx| < abs + rel·|x|` and `|F| < abs`.
//!
//! # Example
//!
//! ```rust
//! use curvekit_math::solvers::{NewtonVectorRootFinder, VectorRootFinder};
//! use curvekit_math::MathResult;
//! use nalgebra::{DMatrix, DVector};
//!
//! // x² = 2, y = x
//! let f = |v: &DVector<f64>| -> MathResult<DVector<f64>> {
//!     Ok(DVector::from_vec(vec![v[0] * v[0] - 2.0, v[1] - v[0]]))
//! };
//! let j = |v: &DVector<f64>| -> MathResult<DMatrix<f64>> {
//!     Ok(DMatrix::from_row_slice(2, 2, &[2.0 * v[0], 0.0, -1.0, 1.0]))
//! };
//!
//! let result = NewtonVectorRootFinder::default()
//!     .find_root(&f, &j, &DVector::from_vec(vec![1.0, 1.0]))
//!     .unwrap();
//! assert!((result.root[1] - std::f64::consts::SQRT_2).abs() < 1e-9);
//! ```

mod broyden;
mod newton;

pub use broyden::BroydenVectorRootFinder;
pub use newton::NewtonVectorRootFinder;

use crate::error::{MathError, MathResult};
use crate::linear_algebra::solve_linear_system;
use nalgebra::{DMatrix, DVector};

/// Default absolute tolerance for vector root finders.
pub const DEFAULT_ABSOLUTE_TOLERANCE: f64 = 1e-9;

/// Default relative tolerance for vector root finders.
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 1e-9;

/// Default maximum iterations for vector root finders.
pub const DEFAULT_MAX_ITERATIONS: u32 = 100;

/// Sufficient-decrease constant of the backtracking line search.
const ARMIJO_CONSTANT: f64 = 1e-4;

/// Smallest step fraction tried before the line search gives up.
const MIN_STEP_FRACTION: f64 = 1e-8;

/// Residual function of a vector root finder.
pub type VectorFunction<'a> = dyn Fn(&DVector<f64>) -> MathResult<DVector<f64>> + 'a;

/// Jacobian function of a vector root finder.
pub type JacobianFunction<'a> = dyn Fn(&DVector<f64>) -> MathResult<DMatrix<f64>> + 'a;

/// Configuration for vector root finders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VectorRootFinderConfig {
    /// Absolute tolerance on both the step and the residual norm.
    pub absolute_tolerance: f64,
    /// Relative tolerance on the step, scaled by the norm of `x`.
    pub relative_tolerance: f64,
    /// Maximum number of iterations.
    pub max_iterations: u32,
}

impl Default for VectorRootFinderConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: DEFAULT_ABSOLUTE_TOLERANCE,
            relative_tolerance: DEFAULT_RELATIVE_TOLERANCE,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }
}

impl VectorRootFinderConfig {
    /// Creates a new configuration.
    #[must_use]
    pub fn new(absolute_tolerance: f64, relative_tolerance: f64, max_iterations: u32) -> Self {
        Self {
            absolute_tolerance,
            relative_tolerance,
            max_iterations,
        }
    }

    /// Sets the absolute tolerance.
    #[must_use]
    pub fn with_absolute_tolerance(mut self, tolerance: f64) -> Self {
        self.absolute_tolerance = tolerance;
        self
    }

    /// Sets the relative tolerance.
    #[must_use]
    pub fn with_relative_tolerance(mut self, tolerance: f64) -> Self {
        self.relative_tolerance = tolerance;
        self
    }

    /// Sets the maximum iterations.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }
}

/// Result of a vector root search.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorRootResult {
    /// The root found.
    pub root: DVector<f64>,
    /// Number of accepted steps.
    pub iterations: u32,
    /// Euclidean norm of `F` at the root.
    pub residual_norm: f64,
    /// Number of analytic Jacobian evaluations.
    pub jacobian_evaluations: u32,
}

/// Trait for solvers of square nonlinear systems.
///
/// The functions are passed as trait objects so implementations can be
/// selected at runtime and stored behind `Box<dyn VectorRootFinder>`.
pub trait VectorRootFinder: Send + Sync {
    /// Finds `x` with `f(x) = 0`, starting from `x0`.
    ///
    /// # Errors
    ///
    /// - [`MathError::InvalidInput`] if `f(x0)` or `jacobian(x0)` do not match
    ///   the dimension of `x0`, or produce non-finite values
    /// - [`MathError::ConvergenceFailed`] if the iteration cap is reached
    /// - [`MathError::LineSearchFailed`] if no step reduces the residual
    /// - any error returned by `f` or `jacobian`
    fn find_root(
        &self,
        f: &VectorFunction<'_>,
        jacobian: &JacobianFunction<'_>,
        x0: &DVector<f64>,
    ) -> MathResult<VectorRootResult>;

    /// Returns the name of the solver.
    fn name(&self) -> &'static str;

    /// Returns the solver configuration.
    fn config(&self) -> &VectorRootFinderConfig;
}

/// How the Jacobian is refreshed after an accepted step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum JacobianUpdate {
    /// Evaluate the analytic Jacobian at the new point.
    Full,
    /// Apply a rank-one secant update.
    Broyden,
}

fn checked_value(
    f: &VectorFunction<'_>,
    x: &DVector<f64>,
) -> MathResult<DVector<f64>> {
    let fx = f(x)?;
    if fx.len() != x.len() {
        return Err(MathError::invalid_input(format!(
            "residual function returned {} values for {} unknowns",
            fx.len(),
            x.len()
        )));
    }
    Ok(fx)
}

fn checked_jacobian(
    jacobian: &JacobianFunction<'_>,
    x: &DVector<f64>,
) -> MathResult<DMatrix<f64>> {
    let n = x.len();
    let jac = jacobian(x)?;
    if jac.shape() != (n, n) {
        return Err(MathError::dimension_mismatch(jac.shape(), (n, n)));
    }
    if jac.iter().any(|v| !v.is_finite()) {
        return Err(MathError::invalid_input("Jacobian contains non-finite entries"));
    }
    Ok(jac)
}

/// Damped quasi-Newton iteration shared by the vector root finders.
pub(crate) fn iterate(
    config: &VectorRootFinderConfig,
    update: JacobianUpdate,
    f: &VectorFunction<'_>,
    jacobian: &JacobianFunction<'_>,
    x0: &DVector<f64>,
) -> MathResult<VectorRootResult> {
    if x0.is_empty() {
        return Err(MathError::invalid_input("initial guess must not be empty"));
    }
    if x0.iter().any(|v| !v.is_finite()) {
        return Err(MathError::invalid_input("initial guess must be finite"));
    }

    let mut x = x0.clone();
    let mut fx = checked_value(f, &x)?;
    if fx.iter().any(|v| !v.is_finite()) {
        return Err(MathError::invalid_input(
            "residual function is not finite at the initial guess",
        ));
    }
    let mut jac = checked_jacobian(jacobian, &x)?;
    let mut jacobian_evaluations = 1;
    let mut fresh = true;
    let mut norm = fx.norm();

    let mut iterations = 0;
    while iterations < config.max_iterations {
        let direction = solve_linear_system(&jac, &(-&fx))?;

        let Some((x_new, f_new)) = line_search(f, &x, &fx, &direction, config.absolute_tolerance)?
        else {
            if fresh {
                return Err(MathError::line_search_failed(iterations, norm));
            }
            log::debug!("line search stalled at iteration {iterations}, recomputing Jacobian");
            jac = checked_jacobian(jacobian, &x)?;
            jacobian_evaluations += 1;
            fresh = true;
            continue;
        };

        iterations += 1;
        let step = &x_new - &x;
        let step_norm = step.norm();

        match update {
            JacobianUpdate::Full => {
                jac = checked_jacobian(jacobian, &x_new)?;
                jacobian_evaluations += 1;
                fresh = true;
            }
            JacobianUpdate::Broyden => {
                let denominator = step.dot(&step);
                if denominator > 0.0 {
                    let correction = (&f_new - &fx - &jac * &step) / denominator;
                    jac += correction * step.transpose();
                }
                fresh = false;
            }
        }

        x = x_new;
        fx = f_new;
        norm = fx.norm();
        log::trace!("iteration {iterations}: |F| = {norm:.3e}, |dx| = {step_norm:.3e}");

        if step_norm < config.absolute_tolerance + config.relative_tolerance * x.norm()
            && norm < config.absolute_tolerance
        {
            log::debug!(
                "converged after {iterations} iterations (|F| = {norm:.3e}, {jacobian_evaluations} Jacobians)"
            );
            return Ok(VectorRootResult {
                root: x,
                iterations,
                residual_norm: norm,
                jacobian_evaluations,
            });
        }
    }

    Err(MathError::convergence_failed(config.max_iterations, norm))
}

/// Backtracks along `direction` until `½|F|²` decreases sufficiently.
///
/// Returns `None` when the step fraction falls below [`MIN_STEP_FRACTION`].
/// A trial point whose residual norm is already below `absolute_tolerance` is
/// always accepted, since rounding noise can defeat the decrease test there.
fn line_search(
    f: &VectorFunction<'_>,
    x: &DVector<f64>,
    fx: &DVector<f64>,
    direction: &DVector<f64>,
    absolute_tolerance: f64,
) -> MathResult<Option<(DVector<f64>, DVector<f64>)>> {
    let g0 = fx.norm_squared();
    let mut lambda = 1.0;

    while lambda >= MIN_STEP_FRACTION {
        let trial = x + direction * lambda;
        let f_trial = checked_value(f, &trial)?;
        if f_trial.iter().all(|v| v.is_finite()) {
            let g = f_trial.norm_squared();
            if g <= (1.0 - 2.0 * ARMIJO_CONSTANT * lambda) * g0
                || g.sqrt() < absolute_tolerance
            {
                return Ok(Some((trial, f_trial)));
            }
        }
        lambda *= 0.5;
    }

    Ok(None)
}
