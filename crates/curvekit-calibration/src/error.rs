//! Error types for curve calibration.

use curvekit_curves::CurveError;
use curvekit_math::MathError;
use thiserror::Error;

/// A specialized Result type for calibration.
pub type CalibrationResult<T> = Result<T, CalibrationError>;

/// Errors raised while calibrating curves.
///
/// Every variant aborts the whole calibration run; no partial curve set or
/// block bundle is returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    /// The request is malformed: counts that must agree do not, a stage is
    /// empty, a name is reused, or a sensitivity block cannot be inverted.
    #[error("Configuration error: {reason}")]
    Configuration {
        /// Description of the problem.
        reason: String,
    },

    /// The root finder hit its iteration cap.
    #[error("Stage {stage} did not converge after {iterations} iterations (residual: {residual:.2e})")]
    ConvergenceFailure {
        /// Zero-based index of the failing stage.
        stage: usize,
        /// Number of iterations attempted.
        iterations: u32,
        /// Residual norm at the last iterate.
        residual: f64,
    },

    /// Curve construction or instrument pricing failed.
    #[error("Curve error: {0}")]
    Curve(#[from] CurveError),

    /// Numerical failure other than non-convergence.
    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

impl CalibrationError {
    /// Creates a configuration error.
    #[must_use]
    pub fn configuration(reason: impl Into<String>) -> Self {
        Self::Configuration {
            reason: reason.into(),
        }
    }

    /// Creates a convergence failure.
    #[must_use]
    pub fn convergence_failure(stage: usize, iterations: u32, residual: f64) -> Self {
        Self::ConvergenceFailure {
            stage,
            iterations,
            residual,
        }
    }

    /// Returns true for configuration errors.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration { .. })
    }

    /// Returns true for convergence failures.
    #[must_use]
    pub fn is_convergence_failure(&self) -> bool {
        matches!(self, Self::ConvergenceFailure { .. })
    }
}
