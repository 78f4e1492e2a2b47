//! Error types for mathematical operations.

use thiserror::Error;

/// A specialized Result type for mathematical operations.
pub type MathResult<T> = Result<T, MathError>;

/// Errors that can occur during mathematical operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    /// Root-finding algorithm failed to converge.
    #[error("Convergence failed after {iterations} iterations (residual: {residual:.2e})")]
    ConvergenceFailed {
        /// Number of iterations attempted.
        iterations: u32,
        /// Final residual norm.
        residual: f64,
    },

    /// Backtracking could not reduce the residual, even after a fresh Jacobian.
    #[error("Line search failed at iteration {iterations} (residual: {residual:.2e})")]
    LineSearchFailed {
        /// Iteration at which the search gave up.
        iterations: u32,
        /// Residual norm at the last accepted point.
        residual: f64,
    },

    /// Matrix is singular (not invertible).
    #[error("Singular matrix: cannot invert")]
    SingularMatrix,

    /// Matrix dimensions are incompatible.
    #[error("Incompatible matrix dimensions: ({rows1}x{cols1}) and ({rows2}x{cols2})")]
    DimensionMismatch {
        /// Rows in first matrix.
        rows1: usize,
        /// Columns in first matrix.
        cols1: usize,
        /// Rows in second matrix.
        rows2: usize,
        /// Columns in second matrix.
        cols2: usize,
    },

    /// Interpolation point is outside the valid range.
    #[error("Extrapolation not allowed: {x} is outside [{min}, {max}]")]
    ExtrapolationNotAllowed {
        /// The query point.
        x: f64,
        /// Minimum valid value.
        min: f64,
        /// Maximum valid value.
        max: f64,
    },

    /// Insufficient data points for operation.
    #[error("Insufficient data: need at least {required}, got {actual}")]
    InsufficientData {
        /// Minimum required points.
        required: usize,
        /// Actual number of points.
        actual: usize,
    },

    /// Invalid input parameter.
    #[error("Invalid input: {reason}")]
    InvalidInput {
        /// Description of the invalid input.
        reason: String,
    },
}

impl MathError {
    /// Creates a convergence failed error.
    #[must_use]
    pub fn convergence_failed(iterations: u32, residual: f64) -> Self {
        Self::ConvergenceFailed {
            iterations,
            residual,
        }
    }

    /// Creates a line search failure.
    #[must_use]
    pub fn line_search_failed(iterations: u32, residual: f64) -> Self {
        Self::LineSearchFailed {
            iterations,
            residual,
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }

    /// Creates an insufficient data error.
    #[must_use]
    pub fn insufficient_data(required: usize, actual: usize) -> Self {
        Self::InsufficientData { required, actual }
    }

    /// Creates a dimension mismatch error from two `(rows, cols)` shapes.
    #[must_use]
    pub fn dimension_mismatch(first: (usize, usize), second: (usize, usize)) -> Self {
        Self::DimensionMismatch {
            rows1: first.0,
            cols1: first.1,
            rows2: second.0,
            cols2: second.1,
        }
    }

    /// Returns true if this error reports an exhausted iteration budget.
    #[must_use]
    pub fn is_convergence_failure(&self) -> bool {
        matches!(self, Self::ConvergenceFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MathError::convergence_failed(100, 1e-6);
        assert!(err.to_string().contains("100 iterations"));
        assert!(err.is_convergence_failure());
    }

    #[test]
    fn test_dimension_mismatch_display() {
        let err = MathError::dimension_mismatch((2, 3), (4, 5));
        assert_eq!(
            err.to_string(),
            "Incompatible matrix dimensions: (2x3) and (4x5)"
        );
        assert!(!err.is_convergence_failure());
    }
}
