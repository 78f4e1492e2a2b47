//! Error types for curve operations.

use curvekit_math::MathError;
use thiserror::Error;

/// A specialized Result type for curve operations.
pub type CurveResult<T> = Result<T, CurveError>;

/// Error types for curve operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// Curve not found in the curve set.
    #[error("Curve not found: {name}")]
    CurveNotFound {
        /// Name of the missing curve.
        name: String,
    },

    /// No curve is registered for a currency, index or issuer.
    #[error("No curve registered for {role}")]
    NoCurveForRole {
        /// Description of the role, e.g. `discounting USD`.
        role: String,
    },

    /// Curve parameters or generator settings are inconsistent.
    #[error("Invalid parameters: {reason}")]
    InvalidParameters {
        /// Description of the inconsistency.
        reason: String,
    },

    /// Invalid calibration instrument.
    #[error("Invalid instrument: {reason}")]
    InvalidInstrument {
        /// Description of what's wrong with the instrument.
        reason: String,
    },

    /// Invalid value (NaN, Inf, or domain error).
    #[error("Invalid value: {reason}")]
    InvalidValue {
        /// Description of why value is invalid.
        reason: String,
    },

    /// Error raised by the numerical layer.
    #[error("Math error: {0}")]
    Math(#[from] MathError),
}

impl CurveError {
    /// Creates a curve not found error.
    #[must_use]
    pub fn curve_not_found(name: impl Into<String>) -> Self {
        Self::CurveNotFound { name: name.into() }
    }

    /// Creates a missing role error.
    #[must_use]
    pub fn no_curve_for_role(role: impl Into<String>) -> Self {
        Self::NoCurveForRole { role: role.into() }
    }

    /// Creates an invalid parameters error.
    #[must_use]
    pub fn invalid_parameters(reason: impl Into<String>) -> Self {
        Self::InvalidParameters {
            reason: reason.into(),
        }
    }

    /// Creates an invalid instrument error.
    #[must_use]
    pub fn invalid_instrument(reason: impl Into<String>) -> Self {
        Self::InvalidInstrument {
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    #[must_use]
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }
}
