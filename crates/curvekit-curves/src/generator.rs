//! Curve generators.
//!
//! A generator describes how a raw parameter vector becomes a curve. It is
//! supplied per curve in a calibration stage; the root finder moves the
//! parameters and the generator rebuilds the curve at every trial point.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::curves::{Curve, InterpolatedCurve, SpreadCurve};
use crate::error::{CurveError, CurveResult};
use crate::instruments::Instrument;

/// Recipe for building a curve from its parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CurveGenerator {
    /// Zero rates on fixed node times.
    Interpolated {
        /// Node times in years.
        times: Vec<f64>,
    },
    /// Spread nodes over an already available base curve.
    Spread {
        /// Name of the base curve.
        base: String,
        /// Spread node times in years.
        times: Vec<f64>,
    },
    /// Zero rates on the maturities of the calibrating instruments.
    ///
    /// Must be turned into [`CurveGenerator::Interpolated`] with
    /// [`finalize`](CurveGenerator::finalize) before use.
    InterpolatedOnInstruments,
}

impl CurveGenerator {
    /// Creates an interpolated generator.
    #[must_use]
    pub fn interpolated(times: Vec<f64>) -> Self {
        Self::Interpolated { times }
    }

    /// Creates a spread generator.
    #[must_use]
    pub fn spread(base: impl Into<String>, times: Vec<f64>) -> Self {
        Self::Spread {
            base: base.into(),
            times,
        }
    }

    /// Fixes anything that depends on the calibrating instruments.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` if instrument maturities used as node
    /// times are not strictly increasing.
    pub fn finalize(&self, instruments: &[Instrument]) -> CurveResult<Self> {
        match self {
            Self::InterpolatedOnInstruments => {
                let times: Vec<f64> = instruments.iter().map(Instrument::maturity).collect();
                if times.windows(2).any(|w| w[1] <= w[0]) {
                    return Err(CurveError::invalid_parameters(
                        "instrument maturities must be strictly increasing to serve as nodes",
                    ));
                }
                Ok(Self::Interpolated { times })
            }
            other => Ok(other.clone()),
        }
    }

    /// Number of parameters the generated curve owns.
    pub fn parameter_count(&self) -> CurveResult<usize> {
        match self {
            Self::Interpolated { times } | Self::Spread { times, .. } => Ok(times.len()),
            Self::InterpolatedOnInstruments => Err(unfinalized()),
        }
    }

    /// Number of parameters needed when the curves in `known` are available.
    ///
    /// # Errors
    ///
    /// Returns `CurveNotFound` when a spread generator's base is not known:
    /// the base must be calibrated in an earlier stage, or earlier in the same
    /// stage.
    pub fn intrinsic_parameter_count(&self, known: &HashSet<String>) -> CurveResult<usize> {
        if let Self::Spread { base, .. } = self {
            if !known.contains(base) {
                return Err(CurveError::curve_not_found(base.clone()));
            }
        }
        self.parameter_count()
    }

    /// Name of the curve the generated curve depends on, if any.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Self::Spread { base, .. } => Some(base),
            _ => None,
        }
    }

    /// Builds the curve `name` from `parameters`.
    pub fn build(&self, name: &str, parameters: &[f64]) -> CurveResult<Curve> {
        let expected = self.parameter_count()?;
        if parameters.len() != expected {
            return Err(CurveError::invalid_parameters(format!(
                "curve {name} needs {expected} parameters, got {}",
                parameters.len()
            )));
        }
        match self {
            Self::Interpolated { times } => {
                Ok(InterpolatedCurve::new(name, times.clone(), parameters.to_vec())?.into())
            }
            Self::Spread { base, times } => {
                Ok(SpreadCurve::new(name, base.clone(), times.clone(), parameters.to_vec())?.into())
            }
            Self::InterpolatedOnInstruments => Err(unfinalized()),
        }
    }
}

fn unfinalized() -> CurveError {
    CurveError::invalid_parameters("generator must be finalized with its instruments")
}
