//! Curve parameterizations.
//!
//! Every curve is described by the continuously compounded zero rate it
//! contributes at time `t`. A [`SpreadCurve`] contributes a spread only; the
//! full rate is resolved against its base curve by the
//! [`CurveSet`](crate::multicurve::CurveSet) that holds both.

mod interpolated;
mod spread;

pub use interpolated::InterpolatedCurve;
pub use spread::SpreadCurve;

use serde::{Deserialize, Serialize};

use crate::error::CurveResult;

/// A calibrated curve.
///
/// The set of curve kinds is closed; operations dispatch with a `match`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Curve {
    /// Zero rates interpolated between node times.
    Interpolated(InterpolatedCurve),
    /// Interpolated spread added to the zero rate of a base curve.
    Spread(SpreadCurve),
}

impl Curve {
    /// Returns the curve name.
    pub fn name(&self) -> &str {
        match self {
            Self::Interpolated(c) => c.name(),
            Self::Spread(c) => c.name(),
        }
    }

    /// Number of parameters owned by this curve.
    ///
    /// Parameters of a spread curve's base are not counted.
    pub fn number_of_parameters(&self) -> usize {
        match self {
            Self::Interpolated(c) => c.number_of_parameters(),
            Self::Spread(c) => c.number_of_parameters(),
        }
    }

    /// Returns the curve's own parameters (node rates or node spreads).
    pub fn parameters(&self) -> &[f64] {
        match self {
            Self::Interpolated(c) => c.rates(),
            Self::Spread(c) => c.spreads(),
        }
    }

    /// Returns the node times of the curve's own parameters.
    pub fn node_times(&self) -> &[f64] {
        match self {
            Self::Interpolated(c) => c.times(),
            Self::Spread(c) => c.times(),
        }
    }

    /// Name of the curve this one is expressed against, if any.
    pub fn base_name(&self) -> Option<&str> {
        match self {
            Self::Interpolated(_) => None,
            Self::Spread(c) => Some(c.base()),
        }
    }

    /// The curve's own contribution to the zero rate at `t`.
    pub fn own_rate(&self, t: f64) -> CurveResult<f64> {
        match self {
            Self::Interpolated(c) => c.zero_rate(t),
            Self::Spread(c) => c.spread(t),
        }
    }

    /// ∂(own rate at `t`)/∂(own parameter k) for every parameter.
    pub fn own_weights(&self, t: f64) -> CurveResult<Vec<f64>> {
        match self {
            Self::Interpolated(c) => c.rate_weights(t),
            Self::Spread(c) => c.spread_weights(t),
        }
    }
}

impl From<InterpolatedCurve> for Curve {
    fn from(curve: InterpolatedCurve) -> Self {
        Self::Interpolated(curve)
    }
}

impl From<SpreadCurve> for Curve {
    fn from(curve: SpreadCurve) -> Self {
        Self::Spread(curve)
    }
}
