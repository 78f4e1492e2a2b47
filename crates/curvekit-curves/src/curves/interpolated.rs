//! Zero-rate curves on interpolation nodes.

use curvekit_math::interpolation::{Interpolator, LinearInterpolator};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CurveError, CurveResult};

/// A curve of continuously compounded zero rates, linear between nodes and
/// flat beyond the first and last node.
///
/// The curve parameters are the node rates, in node order.
#[derive(Debug, Clone)]
pub struct InterpolatedCurve {
    name: String,
    interpolator: LinearInterpolator,
}

impl InterpolatedCurve {
    /// Creates a curve from node times and zero rates.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameters` if the times are not positive and strictly
    /// increasing, or if the lengths differ.
    pub fn new(name: impl Into<String>, times: Vec<f64>, rates: Vec<f64>) -> CurveResult<Self> {
        let name = name.into();
        if times.first().is_some_and(|&t| t <= 0.0) {
            return Err(CurveError::invalid_parameters(format!(
                "curve {name}: node times must be positive"
            )));
        }
        let interpolator = LinearInterpolator::new(times, rates)
            .map_err(|e| CurveError::invalid_parameters(format!("curve {name}: {e}")))?
            .with_flat_extrapolation();
        Ok(Self { name, interpolator })
    }

    /// Returns the curve name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the node times.
    pub fn times(&self) -> &[f64] {
        self.interpolator.xs()
    }

    /// Returns the node zero rates.
    pub fn rates(&self) -> &[f64] {
        self.interpolator.ys()
    }

    /// Number of node rates.
    pub fn number_of_parameters(&self) -> usize {
        self.interpolator.len()
    }

    /// Zero rate at `t`.
    pub fn zero_rate(&self, t: f64) -> CurveResult<f64> {
        Ok(self.interpolator.interpolate(t)?)
    }

    /// ∂r(t)/∂r_k for each node k.
    pub fn rate_weights(&self, t: f64) -> CurveResult<Vec<f64>> {
        Ok(self.interpolator.node_weights(t)?)
    }

    /// Discount factor `exp(-r(t)·t)`.
    pub fn discount_factor(&self, t: f64) -> CurveResult<f64> {
        Ok((-self.zero_rate(t)? * t).exp())
    }
}

impl PartialEq for InterpolatedCurve {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.times() == other.times()
            && self.rates() == other.rates()
    }
}

#[derive(Serialize, Deserialize)]
struct NodeRepr {
    name: String,
    times: Vec<f64>,
    rates: Vec<f64>,
}

impl Serialize for InterpolatedCurve {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        NodeRepr {
            name: self.name.clone(),
            times: self.times().to_vec(),
            rates: self.rates().to_vec(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for InterpolatedCurve {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = NodeRepr::deserialize(deserializer)?;
        Self::new(repr.name, repr.times, repr.rates).map_err(serde::de::Error::custom)
    }
}
