//! Spread curves over a named base curve.

use curvekit_math::interpolation::{Interpolator, LinearInterpolator};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CurveError, CurveResult};

/// An additive zero-rate spread over a base curve.
///
/// `r(t) = r_base(t) + s(t)`, where `s` is linearly interpolated between
/// spread nodes and held flat outside them. The base is referenced by name
/// and resolved by the curve set, so a spread curve's parameters are its
/// spread nodes only.
#[derive(Debug, Clone)]
pub struct SpreadCurve {
    name: String,
    base: String,
    interpolator: LinearInterpolator,
}

impl SpreadCurve {
    /// Creates a spread curve over `base`.
    pub fn new(
        name: impl Into<String>,
        base: impl Into<String>,
        times: Vec<f64>,
        spreads: Vec<f64>,
    ) -> CurveResult<Self> {
        let name = name.into();
        let base = base.into();
        if name == base {
            return Err(CurveError::invalid_parameters(format!(
                "spread curve {name} cannot be its own base"
            )));
        }
        if times.first().is_some_and(|&t| t <= 0.0) {
            return Err(CurveError::invalid_parameters(format!(
                "curve {name}: node times must be positive"
            )));
        }
        let interpolator = LinearInterpolator::new(times, spreads)
            .map_err(|e| CurveError::invalid_parameters(format!("curve {name}: {e}")))?
            .with_flat_extrapolation();
        Ok(Self {
            name,
            base,
            interpolator,
        })
    }

    /// Returns the curve name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name of the base curve.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns the spread node times.
    pub fn times(&self) -> &[f64] {
        self.interpolator.xs()
    }

    /// Returns the node spreads.
    pub fn spreads(&self) -> &[f64] {
        self.interpolator.ys()
    }

    /// Number of spread nodes.
    pub fn number_of_parameters(&self) -> usize {
        self.interpolator.len()
    }

    /// Spread at `t`.
    pub fn spread(&self, t: f64) -> CurveResult<f64> {
        Ok(self.interpolator.interpolate(t)?)
    }

    /// ∂s(t)/∂s_k for each spread node k.
    pub fn spread_weights(&self, t: f64) -> CurveResult<Vec<f64>> {
        Ok(self.interpolator.node_weights(t)?)
    }
}

impl PartialEq for SpreadCurve {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.base == other.base
            && self.times() == other.times()
            && self.spreads() == other.spreads()
    }
}

#[derive(Serialize, Deserialize)]
struct SpreadRepr {
    name: String,
    base: String,
    times: Vec<f64>,
    spreads: Vec<f64>,
}

impl Serialize for SpreadCurve {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        SpreadRepr {
            name: self.name.clone(),
            base: self.base.clone(),
            times: self.times().to_vec(),
            spreads: self.spreads().to_vec(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SpreadCurve {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = SpreadRepr::deserialize(deserializer)?;
        Self::new(repr.name, repr.base, repr.times, repr.spreads)
            .map_err(serde::de::Error::custom)
    }
}
