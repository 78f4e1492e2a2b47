//! Point and parameter sensitivities.
//!
//! Instruments report how their value moves with the zero rate of each curve
//! at each time they touch ([`PointSensitivities`]). Calibration needs the
//! same information with respect to curve parameters, laid out over an
//! ordered list of curves; [`parameter_sensitivity`] performs that
//! conversion through the curves' node weights.

use std::collections::HashMap;

use nalgebra::DVector;

use crate::error::CurveResult;
use crate::multicurve::CurveSet;

/// Sensitivity of a value to one curve's zero rate at one time.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSensitivity {
    /// Curve name.
    pub curve: String,
    /// Time in years.
    pub time: f64,
    /// ∂value/∂r(time).
    pub value: f64,
}

/// A list of point sensitivities.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSensitivities {
    entries: Vec<PointSensitivity>,
}

impl PointSensitivities {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sensitivity.
    pub fn add(&mut self, curve: impl Into<String>, time: f64, value: f64) {
        self.entries.push(PointSensitivity {
            curve: curve.into(),
            time,
            value,
        });
    }

    /// Appends every entry of `other`.
    pub fn extend(&mut self, other: PointSensitivities) {
        self.entries.extend(other.entries);
    }

    /// Multiplies every entry by `factor`.
    #[must_use]
    pub fn scaled(mut self, factor: f64) -> Self {
        for entry in &mut self.entries {
            entry.value *= factor;
        }
        self
    }

    /// Returns the entries.
    pub fn entries(&self) -> &[PointSensitivity] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Converts point sensitivities into sensitivities to curve parameters.
///
/// The result has one entry per parameter of the curves in `ordered_names`,
/// concatenated in that order. A spread curve passes its point sensitivity on
/// to its base, so a value priced off a spread curve is also sensitive to the
/// base curve's parameters. Curves missing from `ordered_names` contribute
/// nothing.
///
/// # Errors
///
/// Returns `CurveNotFound` if a name in `ordered_names` or a curve on a
/// spread chain is not in `curves`.
pub fn parameter_sensitivity(
    point: &PointSensitivities,
    curves: &CurveSet,
    ordered_names: &[String],
) -> CurveResult<DVector<f64>> {
    let mut offsets = HashMap::with_capacity(ordered_names.len());
    let mut total = 0;
    for name in ordered_names {
        offsets.insert(name.as_str(), total);
        total += curves.number_of_parameters(name)?;
    }

    let mut result = DVector::zeros(total);
    for entry in point.entries() {
        for link in curves.base_chain(&entry.curve)? {
            let Some(&offset) = offsets.get(link) else {
                continue;
            };
            let weights = curves.curve(link)?.own_weights(entry.time)?;
            for (k, w) in weights.iter().enumerate() {
                result[offset + k] += entry.value * w;
            }
        }
    }
    Ok(result)
}
