//! Interpolation on curve nodes.
//!
//! Curves in this workspace are parameterized by their values at a set of
//! node times. Calibration needs both the interpolated value and how that
//! value moves when each node moves, so every interpolator also reports its
//! node weights.

mod linear;

pub use linear::LinearInterpolator;

use crate::error::MathResult;

/// Trait for interpolation methods.
pub trait Interpolator: Send + Sync {
    /// Returns the interpolated value at x.
    fn interpolate(&self, x: f64) -> MathResult<f64>;

    /// Returns the first derivative at x.
    fn derivative(&self, x: f64) -> MathResult<f64>;

    /// Returns ∂y(x)/∂y_k for every node k.
    ///
    /// The weights are independent of the node values for linear schemes, so
    /// the interpolated value equals the dot product of weights and values.
    fn node_weights(&self, x: f64) -> MathResult<Vec<f64>>;

    /// Returns true if extrapolation is allowed.
    fn allows_extrapolation(&self) -> bool {
        false
    }

    /// Returns the minimum x value in the data.
    fn min_x(&self) -> f64;

    /// Returns the maximum x value in the data.
    fn max_x(&self) -> f64;

    /// Checks if x is within the interpolation range.
    fn in_range(&self, x: f64) -> bool {
        x >= self.min_x() && x <= self.max_x()
    }
}
