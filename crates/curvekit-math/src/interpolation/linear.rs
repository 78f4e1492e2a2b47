//! Linear interpolation.

use crate::error::{MathError, MathResult};
use crate::interpolation::Interpolator;

/// Linear interpolation between data points.
///
/// Outside the node range the interpolator either rejects the query or, with
/// [`with_flat_extrapolation`](Self::with_flat_extrapolation), holds the
/// nearest end value. A single node describes a constant function and is only
/// usable with flat extrapolation.
///
/// # Example
///
/// ```rust
/// use curvekit_math::interpolation::{Interpolator, LinearInterpolator};
///
/// let xs = vec![0.0, 1.0, 2.0, 3.0];
/// let ys = vec![0.0, 1.0, 4.0, 9.0];
///
/// let interp = LinearInterpolator::new(xs, ys).unwrap();
/// let y = interp.interpolate(1.5).unwrap();
/// assert!((y - 2.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
    flat_extrapolation: bool,
}

impl LinearInterpolator {
    /// Creates a new linear interpolator.
    ///
    /// # Arguments
    ///
    /// * `xs` - X coordinates (must be strictly increasing)
    /// * `ys` - Y coordinates
    ///
    /// # Errors
    ///
    /// Returns an error if there are no points, if lengths differ, or if the
    /// x values are not strictly increasing.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> MathResult<Self> {
        if xs.is_empty() {
            return Err(MathError::insufficient_data(1, 0));
        }
        if xs.len() != ys.len() {
            return Err(MathError::invalid_input(format!(
                "xs and ys must have same length: {} vs {}",
                xs.len(),
                ys.len()
            )));
        }
        if xs.iter().chain(ys.iter()).any(|v| !v.is_finite()) {
            return Err(MathError::invalid_input("interpolation data must be finite"));
        }
        if xs.windows(2).any(|w| w[1] <= w[0]) {
            return Err(MathError::invalid_input(
                "x values must be strictly increasing",
            ));
        }

        Ok(Self {
            xs,
            ys,
            flat_extrapolation: false,
        })
    }

    /// Holds the end values constant outside the node range.
    #[must_use]
    pub fn with_flat_extrapolation(mut self) -> Self {
        self.flat_extrapolation = true;
        self
    }

    /// Returns the node x values.
    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    /// Returns the node y values.
    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Always false; an interpolator holds at least one node.
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    fn check_range(&self, x: f64) -> MathResult<()> {
        if !self.flat_extrapolation && !self.in_range(x) {
            return Err(MathError::ExtrapolationNotAllowed {
                x,
                min: self.min_x(),
                max: self.max_x(),
            });
        }
        Ok(())
    }

    /// Locates `x` relative to the nodes.
    ///
    /// Returns `(i, w)` such that the value is `(1 - w) * ys[i] + w * ys[i + 1]`,
    /// with `i + 1` clamped to the last node when `x` sits at or beyond it.
    fn locate(&self, x: f64) -> (usize, f64) {
        let last = self.xs.len() - 1;
        if last == 0 || x <= self.xs[0] {
            return (0, 0.0);
        }
        if x >= self.xs[last] {
            return (last, 0.0);
        }
        // xs[i] <= x < xs[i + 1]
        let i = self.xs.partition_point(|&probe| probe <= x) - 1;
        let w = (x - self.xs[i]) / (self.xs[i + 1] - self.xs[i]);
        (i, w)
    }
}

impl Interpolator for LinearInterpolator {
    fn interpolate(&self, x: f64) -> MathResult<f64> {
        self.check_range(x)?;
        let (i, w) = self.locate(x);
        if w == 0.0 {
            return Ok(self.ys[i]);
        }
        Ok(self.ys[i] + w * (self.ys[i + 1] - self.ys[i]))
    }

    fn derivative(&self, x: f64) -> MathResult<f64> {
        self.check_range(x)?;
        let last = self.xs.len() - 1;
        if last == 0 || x < self.xs[0] || x >= self.xs[last] {
            return Ok(0.0);
        }
        let (i, _) = self.locate(x);
        Ok((self.ys[i + 1] - self.ys[i]) / (self.xs[i + 1] - self.xs[i]))
    }

    fn node_weights(&self, x: f64) -> MathResult<Vec<f64>> {
        self.check_range(x)?;
        let mut weights = vec![0.0; self.xs.len()];
        let (i, w) = self.locate(x);
        weights[i] = 1.0 - w;
        if w > 0.0 {
            weights[i + 1] = w;
        }
        Ok(weights)
    }

    fn allows_extrapolation(&self) -> bool {
        self.flat_extrapolation
    }

    fn min_x(&self) -> f64 {
        self.xs[0]
    }

    fn max_x(&self) -> f64 {
        self.xs[self.xs.len() - 1]
    }
}
