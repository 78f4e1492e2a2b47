//! Newton's method for square nonlinear systems.

use crate::error::MathResult;
use crate::solvers::{
    iterate, JacobianFunction, JacobianUpdate, VectorFunction, VectorRootFinder,
    VectorRootFinderConfig, VectorRootResult,
};
use nalgebra::DVector;

/// Damped Newton iteration with an analytic Jacobian at every step.
///
/// Quadratic convergence near the root, at the price of one Jacobian
/// evaluation per iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct NewtonVectorRootFinder {
    config: VectorRootFinderConfig,
}

impl NewtonVectorRootFinder {
    /// Creates a Newton root finder with the given configuration.
    #[must_use]
    pub fn new(config: VectorRootFinderConfig) -> Self {
        Self { config }
    }
}

impl VectorRootFinder for NewtonVectorRootFinder {
    fn find_root(
        &self,
        f: &VectorFunction<'_>,
        jacobian: &JacobianFunction<'_>,
        x0: &DVector<f64>,
    ) -> MathResult<VectorRootResult> {
        iterate(&self.config, JacobianUpdate::Full, f, jacobian, x0)
    }

    fn name(&self) -> &'static str {
        "Newton"
    }

    fn config(&self) -> &VectorRootFinderConfig {
        &self.config
    }
}
