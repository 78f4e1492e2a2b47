//! Broyden's method for square nonlinear systems.

use crate::error::MathResult;
use crate::solvers::{
    iterate, JacobianFunction, JacobianUpdate, VectorFunction, VectorRootFinder,
    VectorRootFinderConfig, VectorRootResult,
};
use nalgebra::DVector;

/// Quasi-Newton iteration with Broyden's rank-one Jacobian updates.
///
/// The analytic Jacobian is evaluated at the initial guess only. After each
/// accepted step `dx` with residual change `dF` it is updated as
///
/// `J ← J + (dF - J·dx)·dxᵀ / (dxᵀ·dx)`
///
/// When the line search cannot reduce the residual with the approximate
/// Jacobian, a fresh analytic Jacobian is computed and the step is retried.
/// This is the default solver for curve calibration, where Jacobians are the
/// expensive part of each iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BroydenVectorRootFinder {
    config: VectorRootFinderConfig,
}

impl BroydenVectorRootFinder {
    /// Creates a Broyden root finder with the given configuration.
    #[must_use]
    pub fn new(config: VectorRootFinderConfig) -> Self {
        Self { config }
    }
}

impl VectorRootFinder for BroydenVectorRootFinder {
    fn find_root(
        &self,
        f: &VectorFunction<'_>,
        jacobian: &JacobianFunction<'_>,
        x0: &DVector<f64>,
    ) -> MathResult<VectorRootResult> {
        iterate(&self.config, JacobianUpdate::Broyden, f, jacobian, x0)
    }

    fn name(&self) -> &'static str {
        "Broyden"
    }

    fn config(&self) -> &VectorRootFinderConfig {
        &self.config
    }
}
