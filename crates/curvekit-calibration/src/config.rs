//! Calibration configuration.
//!
//! A [`CalibrationConfig`] is supplied once when the calibrator is built and
//! reused for every stage of every run. It can be written in TOML or JSON:
//!
//! ```toml
//! absolute_tolerance = 1e-10
//! max_iterations = 50
//! root_finder = "Newton"
//! ```
//!
//! Omitted fields take their defaults.

use curvekit_math::solvers::{
    BroydenVectorRootFinder, NewtonVectorRootFinder, VectorRootFinder, VectorRootFinderConfig,
    DEFAULT_ABSOLUTE_TOLERANCE, DEFAULT_MAX_ITERATIONS, DEFAULT_RELATIVE_TOLERANCE,
};
use serde::{Deserialize, Serialize};

use crate::error::{CalibrationError, CalibrationResult};

/// Root-finding algorithm used for each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RootFinderKind {
    /// Newton-Raphson with the analytic Jacobian at every iteration.
    Newton,
    /// Broyden rank-one updates, refreshing the analytic Jacobian on stalls.
    #[default]
    Broyden,
}

/// Solver settings shared by all stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Absolute tolerance on the step and residual norms.
    #[serde(default = "default_absolute_tolerance")]
    pub absolute_tolerance: f64,

    /// Relative tolerance on the step norm.
    #[serde(default = "default_relative_tolerance")]
    pub relative_tolerance: f64,

    /// Iteration cap per stage.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Root finder algorithm.
    #[serde(default)]
    pub root_finder: RootFinderKind,
}

fn default_absolute_tolerance() -> f64 {
    DEFAULT_ABSOLUTE_TOLERANCE
}

fn default_relative_tolerance() -> f64 {
    DEFAULT_RELATIVE_TOLERANCE
}

fn default_max_iterations() -> u32 {
    DEFAULT_MAX_ITERATIONS
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            absolute_tolerance: default_absolute_tolerance(),
            relative_tolerance: default_relative_tolerance(),
            max_iterations: default_max_iterations(),
            root_finder: RootFinderKind::default(),
        }
    }
}

impl CalibrationConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the absolute tolerance.
    #[must_use]
    pub fn with_absolute_tolerance(mut self, tolerance: f64) -> Self {
        self.absolute_tolerance = tolerance;
        self
    }

    /// Sets the relative tolerance.
    #[must_use]
    pub fn with_relative_tolerance(mut self, tolerance: f64) -> Self {
        self.relative_tolerance = tolerance;
        self
    }

    /// Sets the iteration cap.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Sets the root finder.
    #[must_use]
    pub fn with_root_finder(mut self, kind: RootFinderKind) -> Self {
        self.root_finder = kind;
        self
    }

    /// Parses a TOML document and validates it.
    pub fn from_toml_str(content: &str) -> CalibrationResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            CalibrationError::configuration(format!("Failed to parse TOML config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Parses a JSON document and validates it.
    pub fn from_json_str(content: &str) -> CalibrationResult<Self> {
        let config: Self = serde_json::from_str(content).map_err(|e| {
            CalibrationError::configuration(format!("Failed to parse JSON config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every field, reporting all problems at once.
    pub fn validate(&self) -> CalibrationResult<()> {
        let mut problems = Vec::new();

        if !(self.absolute_tolerance.is_finite() && self.absolute_tolerance > 0.0) {
            problems.push(format!(
                "absolute_tolerance must be positive and finite, got {}",
                self.absolute_tolerance
            ));
        }
        if !(self.relative_tolerance.is_finite() && self.relative_tolerance >= 0.0) {
            problems.push(format!(
                "relative_tolerance must be non-negative and finite, got {}",
                self.relative_tolerance
            ));
        }
        if self.max_iterations == 0 {
            problems.push("max_iterations must be at least 1".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(CalibrationError::configuration(problems.join("; ")))
        }
    }

    /// Settings handed to the root finder.
    #[must_use]
    pub fn root_finder_config(&self) -> VectorRootFinderConfig {
        VectorRootFinderConfig::new(
            self.absolute_tolerance,
            self.relative_tolerance,
            self.max_iterations,
        )
    }

    /// Instantiates the configured root finder.
    #[must_use]
    pub fn build_root_finder(&self) -> Box<dyn VectorRootFinder> {
        let config = self.root_finder_config();
        match self.root_finder {
            RootFinderKind::Newton => Box::new(NewtonVectorRootFinder::new(config)),
            RootFinderKind::Broyden => Box::new(BroydenVectorRootFinder::new(config)),
        }
    }
}
