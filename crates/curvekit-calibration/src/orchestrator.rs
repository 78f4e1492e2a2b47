//! Multi-stage calibration driver.

use std::fmt;

use curvekit_curves::calculators::{ResidualCalculator, SensitivityCalculator};
use curvekit_curves::{CurveRoleMap, CurveSet, ParSpreadMarketQuoteCalculator};
use curvekit_math::solvers::VectorRootFinder;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::bundle::BlockBundle;
use crate::config::CalibrationConfig;
use crate::error::{CalibrationError, CalibrationResult};
use crate::propagation::update_block_bundle;
use crate::stage::{Stage, StageLayout};
use crate::unit::StageCalibrator;

/// Everything a calibration run needs besides the calculators.
#[derive(Debug, Clone, Default)]
pub struct CalibrationRequest {
    /// Stages in calibration order.
    pub stages: Vec<Stage>,
    /// Curves available before the first stage, held fixed.
    pub known_curves: CurveSet,
    /// Stored blocks of the known curves.
    pub known_blocks: BlockBundle,
    /// Roles of the curves built by the stages.
    pub roles: CurveRoleMap,
}

impl CalibrationRequest {
    /// Creates a request from its stages.
    #[must_use]
    pub fn new(stages: Vec<Stage>) -> Self {
        Self {
            stages,
            ..Self::default()
        }
    }

    /// Sets the known curves.
    #[must_use]
    pub fn with_known_curves(mut self, curves: CurveSet) -> Self {
        self.known_curves = curves;
        self
    }

    /// Sets the stored blocks of the known curves.
    #[must_use]
    pub fn with_known_blocks(mut self, blocks: BlockBundle) -> Self {
        self.known_blocks = blocks;
        self
    }

    /// Sets the curve roles.
    #[must_use]
    pub fn with_roles(mut self, roles: CurveRoleMap) -> Self {
        self.roles = roles;
        self
    }
}

/// Summary of one solved stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    /// Zero-based stage index.
    pub index: usize,
    /// Curves calibrated in the stage.
    pub curves: Vec<String>,
    /// Earlier curves whose quotes appear in the stage's block.
    pub before: Vec<String>,
    /// Earlier curves left out for lack of a stored block.
    pub dropped_before: Vec<String>,
    /// Number of parameters solved for.
    pub parameters: usize,
    /// Root-finder iterations.
    pub iterations: u32,
    /// Residual norm at the root.
    pub residual_norm: f64,
}

/// Result of a successful run.
#[derive(Debug, Clone)]
pub struct CalibrationOutcome {
    /// Known curves plus every calibrated curve.
    pub curves: CurveSet,
    /// Known blocks plus a block for every calibrated curve.
    pub blocks: BlockBundle,
    /// One report per stage.
    pub stages: Vec<StageReport>,
}

/// Calibrates curves stage by stage and chains their inverse Jacobians.
///
/// The calibrator only holds its configuration and root finder; every run
/// works on its own copies of the request data, so one calibrator can serve
/// concurrent runs.
///
/// # Example
///
/// ```rust
/// use curvekit_calibration::prelude::*;
/// use curvekit_curves::{CurveGenerator, CurveRoleMap, CurveRoles, Deposit};
///
/// let stage = Stage::single(StageCurve::with_flat_guess(
///     "USD-OIS",
///     CurveGenerator::InterpolatedOnInstruments,
///     vec![
///         Deposit::new("USD", 0.0, 1.0, 0.030).into(),
///         Deposit::new("USD", 0.0, 2.0, 0.032).into(),
///     ],
///     0.02,
/// ));
/// let request = CalibrationRequest::new(vec![stage])
///     .with_roles(CurveRoleMap::new().with("USD-OIS", CurveRoles::new().discounting("USD")));
///
/// let calibrator = CurveCalibrator::new(CalibrationConfig::default()).unwrap();
/// let outcome = calibrator.calibrate_par_spread(&request).unwrap();
///
/// assert!(outcome.curves.contains("USD-OIS"));
/// assert_eq!(outcome.blocks.block("USD-OIS").unwrap().matrix().shape(), (2, 2));
/// ```
pub struct CurveCalibrator {
    config: CalibrationConfig,
    root_finder: Box<dyn VectorRootFinder>,
}

impl fmt::Debug for CurveCalibrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveCalibrator")
            .field("config", &self.config)
            .field("root_finder", &self.root_finder.name())
            .finish()
    }
}

impl CurveCalibrator {
    /// Creates a calibrator after validating `config`.
    pub fn new(config: CalibrationConfig) -> CalibrationResult<Self> {
        config.validate()?;
        let root_finder = config.build_root_finder();
        Ok(Self {
            config,
            root_finder,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &CalibrationConfig {
        &self.config
    }

    /// Calibrates with par-spread residuals, the recommended choice.
    pub fn calibrate_par_spread(
        &self,
        request: &CalibrationRequest,
    ) -> CalibrationResult<CalibrationOutcome> {
        let calculator = ParSpreadMarketQuoteCalculator;
        self.calibrate(request, &calculator, &calculator)
    }

    /// Runs every stage of `request` in order.
    ///
    /// Each stage is solved with the curves of all earlier stages fixed, then
    /// its inverse Jacobian is expressed against the quotes of every earlier
    /// curve with a stored block. The request is not modified.
    ///
    /// # Errors
    ///
    /// The first failing stage aborts the run:
    ///
    /// - `Configuration` for malformed stages, reused curve names, count
    ///   mismatches and singular sensitivity blocks
    /// - `ConvergenceFailure` when a stage's root finder hits its cap
    /// - `Curve` and `Math` for pricing and numerical failures
    pub fn calibrate<R, S>(
        &self,
        request: &CalibrationRequest,
        residual: &R,
        sensitivity: &S,
    ) -> CalibrationResult<CalibrationOutcome>
    where
        R: ResidualCalculator + ?Sized,
        S: SensitivityCalculator + ?Sized,
    {
        let mut curves = request.known_curves.deep_copy();
        let mut blocks = request.known_blocks.deep_copy();
        let mut reports = Vec::with_capacity(request.stages.len());
        let calibrator = StageCalibrator::new(self.root_finder.as_ref(), residual, sensitivity);

        info!(
            stages = request.stages.len(),
            known_curves = curves.len(),
            root_finder = self.root_finder.name(),
            residual = residual.name(),
            "starting calibration"
        );

        for (index, stage) in request.stages.iter().enumerate() {
            let layout = StageLayout::flatten(stage)?;
            if let Some(name) = layout.names().iter().find(|name| curves.contains(name)) {
                return Err(CalibrationError::configuration(format!(
                    "curve {name} of stage {index} is already known"
                )));
            }
            info!(stage = index, curves = ?layout.names(), "calibrating stage");

            let unit = calibrator.make_unit(index, &layout, &curves, &request.roles)?;
            let update = update_block_bundle(
                layout.instruments(),
                &unit.curves,
                layout.names(),
                &blocks,
                sensitivity,
            )?;
            debug!(
                stage = index,
                columns = update.block.total_parameters(),
                "stage blocks stored"
            );

            blocks = blocks.with_stage(&update.block, update.matrices)?;
            curves = unit.curves;

            reports.push(StageReport {
                index,
                curves: layout.names().to_vec(),
                before: update.before,
                dropped_before: update.dropped,
                parameters: unit.parameters.len(),
                iterations: unit.iterations,
                residual_norm: unit.residual_norm,
            });
            info!(
                stage = index,
                iterations = unit.iterations,
                residual = unit.residual_norm,
                "stage calibrated"
            );
        }

        Ok(CalibrationOutcome {
            curves,
            blocks,
            stages: reports,
        })
    }
}
