//! # Curvekit Calibration
//!
//! Staged calibration of interest rate curves with propagation of the
//! inverse Jacobian from one stage to the next.
//!
//! A calibration request is a sequence of [`Stage`](stage::Stage)s. Each
//! stage names one or more curves, their parameterization, their calibrating
//! instruments and an initial guess. Stages are solved in order; a stage may
//! depend on the curves of every earlier stage, which stay fixed while it is
//! solved.
//!
//! Besides the curves, a run produces a [`BlockBundle`](bundle::BlockBundle):
//! for every calibrated curve, the sensitivity of its parameters to the
//! market quotes of its own stage and of every earlier stage it depends on.
//! The column layout of these matrices is described by a
//! [`BuildingBlock`](block::BuildingBlock).
//!
//! ## Modules
//!
//! - [`config`]: solver settings, loadable from TOML or JSON
//! - [`stage`]: stage description and flattening
//! - [`unit`]: solving a single stage
//! - [`propagation`]: chaining inverse Jacobians across stages
//! - [`orchestrator`]: the multi-stage driver
//!
//! ## Logging
//!
//! Stage progress is reported through `tracing` at `info` level, solver and
//! block details at `debug`. Earlier curves that cannot be chained through
//! because no block was supplied for them are reported at `warn`.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::similar_names)]
#![allow(clippy::too_many_lines)]

pub mod block;
pub mod bundle;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod propagation;
pub mod stage;
pub mod unit;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::block::{BlockRange, BuildingBlock};
    pub use crate::bundle::{BlockBundle, BlockEntry};
    pub use crate::config::{CalibrationConfig, RootFinderKind};
    pub use crate::error::{CalibrationError, CalibrationResult};
    pub use crate::orchestrator::{
        CalibrationOutcome, CalibrationRequest, CurveCalibrator, StageReport,
    };
    pub use crate::propagation::{update_block_bundle, BlockUpdate};
    pub use crate::stage::{Stage, StageCurve, StageLayout};
    pub use crate::unit::{StageCalibrator, UnitOutcome};
}

pub use block::{BlockRange, BuildingBlock};
pub use bundle::{BlockBundle, BlockEntry};
pub use config::{CalibrationConfig, RootFinderKind};
pub use error::{CalibrationError, CalibrationResult};
pub use orchestrator::{CalibrationOutcome, CalibrationRequest, CurveCalibrator, StageReport};
pub use stage::{Stage, StageCurve};
