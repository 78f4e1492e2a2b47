//! Calibration stages.
//!
//! A stage is a group of curves solved simultaneously. Curves in a stage may
//! depend on curves of earlier stages, which are held fixed while the stage
//! is solved.

use std::collections::HashSet;

use curvekit_curves::{CurveGenerator, Instrument};
use serde::{Deserialize, Serialize};

use crate::block::{BlockRange, BuildingBlock};
use crate::error::{CalibrationError, CalibrationResult};

/// One curve of a stage: how it is built and what it must reprice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageCurve {
    /// Unique curve name.
    pub name: String,
    /// Parameterization of the curve.
    pub generator: CurveGenerator,
    /// Calibrating instruments, in the order their quotes are addressed.
    pub instruments: Vec<Instrument>,
    /// Starting parameters for the root finder.
    pub initial_guess: Vec<f64>,
}

impl StageCurve {
    /// Creates a stage curve.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        generator: CurveGenerator,
        instruments: Vec<Instrument>,
        initial_guess: Vec<f64>,
    ) -> Self {
        Self {
            name: name.into(),
            generator,
            instruments,
            initial_guess,
        }
    }

    /// Creates a stage curve whose guess is `guess` for every instrument.
    #[must_use]
    pub fn with_flat_guess(
        name: impl Into<String>,
        generator: CurveGenerator,
        instruments: Vec<Instrument>,
        guess: f64,
    ) -> Self {
        let initial_guess = vec![guess; instruments.len()];
        Self::new(name, generator, instruments, initial_guess)
    }
}

/// Curves calibrated together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    /// Curves in calibration order.
    pub curves: Vec<StageCurve>,
}

impl Stage {
    /// Creates a stage from several curves.
    #[must_use]
    pub fn new(curves: Vec<StageCurve>) -> Self {
        Self { curves }
    }

    /// Creates a stage with a single curve.
    #[must_use]
    pub fn single(curve: StageCurve) -> Self {
        Self { curves: vec![curve] }
    }

    /// Curve names in calibration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.curves.iter().map(|c| c.name.as_str())
    }

    /// Total number of calibrating instruments.
    #[must_use]
    pub fn instrument_count(&self) -> usize {
        self.curves.iter().map(|c| c.instruments.len()).sum()
    }

    /// Checks the structural rules of a stage.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for an empty stage, a curve without
    /// instruments, or a curve name used twice.
    pub fn validate(&self) -> CalibrationResult<()> {
        if self.curves.is_empty() {
            return Err(CalibrationError::configuration("stage has no curves"));
        }
        let mut seen = HashSet::with_capacity(self.curves.len());
        for curve in &self.curves {
            if curve.instruments.is_empty() {
                return Err(CalibrationError::configuration(format!(
                    "curve {} has no calibrating instruments",
                    curve.name
                )));
            }
            if !seen.insert(curve.name.as_str()) {
                return Err(CalibrationError::configuration(format!(
                    "curve {} appears twice in the stage",
                    curve.name
                )));
            }
            for instrument in &curve.instruments {
                instrument.validate()?;
            }
        }
        Ok(())
    }
}

/// A stage flattened for the root finder.
///
/// Instruments and guesses of all curves are concatenated in curve order;
/// the per-curve guess offsets are kept as a building block so each curve's
/// starting values can be addressed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct StageLayout {
    names: Vec<String>,
    generators: Vec<CurveGenerator>,
    instruments: Vec<Instrument>,
    initial_guess: Vec<f64>,
    guess_ranges: BuildingBlock,
}

impl StageLayout {
    /// Validates and flattens a stage, finalizing each generator with its
    /// own instruments.
    pub fn flatten(stage: &Stage) -> CalibrationResult<Self> {
        stage.validate()?;

        let mut names = Vec::with_capacity(stage.curves.len());
        let mut generators = Vec::with_capacity(stage.curves.len());
        let mut instruments = Vec::with_capacity(stage.instrument_count());
        let mut initial_guess = Vec::new();
        for curve in &stage.curves {
            names.push(curve.name.clone());
            generators.push(curve.generator.finalize(&curve.instruments)?);
            instruments.extend(curve.instruments.iter().cloned());
            initial_guess.extend_from_slice(&curve.initial_guess);
        }

        let guess_ranges = BuildingBlock::from_lengths(
            stage
                .curves
                .iter()
                .map(|c| (c.name.clone(), c.initial_guess.len())),
        )?;

        Ok(Self {
            names,
            generators,
            instruments,
            initial_guess,
            guess_ranges,
        })
    }

    /// Curve names in calibration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Finalized generators, aligned with [`names`](Self::names).
    #[must_use]
    pub fn generators(&self) -> &[CurveGenerator] {
        &self.generators
    }

    /// All calibrating instruments of the stage.
    #[must_use]
    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    /// Concatenated initial guess.
    #[must_use]
    pub fn initial_guess(&self) -> &[f64] {
        &self.initial_guess
    }

    /// Position of a curve's guess in [`initial_guess`](Self::initial_guess).
    #[must_use]
    pub fn guess_range(&self, name: &str) -> Option<BlockRange> {
        self.guess_ranges.range(name)
    }
}
