//! Stage calibrator.
//!
//! Solves one stage: finds the parameters of the stage's curves such that
//! every calibrating instrument has a zero residual, with the curves of
//! earlier stages held fixed.

use std::cell::RefCell;
use std::collections::HashSet;

use curvekit_curves::calculators::{ResidualCalculator, SensitivityCalculator};
use curvekit_curves::multicurve::{CurveRoleMap, CurveSet};
use curvekit_curves::sensitivity::parameter_sensitivity;
use curvekit_curves::{CurveError, CurveResult, Instrument};
use curvekit_math::solvers::VectorRootFinder;
use curvekit_math::MathError;
use nalgebra::{DMatrix, DVector};
use tracing::debug;

use crate::block::BuildingBlock;
use crate::error::{CalibrationError, CalibrationResult};
use crate::stage::StageLayout;

/// Result of solving one stage.
#[derive(Debug, Clone)]
pub struct UnitOutcome {
    /// Known curves merged with the calibrated curves of the stage.
    pub curves: CurveSet,
    /// Parameters at the root, in stage order.
    pub parameters: DVector<f64>,
    /// Root-finder iterations.
    pub iterations: u32,
    /// Residual norm at the root.
    pub residual_norm: f64,
}

/// Solves a single stage with a root finder and a pair of calculators.
pub struct StageCalibrator<'a, R: ?Sized, S: ?Sized> {
    root_finder: &'a dyn VectorRootFinder,
    residual: &'a R,
    sensitivity: &'a S,
}

impl<'a, R, S> StageCalibrator<'a, R, S>
where
    R: ResidualCalculator + ?Sized,
    S: SensitivityCalculator + ?Sized,
{
    /// Creates a stage calibrator.
    pub fn new(root_finder: &'a dyn VectorRootFinder, residual: &'a R, sensitivity: &'a S) -> Self {
        Self {
            root_finder,
            residual,
            sensitivity,
        }
    }

    /// Calibrates the curves of `layout` on top of `known`.
    ///
    /// The instrument count and the parameter count are checked before the
    /// root finder is started, as is the guess length of every curve.
    /// `known` is not modified.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the counts disagree or a spread curve's base is
    ///   not available
    /// - `ConvergenceFailure` if the root finder hits its iteration cap
    /// - `Curve` or `Math` for pricing and numerical failures
    pub fn make_unit(
        &self,
        stage_index: usize,
        layout: &StageLayout,
        known: &CurveSet,
        roles: &CurveRoleMap,
    ) -> CalibrationResult<UnitOutcome> {
        let parameter_ranges = parameter_layout(layout, known)?;
        let instruments = layout.instruments();
        let n = parameter_ranges.total_parameters();

        if instruments.len() != n {
            return Err(CalibrationError::configuration(format!(
                "stage {stage_index} has {} instruments for {n} parameters",
                instruments.len()
            )));
        }
        if layout.initial_guess().len() != n {
            return Err(CalibrationError::configuration(format!(
                "stage {stage_index} has an initial guess of length {} for {n} parameters",
                layout.initial_guess().len()
            )));
        }
        for (name, range) in parameter_ranges.iter() {
            if layout.guess_range(name) != Some(range) {
                let given = layout.guess_range(name).map_or(0, |guess| guess.len);
                return Err(CalibrationError::configuration(format!(
                    "stage {stage_index}: curve {name} has an initial guess of length {given} for {} parameters",
                    range.len
                )));
            }
        }

        let build = |x: &DVector<f64>| -> CurveResult<CurveSet> {
            let mut curves = Vec::with_capacity(layout.names().len());
            for (name, generator) in layout.names().iter().zip(layout.generators()) {
                let range = parameter_ranges
                    .range(name)
                    .ok_or_else(|| CurveError::curve_not_found(name.clone()))?;
                curves.push(generator.build(name, &x.as_slice()[range.as_range()])?);
            }
            known.with_curves(curves, roles)
        };

        // Curve errors cannot cross the root finder's interface; park the
        // first one and hand the solver a placeholder.
        let failure: RefCell<Option<CurveError>> = RefCell::new(None);
        let park = |e: CurveError| -> MathError {
            let placeholder = MathError::invalid_input(e.to_string());
            let mut slot = failure.borrow_mut();
            if slot.is_none() {
                *slot = Some(e);
            }
            placeholder
        };

        let residuals = |x: &DVector<f64>| -> Result<DVector<f64>, MathError> {
            let curves = build(x).map_err(park)?;
            let mut values = DVector::zeros(instruments.len());
            for (i, instrument) in instruments.iter().enumerate() {
                values[i] = self.residual.residual(instrument, &curves).map_err(park)?;
            }
            Ok(values)
        };

        let jacobian = |x: &DVector<f64>| -> Result<DMatrix<f64>, MathError> {
            let curves = build(x).map_err(park)?;
            stage_jacobian(self.sensitivity, instruments, &curves, layout.names()).map_err(park)
        };

        let x0 = DVector::from_column_slice(layout.initial_guess());
        let solved = self.root_finder.find_root(&residuals, &jacobian, &x0);
        let result = match solved {
            Ok(result) => result,
            Err(MathError::ConvergenceFailed {
                iterations,
                residual,
            }) => {
                return Err(CalibrationError::convergence_failure(
                    stage_index,
                    iterations,
                    residual,
                ))
            }
            Err(e) => {
                return Err(match failure.into_inner() {
                    Some(curve_error) => curve_error.into(),
                    None => e.into(),
                })
            }
        };

        debug!(
            stage = stage_index,
            root_finder = self.root_finder.name(),
            iterations = result.iterations,
            residual = result.residual_norm,
            jacobians = result.jacobian_evaluations,
            "stage root found"
        );

        let curves = build(&result.root)?;
        Ok(UnitOutcome {
            curves,
            parameters: result.root,
            iterations: result.iterations,
            residual_norm: result.residual_norm,
        })
    }
}

/// Parameter slices of the stage's curves.
///
/// Counts are intrinsic: each curve sees the known curves plus the stage
/// curves before it.
fn parameter_layout(layout: &StageLayout, known: &CurveSet) -> CalibrationResult<BuildingBlock> {
    let mut available: HashSet<String> = known.all_names().iter().cloned().collect();
    let mut lengths = Vec::with_capacity(layout.names().len());
    for (name, generator) in layout.names().iter().zip(layout.generators()) {
        let count = match generator.intrinsic_parameter_count(&available) {
            Ok(count) => count,
            Err(CurveError::CurveNotFound { name: base }) => {
                return Err(CalibrationError::configuration(format!(
                    "base curve {base} of {name} is neither known nor calibrated earlier in the stage"
                )))
            }
            Err(e) => return Err(e.into()),
        };
        lengths.push((name.clone(), count));
        available.insert(name.clone());
    }
    BuildingBlock::from_lengths(lengths)
}

/// Derivative of each instrument's residual with respect to the parameters
/// of `ordered_names`, one row per instrument.
pub(crate) fn stage_jacobian<S: SensitivityCalculator + ?Sized>(
    sensitivity: &S,
    instruments: &[Instrument],
    curves: &CurveSet,
    ordered_names: &[String],
) -> CurveResult<DMatrix<f64>> {
    let mut rows = Vec::with_capacity(instruments.len());
    for instrument in instruments {
        let point = sensitivity.point_sensitivity(instrument, curves)?;
        rows.push(parameter_sensitivity(&point, curves, ordered_names)?);
    }
    let ncols = rows.first().map_or(0, |row| row.len());
    Ok(DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::{Stage, StageCurve};
    use curvekit_curves::calculators::ParSpreadMarketQuoteCalculator;
    use curvekit_curves::multicurve::CurveRoles;
    use curvekit_curves::{CurveGenerator, Deposit, Swap};
    use curvekit_math::solvers::{NewtonVectorRootFinder, VectorRootFinderConfig};
    use approx::assert_relative_eq;

    fn roles() -> CurveRoleMap {
        CurveRoleMap::new().with(
            "USD-OIS",
            CurveRoles::new().discounting("USD").overnight("USD-SOFR"),
        )
    }

    fn ois_instruments() -> Vec<Instrument> {
        vec![
            Deposit::new("USD", 0.0, 0.5, 0.0300).into(),
            Swap::ois("USD", "USD-SOFR", 1.0, 0.0310).into(),
            Swap::ois("USD", "USD-SOFR", 2.0, 0.0325).into(),
            Swap::ois("USD", "USD-SOFR", 5.0, 0.0350).into(),
        ]
    }

    fn finder() -> NewtonVectorRootFinder {
        NewtonVectorRootFinder::new(VectorRootFinderConfig::new(1e-12, 1e-12, 50))
    }

    #[test]
    fn test_single_curve_reprices_instruments() {
        let stage = Stage::single(StageCurve::with_flat_guess(
            "USD-OIS",
            CurveGenerator::InterpolatedOnInstruments,
            ois_instruments(),
            0.02,
        ));
        let layout = StageLayout::flatten(&stage).unwrap();
        let known = CurveSet::new();
        let finder = finder();
        let calculator = ParSpreadMarketQuoteCalculator;

        let outcome = StageCalibrator::new(&finder, &calculator, &calculator)
            .make_unit(0, &layout, &known, &roles())
            .unwrap();

        assert!(known.is_empty());
        assert_eq!(outcome.curves.len(), 1);
        assert_eq!(outcome.parameters.len(), 4);
        for instrument in layout.instruments() {
            let residual = calculator.residual(instrument, &outcome.curves).unwrap();
            assert!(residual.abs() < 1e-10, "{}: {residual}", instrument.label());
        }
        assert_relative_eq!(
            outcome.curves.zero_rate("USD-OIS", 0.5).unwrap(),
            2.0 * (1.0_f64 + 0.5 * 0.03).ln(),
            epsilon = 1e-10
        );
    }

    #[test]
    fn test_count_mismatch_detected_before_solving() {
        let stage = Stage::single(StageCurve::new(
            "USD-OIS",
            CurveGenerator::interpolated(vec![0.5, 1.0, 2.0, 5.0]),
            ois_instruments()[..3].to_vec(),
            vec![0.02; 4],
        ));
        let layout = StageLayout::flatten(&stage).unwrap();
        let finder = finder();
        let calculator = ParSpreadMarketQuoteCalculator;

        let err = StageCalibrator::new(&finder, &calculator, &calculator)
            .make_unit(3, &layout, &CurveSet::new(), &roles())
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("stage 3 has 3 instruments for 4 parameters"));
    }

    #[test]
    fn test_guess_length_checked() {
        let stage = Stage::single(StageCurve::new(
            "USD-OIS",
            CurveGenerator::InterpolatedOnInstruments,
            ois_instruments(),
            vec![0.02; 3],
        ));
        let layout = StageLayout::flatten(&stage).unwrap();
        let finder = finder();
        let calculator = ParSpreadMarketQuoteCalculator;

        let err = StageCalibrator::new(&finder, &calculator, &calculator)
            .make_unit(0, &layout, &CurveSet::new(), &roles())
            .unwrap_err();
        assert!(err.to_string().contains("initial guess"));
    }

    #[test]
    fn test_guess_checked_per_curve() {
        // Totals agree, but one guess entry would land on the wrong curve.
        let stage = Stage::new(vec![
            StageCurve::new(
                "USD-OIS",
                CurveGenerator::InterpolatedOnInstruments,
                ois_instruments(),
                vec![0.02; 3],
            ),
            StageCurve::new(
                "ACME",
                CurveGenerator::spread("USD-OIS", vec![2.0]),
                vec![curvekit_curves::ZeroCouponBond::new("ACME", 2.0, 0.04).into()],
                vec![0.01; 2],
            ),
        ]);
        let layout = StageLayout::flatten(&stage).unwrap();
        let roles = roles().with("ACME", CurveRoles::new().issuer("ACME"));
        let finder = finder();
        let calculator = ParSpreadMarketQuoteCalculator;

        let err = StageCalibrator::new(&finder, &calculator, &calculator)
            .make_unit(1, &layout, &CurveSet::new(), &roles)
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(
            err.to_string()
                .contains("curve USD-OIS has an initial guess of length 3 for 4 parameters"),
            "{err}"
        );
    }

    #[test]
    fn test_unknown_spread_base() {
        let stage = Stage::single(StageCurve::new(
            "ACME",
            CurveGenerator::spread("USD-OIS", vec![2.0]),
            vec![curvekit_curves::ZeroCouponBond::new("ACME", 2.0, 0.04).into()],
            vec![0.01],
        ));
        let layout = StageLayout::flatten(&stage).unwrap();
        let finder = finder();
        let calculator = ParSpreadMarketQuoteCalculator;

        let err = StageCalibrator::new(&finder, &calculator, &calculator)
            .make_unit(0, &layout, &CurveSet::new(), &CurveRoleMap::new())
            .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("base curve USD-OIS"));
    }

    #[test]
    fn test_pricing_error_is_reported_as_curve_error() {
        // No curve discounts EUR, so every residual evaluation fails.
        let stage = Stage::single(StageCurve::with_flat_guess(
            "USD-OIS",
            CurveGenerator::InterpolatedOnInstruments,
            vec![Deposit::new("EUR", 0.0, 1.0, 0.03).into()],
            0.02,
        ));
        let layout = StageLayout::flatten(&stage).unwrap();
        let finder = finder();
        let calculator = ParSpreadMarketQuoteCalculator;

        let err = StageCalibrator::new(&finder, &calculator, &calculator)
            .make_unit(0, &layout, &CurveSet::new(), &roles())
            .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::Curve(CurveError::NoCurveForRole { .. })
        ));
    }

    #[test]
    fn test_iteration_cap_reported_with_stage() {
        let stage = Stage::single(StageCurve::with_flat_guess(
            "USD-OIS",
            CurveGenerator::InterpolatedOnInstruments,
            ois_instruments(),
            0.5,
        ));
        let layout = StageLayout::flatten(&stage).unwrap();
        let finder = NewtonVectorRootFinder::new(VectorRootFinderConfig::new(1e-12, 1e-12, 1));
        let calculator = ParSpreadMarketQuoteCalculator;

        let err = StageCalibrator::new(&finder, &calculator, &calculator)
            .make_unit(2, &layout, &CurveSet::new(), &roles())
            .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::ConvergenceFailure { stage: 2, iterations: 1, .. }
        ));
    }
}
