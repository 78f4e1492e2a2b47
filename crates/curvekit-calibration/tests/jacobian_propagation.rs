//! Integration tests: stored inverse Jacobians and their propagation.

mod common;

use approx::assert_relative_eq;
use common::*;
use curvekit_calibration::prelude::*;
use curvekit_curves::calculators::SensitivityCalculator;
use curvekit_curves::sensitivity::parameter_sensitivity;
use curvekit_curves::{CurveGenerator, ParSpreadMarketQuoteCalculator};
use nalgebra::DMatrix;

fn calibrated() -> CalibrationOutcome {
    tight_calibrator(RootFinderKind::Newton)
        .calibrate_par_spread(&three_stage_request())
        .unwrap()
}

// =============================================================================
// BLOCK LAYOUT
// =============================================================================

#[test]
fn test_block_columns_partition_quotes() {
    let outcome = calibrated();
    assert_eq!(outcome.blocks.names(), [OIS, LIBOR, ISSUER]);

    for (name, entry) in outcome.blocks.iter() {
        let block = entry.block();
        let mut next = 0;
        for (_, range) in block.iter() {
            assert_eq!(range.start, next);
            next = range.end();
        }
        assert_eq!(next, block.total_parameters());
        assert_eq!(entry.matrix().ncols(), block.total_parameters());
        assert_eq!(
            Some(entry.matrix().nrows()),
            block.len(name),
            "rows of {name}"
        );
    }

    let issuer = outcome.blocks.block(ISSUER).unwrap().block();
    assert_eq!(issuer.range(OIS), Some(BlockRange::new(0, 4)));
    assert_eq!(issuer.range(LIBOR), Some(BlockRange::new(4, 3)));
    assert_eq!(issuer.range(ISSUER), Some(BlockRange::new(7, 2)));
}

#[test]
fn test_first_stage_block_is_inverse_jacobian() {
    let outcome = calibrated();
    let entry = outcome.blocks.block(OIS).unwrap();
    assert_eq!(entry.block().names().collect::<Vec<_>>(), vec![OIS]);

    let calculator = ParSpreadMarketQuoteCalculator;
    let names = vec![OIS.to_string()];
    let rows: Vec<_> = ois_instruments()
        .iter()
        .map(|i| {
            let point = calculator.point_sensitivity(i, &outcome.curves).unwrap();
            parameter_sensitivity(&point, &outcome.curves, &names).unwrap()
        })
        .collect();
    let jacobian = DMatrix::from_fn(4, 4, |i, j| rows[i][j]);

    let product = entry.matrix() * jacobian;
    let identity = DMatrix::<f64>::identity(4, 4);
    assert!((product - identity).amax() < 1e-10);
}

#[test]
fn test_second_stage_depends_on_discounting_quotes() {
    let outcome = calibrated();
    assert_eq!(outcome.stages[1].before, vec![OIS.to_string()]);
    assert!(outcome.stages[1].dropped_before.is_empty());

    let entry = outcome.blocks.block(LIBOR).unwrap();
    assert_eq!(entry.matrix().shape(), (3, 7));
    let before = entry.matrix().columns(0, 4);
    assert!(before.amax() > 1e-6, "LIBOR curve should react to OIS quotes");
}

#[test]
fn test_earlier_blocks_are_not_rewritten() {
    let calibrator = tight_calibrator(RootFinderKind::Newton);
    let first = calibrator
        .calibrate_par_spread(&CalibrationRequest::new(vec![ois_stage()]).with_roles(roles()))
        .unwrap();
    let full = calibrated();

    assert_eq!(full.blocks.block(OIS), first.blocks.block(OIS));
}

// =============================================================================
// ROUND TRIP: STORED BLOCKS AGAINST RECALIBRATION
// =============================================================================

/// Central difference of a curve's calibrated parameters with respect to
/// one quote.
fn recalibrated_derivative(
    calibrator: &CurveCalibrator,
    request: &CalibrationRequest,
    (stage, instrument): (usize, usize),
    curve: &str,
) -> Vec<f64> {
    let h = 1e-5;
    let up = calibrator
        .calibrate_par_spread(&bump_quote(request, stage, 0, instrument, h))
        .unwrap();
    let down = calibrator
        .calibrate_par_spread(&bump_quote(request, stage, 0, instrument, -h))
        .unwrap();
    parameters(&up, curve)
        .iter()
        .zip(parameters(&down, curve))
        .map(|(u, d)| (u - d) / (2.0 * h))
        .collect()
}

#[test]
fn test_projection_block_matches_recalibration() {
    let calibrator = tight_calibrator(RootFinderKind::Newton);
    let request = three_stage_request();
    let outcome = calibrator.calibrate_par_spread(&request).unwrap();
    let entry = outcome.blocks.block(LIBOR).unwrap();

    let quotes = [(0, 0), (0, 1), (0, 2), (0, 3), (1, 0), (1, 1), (1, 2)];
    for (column, quote) in quotes.into_iter().enumerate() {
        let bumped = recalibrated_derivative(&calibrator, &request, quote, LIBOR);
        for (row, value) in bumped.iter().enumerate() {
            assert_relative_eq!(entry.matrix()[(row, column)], *value, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_issuer_block_matches_recalibration() {
    let calibrator = tight_calibrator(RootFinderKind::Newton);
    let request = three_stage_request();
    let outcome = calibrator.calibrate_par_spread(&request).unwrap();
    let entry = outcome.blocks.block(ISSUER).unwrap();

    // First quote column of each stage.
    let starts = [0, 4, 7];
    for (stage, instrument) in [(0, 1), (0, 3), (1, 1), (2, 0), (2, 1)] {
        let column = starts[stage] + instrument;
        let bumped = recalibrated_derivative(&calibrator, &request, (stage, instrument), ISSUER);
        for (row, value) in bumped.iter().enumerate() {
            assert_relative_eq!(entry.matrix()[(row, column)], *value, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_issuer_spread_offsets_discount_sensitivity() {
    // Issuer nodes sit on discounting nodes 1 and 3, and a bond's par yield
    // is the discount rate plus the spread at the same time.
    let outcome = calibrated();
    let ois = outcome.blocks.block(OIS).unwrap().matrix();
    let issuer = outcome.blocks.block(ISSUER).unwrap().matrix();

    for (row, node) in [(0, 1), (1, 3)] {
        for column in 0..4 {
            assert_relative_eq!(issuer[(row, column)], -ois[(node, column)], epsilon = 1e-10);
        }
        for column in 4..7 {
            assert_relative_eq!(issuer[(row, column)], 0.0, epsilon = 1e-12);
        }
        for column in 7..9 {
            let expected = if column - 7 == row { 1.0 } else { 0.0 };
            assert_relative_eq!(issuer[(row, column)], expected, epsilon = 1e-10);
        }
    }
}

/// Discounting, projection, then an issuer spread over the projection curve.
fn spread_over_projection_request() -> CalibrationRequest {
    let issuer = Stage::single(StageCurve::new(
        ISSUER,
        CurveGenerator::spread(LIBOR, ISSUER_TIMES.to_vec()),
        issuer_instruments(),
        vec![0.0; 2],
    ));
    CalibrationRequest::new(vec![ois_stage(), libor_stage(), issuer]).with_roles(roles())
}

#[test]
fn test_spread_over_projection_chains_through_transition() {
    let calibrator = tight_calibrator(RootFinderKind::Newton);
    let request = spread_over_projection_request();
    let outcome = calibrator.calibrate_par_spread(&request).unwrap();
    let libor = outcome.blocks.block(LIBOR).unwrap().matrix();
    let issuer = outcome.blocks.block(ISSUER).unwrap().matrix();

    // Issuer nodes sit on projection nodes 0 and 2; the discounting quotes
    // reach the spread only through the projection block.
    for (row, node) in [(0, 0), (1, 2)] {
        for column in 0..7 {
            assert_relative_eq!(issuer[(row, column)], -libor[(node, column)], epsilon = 1e-10);
        }
    }
    assert!(issuer.columns(0, 4).amax() > 1e-6, "spread should react to OIS quotes");

    for instrument in 0..4 {
        let bumped = recalibrated_derivative(&calibrator, &request, (0, instrument), ISSUER);
        for (row, value) in bumped.iter().enumerate() {
            assert_relative_eq!(issuer[(row, instrument)], *value, epsilon = 1e-5);
        }
    }
}

// =============================================================================
// CURVES WITHOUT STORED BLOCKS
// =============================================================================

#[test]
fn test_known_curve_without_block_is_reported_and_skipped() {
    init_tracing();
    let calibrator = tight_calibrator(RootFinderKind::Newton);
    let ois_only = calibrator
        .calibrate_par_spread(&CalibrationRequest::new(vec![ois_stage()]).with_roles(roles()))
        .unwrap();

    // Supply the discounting curve without its block.
    let request = CalibrationRequest::new(vec![libor_stage(), issuer_stage()])
        .with_known_curves(ois_only.curves.clone())
        .with_roles(roles());
    let outcome = calibrator.calibrate_par_spread(&request).unwrap();

    let report = &outcome.stages[0];
    assert_eq!(report.dropped_before, vec![OIS.to_string()]);
    assert!(report.before.is_empty());
    assert_eq!(outcome.stages[1].before, vec![LIBOR.to_string()]);
    assert_eq!(outcome.stages[1].dropped_before, vec![OIS.to_string()]);
    assert!(!outcome.blocks.contains(OIS));

    // Without a chain, the projection block is the stage's own inverse Jacobian.
    let libor = outcome.blocks.block(LIBOR).unwrap();
    assert_eq!(libor.block().names().collect::<Vec<_>>(), vec![LIBOR]);
    let full = calibrated();
    let own = full.blocks.block(LIBOR).unwrap().matrix().columns(4, 3).into_owned();
    assert!((libor.matrix() - own).amax() < 1e-8);

    // The issuer spread still calibrates over the fixed discounting curve.
    for (fitted, expected) in parameters(&outcome, ISSUER).iter().zip(ISSUER_SPREADS) {
        assert_relative_eq!(*fitted, expected, epsilon = 1e-9);
    }
    let issuer = outcome.blocks.block(ISSUER).unwrap();
    assert_eq!(issuer.matrix().shape(), (2, 5));
}
