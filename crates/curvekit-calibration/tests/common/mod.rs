//! Shared market setup for the calibration integration tests.
//!
//! Quotes are generated from known "true" curves, so a successful
//! calibration must recover the true node rates.

#![allow(dead_code)]

use curvekit_calibration::prelude::*;
use curvekit_curves::{
    CurveGenerator, CurveRoleMap, CurveRoles, CurveSet, Deposit, FloatingIndex, Fra,
    InterpolatedCurve, Instrument, SpreadCurve, Swap, ZeroCouponBond,
};
use tracing_subscriber::EnvFilter;

pub const OIS: &str = "USD-OIS";
pub const LIBOR: &str = "USD-3M";
pub const ISSUER: &str = "ACME";

pub const OIS_TIMES: [f64; 4] = [0.5, 1.0, 2.0, 5.0];
pub const OIS_RATES: [f64; 4] = [0.030, 0.031, 0.033, 0.036];
pub const LIBOR_TIMES: [f64; 3] = [1.0, 2.0, 5.0];
pub const LIBOR_RATES: [f64; 3] = [0.034, 0.036, 0.039];
pub const ISSUER_TIMES: [f64; 2] = [1.0, 5.0];
pub const ISSUER_SPREADS: [f64; 2] = [0.010, 0.015];

/// Installs a test subscriber; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn roles() -> CurveRoleMap {
    CurveRoleMap::new()
        .with(OIS, CurveRoles::new().discounting("USD").overnight("USD-SOFR"))
        .with(LIBOR, CurveRoles::new().ibor("USD-LIBOR-3M"))
        .with(ISSUER, CurveRoles::new().issuer("ACME"))
}

/// The curves the market quotes are generated from.
pub fn true_curves() -> CurveSet {
    let ois = InterpolatedCurve::new(OIS, OIS_TIMES.to_vec(), OIS_RATES.to_vec()).unwrap();
    let libor = InterpolatedCurve::new(LIBOR, LIBOR_TIMES.to_vec(), LIBOR_RATES.to_vec()).unwrap();
    let issuer = SpreadCurve::new(ISSUER, OIS, ISSUER_TIMES.to_vec(), ISSUER_SPREADS.to_vec()).unwrap();
    CurveSet::new()
        .with_curves(vec![ois.into(), libor.into(), issuer.into()], &roles())
        .unwrap()
}

/// Sets every instrument's quote to its par rate on the true curves.
fn quoted(instruments: Vec<Instrument>) -> Vec<Instrument> {
    let curves = true_curves();
    instruments
        .into_iter()
        .map(|i| {
            let par = i.par_rate(&curves).unwrap();
            i.with_quote(par)
        })
        .collect()
}

pub fn ois_instruments() -> Vec<Instrument> {
    quoted(vec![
        Deposit::new("USD", 0.0, 0.5, 0.0).into(),
        Swap::ois("USD", "USD-SOFR", 1.0, 0.0).into(),
        Swap::ois("USD", "USD-SOFR", 2.0, 0.0).into(),
        Swap::ois("USD", "USD-SOFR", 5.0, 0.0).into(),
    ])
}

pub fn libor_instruments() -> Vec<Instrument> {
    let index = FloatingIndex::Ibor("USD-LIBOR-3M".to_string());
    quoted(vec![
        Fra::new("USD", "USD-LIBOR-3M", 0.75, 1.0, 0.0).into(),
        Swap::new("USD", index.clone(), 2.0, 1, 4, 0.0).into(),
        Swap::new("USD", index, 5.0, 1, 4, 0.0).into(),
    ])
}

pub fn issuer_instruments() -> Vec<Instrument> {
    quoted(vec![
        ZeroCouponBond::new("ACME", 1.0, 0.0).into(),
        ZeroCouponBond::new("ACME", 5.0, 0.0).into(),
    ])
}

pub fn ois_stage() -> Stage {
    Stage::single(StageCurve::with_flat_guess(
        OIS,
        CurveGenerator::InterpolatedOnInstruments,
        ois_instruments(),
        0.02,
    ))
}

pub fn libor_stage() -> Stage {
    Stage::single(StageCurve::with_flat_guess(
        LIBOR,
        CurveGenerator::InterpolatedOnInstruments,
        libor_instruments(),
        0.02,
    ))
}

pub fn issuer_stage() -> Stage {
    Stage::single(StageCurve::new(
        ISSUER,
        CurveGenerator::spread(OIS, ISSUER_TIMES.to_vec()),
        issuer_instruments(),
        vec![0.0; 2],
    ))
}

/// Discounting, then projection, then issuer spread.
pub fn three_stage_request() -> CalibrationRequest {
    CalibrationRequest::new(vec![ois_stage(), libor_stage(), issuer_stage()]).with_roles(roles())
}

/// Tight tolerances so finite differences of calibrated parameters are
/// dominated by the bump, not by solver noise.
pub fn tight_calibrator(kind: RootFinderKind) -> CurveCalibrator {
    CurveCalibrator::new(
        CalibrationConfig::new()
            .with_absolute_tolerance(1e-13)
            .with_relative_tolerance(1e-13)
            .with_root_finder(kind),
    )
    .unwrap()
}

/// Copy of `request` with one quote shifted.
pub fn bump_quote(
    request: &CalibrationRequest,
    stage: usize,
    curve: usize,
    instrument: usize,
    shift: f64,
) -> CalibrationRequest {
    let mut bumped = request.clone();
    let target = &mut bumped.stages[stage].curves[curve].instruments[instrument];
    *target = target.with_quote(target.quote() + shift);
    bumped
}

/// Calibrated parameters of a curve.
pub fn parameters(outcome: &CalibrationOutcome, name: &str) -> Vec<f64> {
    outcome.curves.curve(name).unwrap().parameters().to_vec()
}
