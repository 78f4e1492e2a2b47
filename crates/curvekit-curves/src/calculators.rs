//! Residual and sensitivity calculators used by calibration.
//!
//! A calibration stage solves `residual(instrument_i, curves) = 0` for every
//! instrument of the stage. The residual calculator chooses what "zero"
//! means; the sensitivity calculator supplies its analytic derivative with
//! respect to the zero rates of the curves involved.

use crate::error::CurveResult;
use crate::instruments::Instrument;
use crate::multicurve::CurveSet;
use crate::sensitivity::PointSensitivities;

/// Computes the calibration residual of an instrument.
pub trait ResidualCalculator: Send + Sync {
    /// Residual of `instrument` against `curves`; zero when calibrated.
    fn residual(&self, instrument: &Instrument, curves: &CurveSet) -> CurveResult<f64>;

    /// Returns the name of the calculator.
    fn name(&self) -> &'static str;
}

/// Computes the point sensitivities of a calibration residual.
pub trait SensitivityCalculator: Send + Sync {
    /// ∂residual/∂r for every curve point the instrument touches.
    fn point_sensitivity(
        &self,
        instrument: &Instrument,
        curves: &CurveSet,
    ) -> CurveResult<PointSensitivities>;
}

/// Residual = model par rate − market quote.
///
/// Residuals are in rate units for every instrument type, which keeps the
/// stage Jacobian well scaled. This is the recommended calculator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParSpreadMarketQuoteCalculator;

impl ResidualCalculator for ParSpreadMarketQuoteCalculator {
    fn residual(&self, instrument: &Instrument, curves: &CurveSet) -> CurveResult<f64> {
        Ok(instrument.par_rate(curves)? - instrument.quote())
    }

    fn name(&self) -> &'static str {
        "ParSpreadMarketQuote"
    }
}

impl SensitivityCalculator for ParSpreadMarketQuoteCalculator {
    fn point_sensitivity(
        &self,
        instrument: &Instrument,
        curves: &CurveSet,
    ) -> CurveResult<PointSensitivities> {
        instrument.par_rate_sensitivity(curves)
    }
}

/// Residual = unit-notional present value at the quoted rate.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentValueCalculator;

impl ResidualCalculator for PresentValueCalculator {
    fn residual(&self, instrument: &Instrument, curves: &CurveSet) -> CurveResult<f64> {
        instrument.present_value(curves)
    }

    fn name(&self) -> &'static str {
        "PresentValue"
    }
}

impl SensitivityCalculator for PresentValueCalculator {
    fn point_sensitivity(
        &self,
        instrument: &Instrument,
        curves: &CurveSet,
    ) -> CurveResult<PointSensitivities> {
        instrument.present_value_sensitivity(curves)
    }
}
