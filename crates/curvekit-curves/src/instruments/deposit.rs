//! Money market deposit.

use serde::{Deserialize, Serialize};

use super::{add_growth_sensitivity, growth};
use crate::error::CurveResult;
use crate::multicurve::CurveSet;
use crate::sensitivity::PointSensitivities;

/// A money market deposit, priced off the currency's discounting curve.
///
/// # Pricing Formula
///
/// The present value is zero when:
/// ```text
/// DF(end) × (1 + rate × τ) = DF(start)
/// ```
/// with `τ = end - start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deposit {
    currency: String,
    start: f64,
    end: f64,
    rate: f64,
}

impl Deposit {
    /// Creates a new deposit.
    ///
    /// # Arguments
    ///
    /// * `currency` - Currency, used to look up the discounting curve
    /// * `start` - Start time in years
    /// * `end` - Maturity in years
    /// * `rate` - Simple interest rate
    #[must_use]
    pub fn new(currency: impl Into<String>, start: f64, end: f64, rate: f64) -> Self {
        Self {
            currency: currency.into(),
            start,
            end,
            rate,
        }
    }

    /// Returns a copy with a different rate.
    #[must_use]
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Returns the currency.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Returns the start time.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Returns the end time.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Returns the deposit rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Accrual period.
    pub fn accrual(&self) -> f64 {
        self.end - self.start
    }

    /// Rate implied by the discounting curve.
    pub fn par_rate(&self, curves: &CurveSet) -> CurveResult<f64> {
        let curve = curves.discount_curve_name(&self.currency)?;
        let g = growth(curves, curve, self.start, self.end)?;
        Ok((g - 1.0) / self.accrual())
    }

    /// Point sensitivities of [`par_rate`](Self::par_rate).
    pub fn par_rate_sensitivity(&self, curves: &CurveSet) -> CurveResult<PointSensitivities> {
        let curve = curves.discount_curve_name(&self.currency)?;
        let g = growth(curves, curve, self.start, self.end)?;
        let mut point = PointSensitivities::new();
        add_growth_sensitivity(&mut point, curve, self.start, self.end, g, 1.0 / self.accrual());
        Ok(point)
    }

    /// Present value of lending one unit at `start`.
    pub fn present_value(&self, curves: &CurveSet) -> CurveResult<f64> {
        let curve = curves.discount_curve_name(&self.currency)?;
        let df_start = curves.discount_factor(curve, self.start)?;
        let df_end = curves.discount_factor(curve, self.end)?;
        Ok(df_end * (1.0 + self.rate * self.accrual()) - df_start)
    }

    /// Point sensitivities of [`present_value`](Self::present_value).
    pub fn present_value_sensitivity(&self, curves: &CurveSet) -> CurveResult<PointSensitivities> {
        let curve = curves.discount_curve_name(&self.currency)?;
        let df_start = curves.discount_factor(curve, self.start)?;
        let df_end = curves.discount_factor(curve, self.end)?;
        let mut point = PointSensitivities::new();
        if self.start > 0.0 {
            point.add(curve, self.start, self.start * df_start);
        }
        point.add(
            curve,
            self.end,
            -self.end * df_end * (1.0 + self.rate * self.accrual()),
        );
        Ok(point)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruments::test_support::{check_against_bumps, usd_curves};
    use crate::instruments::Instrument;
    use approx::assert_relative_eq;

    #[test]
    fn test_par_rate_zeroes_present_value() {
        let curves = usd_curves();
        let deposit = Deposit::new("USD", 0.0, 0.75, 0.0);
        let par = deposit.par_rate(&curves).unwrap();

        let at_par = deposit.with_rate(par);
        assert_relative_eq!(at_par.present_value(&curves).unwrap(), 0.0, epsilon = 1e-14);
    }

    #[test]
    fn test_sensitivities_match_bumps() {
        let curves = usd_curves();
        let forward_start: Instrument = Deposit::new("USD", 0.25, 1.5, 0.031).into();

        check_against_bumps(
            &forward_start,
            &curves,
            |i, c| i.par_rate(c).unwrap(),
            |i, c| i.par_rate_sensitivity(c).unwrap(),
        );
        check_against_bumps(
            &forward_start,
            &curves,
            |i, c| i.present_value(c).unwrap(),
            |i, c| i.present_value_sensitivity(c).unwrap(),
        );
    }

    #[test]
    fn test_unknown_currency() {
        let curves = usd_curves();
        assert!(Deposit::new("EUR", 0.0, 1.0, 0.01).par_rate(&curves).is_err());
    }
}
