//! Forward rate agreement.

use serde::{Deserialize, Serialize};

use super::{add_growth_sensitivity, growth};
use crate::error::CurveResult;
use crate::multicurve::CurveSet;
use crate::sensitivity::PointSensitivities;

/// A forward rate agreement on an IBOR index.
///
/// The forward is projected on the index curve and the settlement amount is
/// discounted on the currency curve.
///
/// ```text
/// F   = (DF_I(start) / DF_I(end) - 1) / τ
/// PV  = DF_D(end) × τ × (F - rate)
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fra {
    currency: String,
    index: String,
    start: f64,
    end: f64,
    rate: f64,
}

impl Fra {
    /// Creates a new FRA.
    #[must_use]
    pub fn new(
        currency: impl Into<String>,
        index: impl Into<String>,
        start: f64,
        end: f64,
        rate: f64,
    ) -> Self {
        Self {
            currency: currency.into(),
            index: index.into(),
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

    /// Returns the IBOR index name.
    pub fn index(&self) -> &str {
        &self.index
    }

    /// Returns the fixing period start.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Returns the fixing period end.
    pub fn end(&self) -> f64 {
        self.end
    }

    /// Returns the FRA rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Accrual period.
    pub fn accrual(&self) -> f64 {
        self.end - self.start
    }

    /// Forward rate projected on the index curve.
    pub fn par_rate(&self, curves: &CurveSet) -> CurveResult<f64> {
        let curve = curves.ibor_curve_name(&self.index)?;
        let g = growth(curves, curve, self.start, self.end)?;
        Ok((g - 1.0) / self.accrual())
    }

    /// Point sensitivities of [`par_rate`](Self::par_rate).
    pub fn par_rate_sensitivity(&self, curves: &CurveSet) -> CurveResult<PointSensitivities> {
        let curve = curves.ibor_curve_name(&self.index)?;
        let g = growth(curves, curve, self.start, self.end)?;
        let mut point = PointSensitivities::new();
        add_growth_sensitivity(&mut point, curve, self.start, self.end, g, 1.0 / self.accrual());
        Ok(point)
    }

    /// Present value for a unit notional, paying the FRA rate.
    pub fn present_value(&self, curves: &CurveSet) -> CurveResult<f64> {
        let discount = curves.discount_curve_name(&self.currency)?;
        let df_end = curves.discount_factor(discount, self.end)?;
        Ok(df_end * self.accrual() * (self.par_rate(curves)? - self.rate))
    }

    /// Point sensitivities of [`present_value`](Self::present_value).
    pub fn present_value_sensitivity(&self, curves: &CurveSet) -> CurveResult<PointSensitivities> {
        let discount = curves.discount_curve_name(&self.currency)?;
        let df_end = curves.discount_factor(discount, self.end)?;
        let tau = self.accrual();
        let forward = self.par_rate(curves)?;

        let mut point = self.par_rate_sensitivity(curves)?.scaled(df_end * tau);
        point.add(discount, self.end, -self.end * df_end * tau * (forward - self.rate));
        Ok(point)
    }
}
