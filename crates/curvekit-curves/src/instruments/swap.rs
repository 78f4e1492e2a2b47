//! Fixed vs floating interest rate swap.

use serde::{Deserialize, Serialize};

use super::{add_growth_sensitivity, growth, FloatingIndex, MAX_FREQUENCY, MAX_TIME};
use crate::error::{CurveError, CurveResult};
use crate::multicurve::CurveSet;
use crate::sensitivity::PointSensitivities;

/// A spot-starting swap exchanging a fixed rate against a floating index.
///
/// Both legs are discounted on the currency curve. Floating coupons are
/// projected on the index curve, which may be the discounting curve itself.
/// With an overnight index this is an OIS: the compounded overnight rate over
/// a period equals the simple forward of the projection curve.
///
/// # Pricing Formula
///
/// ```text
/// A   = Σ_i α_i DF_D(t_i)                        (fixed leg annuity)
/// P   = Σ_j (DF_F(u_{j-1}) / DF_F(u_j) - 1) DF_D(u_j)   (floating leg)
/// par = P / A
/// PV  = P - rate × A                               (pay fixed)
/// ```
///
/// Payment periods are equal fractions of the maturity, `round(maturity ×
/// frequency)` of them per leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Swap {
    currency: String,
    floating: FloatingIndex,
    maturity: f64,
    fixed_frequency: u32,
    floating_frequency: u32,
    rate: f64,
}

impl Swap {
    /// Creates a new swap.
    ///
    /// # Arguments
    ///
    /// * `currency` - Currency, used to look up the discounting curve
    /// * `floating` - Floating leg index
    /// * `maturity` - Maturity in years
    /// * `fixed_frequency` - Fixed payments per year
    /// * `floating_frequency` - Floating payments per year
    /// * `rate` - Fixed rate
    #[must_use]
    pub fn new(
        currency: impl Into<String>,
        floating: FloatingIndex,
        maturity: f64,
        fixed_frequency: u32,
        floating_frequency: u32,
        rate: f64,
    ) -> Self {
        Self {
            currency: currency.into(),
            floating,
            maturity,
            fixed_frequency,
            floating_frequency,
            rate,
        }
    }

    /// Creates an overnight index swap with annual payments on both legs.
    #[must_use]
    pub fn ois(currency: impl Into<String>, index: impl Into<String>, maturity: f64, rate: f64) -> Self {
        Self::new(currency, FloatingIndex::Overnight(index.into()), maturity, 1, 1, rate)
    }

    /// Returns a copy with a different fixed rate.
    #[must_use]
    pub fn with_rate(mut self, rate: f64) -> Self {
        self.rate = rate;
        self
    }

    /// Returns the currency.
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Returns the floating index.
    pub fn floating(&self) -> &FloatingIndex {
        &self.floating
    }

    /// Returns the maturity.
    pub fn maturity(&self) -> f64 {
        self.maturity
    }

    /// Fixed payments per year.
    pub fn fixed_frequency(&self) -> u32 {
        self.fixed_frequency
    }

    /// Floating payments per year.
    pub fn floating_frequency(&self) -> u32 {
        self.floating_frequency
    }

    /// Returns the fixed rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Payment times of the fixed leg.
    pub fn fixed_schedule(&self) -> CurveResult<Vec<f64>> {
        schedule(self.maturity, self.fixed_frequency)
    }

    /// Payment times of the floating leg.
    pub fn floating_schedule(&self) -> CurveResult<Vec<f64>> {
        schedule(self.maturity, self.floating_frequency)
    }

    fn annuity(&self, curves: &CurveSet, discount: &str) -> CurveResult<f64> {
        let mut annuity = 0.0;
        let mut previous = 0.0;
        for t in self.fixed_schedule()? {
            annuity += (t - previous) * curves.discount_factor(discount, t)?;
            previous = t;
        }
        Ok(annuity)
    }

    fn floating_leg(&self, curves: &CurveSet, discount: &str, projection: &str) -> CurveResult<f64> {
        let mut leg = 0.0;
        let mut previous = 0.0;
        for u in self.floating_schedule()? {
            let g = growth(curves, projection, previous, u)?;
            leg += (g - 1.0) * curves.discount_factor(discount, u)?;
            previous = u;
        }
        Ok(leg)
    }

    /// Fixed rate that sets the swap value to zero.
    pub fn par_rate(&self, curves: &CurveSet) -> CurveResult<f64> {
        let discount = curves.discount_curve_name(&self.currency)?;
        let projection = self.floating.curve_name(curves)?;
        Ok(self.floating_leg(curves, discount, projection)? / self.annuity(curves, discount)?)
    }

    /// Point sensitivities of [`par_rate`](Self::par_rate).
    pub fn par_rate_sensitivity(&self, curves: &CurveSet) -> CurveResult<PointSensitivities> {
        let discount = curves.discount_curve_name(&self.currency)?;
        let projection = self.floating.curve_name(curves)?;
        let annuity = self.annuity(curves, discount)?;
        let leg = self.floating_leg(curves, discount, projection)?;

        let mut point = PointSensitivities::new();
        self.add_fixed_sensitivity(&mut point, curves, discount, leg / (annuity * annuity))?;
        self.add_floating_sensitivity(&mut point, curves, discount, projection, 1.0 / annuity)?;
        Ok(point)
    }

    /// Present value for a unit notional, paying fixed.
    pub fn present_value(&self, curves: &CurveSet) -> CurveResult<f64> {
        let discount = curves.discount_curve_name(&self.currency)?;
        let projection = self.floating.curve_name(curves)?;
        Ok(self.floating_leg(curves, discount, projection)?
            - self.rate * self.annuity(curves, discount)?)
    }

    /// Point sensitivities of [`present_value`](Self::present_value).
    pub fn present_value_sensitivity(&self, curves: &CurveSet) -> CurveResult<PointSensitivities> {
        let discount = curves.discount_curve_name(&self.currency)?;
        let projection = self.floating.curve_name(curves)?;

        let mut point = PointSensitivities::new();
        self.add_fixed_sensitivity(&mut point, curves, discount, self.rate)?;
        self.add_floating_sensitivity(&mut point, curves, discount, projection, 1.0)?;
        Ok(point)
    }

    /// Adds `-factor × ∂A/∂r_D`, i.e. `factor × α_i t_i DF_D(t_i)` per payment.
    fn add_fixed_sensitivity(
        &self,
        point: &mut PointSensitivities,
        curves: &CurveSet,
        discount: &str,
        factor: f64,
    ) -> CurveResult<()> {
        let mut previous = 0.0;
        for t in self.fixed_schedule()? {
            let df = curves.discount_factor(discount, t)?;
            point.add(discount, t, factor * (t - previous) * t * df);
            previous = t;
        }
        Ok(())
    }

    /// Adds `factor × ∂P` with respect to both the discounting and the
    /// projection curve.
    fn add_floating_sensitivity(
        &self,
        point: &mut PointSensitivities,
        curves: &CurveSet,
        discount: &str,
        projection: &str,
        factor: f64,
    ) -> CurveResult<()> {
        let mut previous = 0.0;
        for u in self.floating_schedule()? {
            let df = curves.discount_factor(discount, u)?;
            let g = growth(curves, projection, previous, u)?;
            point.add(discount, u, -factor * (g - 1.0) * u * df);
            add_growth_sensitivity(point, projection, previous, u, g, factor * df);
            previous = u;
        }
        Ok(())
    }
}

fn schedule(maturity: f64, frequency: u32) -> CurveResult<Vec<f64>> {
    let periods = (maturity * f64::from(frequency)).round().max(1.0);
    let limit = MAX_TIME * f64::from(MAX_FREQUENCY);
    if !(maturity > 0.0 && periods.is_finite() && periods <= limit) {
        return Err(CurveError::invalid_instrument(format!(
            "swap of maturity {maturity} paying {frequency} times a year has no usable schedule"
        )));
    }
    // Bounded above, so the cast is exact.
    let periods = periods as usize;
    Ok((1..=periods)
        .map(|i| maturity * i as f64 / periods as f64)
        .collect())
}
