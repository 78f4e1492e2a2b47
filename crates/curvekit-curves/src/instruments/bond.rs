//! Issuer zero coupon bond.

use serde::{Deserialize, Serialize};

use crate::error::CurveResult;
use crate::multicurve::CurveSet;
use crate::sensitivity::PointSensitivities;

/// A zero coupon bond of an issuer, quoted by its continuously compounded
/// yield and priced off the issuer curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZeroCouponBond {
    issuer: String,
    maturity: f64,
    #[serde(rename = "yield")]
    yield_rate: f64,
}

impl ZeroCouponBond {
    /// Creates a new zero coupon bond.
    #[must_use]
    pub fn new(issuer: impl Into<String>, maturity: f64, yield_rate: f64) -> Self {
        Self {
            issuer: issuer.into(),
            maturity,
            yield_rate,
        }
    }

    /// Returns a copy with a different yield.
    #[must_use]
    pub fn with_yield(mut self, yield_rate: f64) -> Self {
        self.yield_rate = yield_rate;
        self
    }

    /// Returns the issuer.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Returns the maturity.
    pub fn maturity(&self) -> f64 {
        self.maturity
    }

    /// Returns the quoted yield.
    pub fn yield_rate(&self) -> f64 {
        self.yield_rate
    }

    /// Yield implied by the issuer curve: its zero rate at maturity.
    pub fn par_rate(&self, curves: &CurveSet) -> CurveResult<f64> {
        let curve = curves.issuer_curve_name(&self.issuer)?;
        curves.zero_rate(curve, self.maturity)
    }

    /// Point sensitivities of [`par_rate`](Self::par_rate).
    pub fn par_rate_sensitivity(&self, curves: &CurveSet) -> CurveResult<PointSensitivities> {
        let curve = curves.issuer_curve_name(&self.issuer)?;
        let mut point = PointSensitivities::new();
        point.add(curve, self.maturity, 1.0);
        Ok(point)
    }

    /// Model price minus quoted price, per unit face.
    pub fn present_value(&self, curves: &CurveSet) -> CurveResult<f64> {
        let curve = curves.issuer_curve_name(&self.issuer)?;
        let df = curves.discount_factor(curve, self.maturity)?;
        Ok(df - (-self.yield_rate * self.maturity).exp())
    }

    /// Point sensitivities of [`present_value`](Self::present_value).
    pub fn present_value_sensitivity(&self, curves: &CurveSet) -> CurveResult<PointSensitivities> {
        let curve = curves.issuer_curve_name(&self.issuer)?;
        let df = curves.discount_factor(curve, self.maturity)?;
        let mut point = PointSensitivities::new();
        point.add(curve, self.maturity, -self.maturity * df);
        Ok(point)
    }
}
