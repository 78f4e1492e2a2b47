//! Calibration instruments.
//!
//! Each instrument prices off a [`CurveSet`] through its role maps and reports
//! both its par rate and its unit-notional present value, together with the
//! analytic point sensitivities of each.
//!
//! # Available Instruments
//!
//! - [`Deposit`]: Money market deposit on the discounting curve
//! - [`Fra`]: Forward rate agreement on an IBOR projection curve
//! - [`Swap`]: Fixed vs floating swap; OIS when the floating index is overnight
//! - [`ZeroCouponBond`]: Issuer zero coupon bond quoted by yield
//!
//! Rates are continuously compounded on the curve side and simply compounded
//! on the instrument side; times are year fractions from the valuation date.

mod bond;
mod deposit;
mod fra;
mod swap;

pub use bond::ZeroCouponBond;
pub use deposit::Deposit;
pub use fra::Fra;
pub use swap::Swap;

use serde::{Deserialize, Serialize};

use crate::error::{CurveError, CurveResult};
use crate::multicurve::CurveSet;
use crate::sensitivity::PointSensitivities;

/// Latest time, in years, an instrument may touch.
pub const MAX_TIME: f64 = 100.0;

/// Highest payment frequency per year of a swap leg.
pub const MAX_FREQUENCY: u32 = 365;

fn within_horizon(t: f64) -> bool {
    t.is_finite() && t <= MAX_TIME
}

/// The index paid by a floating leg.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FloatingIndex {
    /// Term rate index, projected by the IBOR curve map.
    Ibor(String),
    /// Overnight index, projected by the overnight curve map.
    Overnight(String),
}

impl FloatingIndex {
    /// Returns the index name.
    pub fn name(&self) -> &str {
        match self {
            Self::Ibor(name) | Self::Overnight(name) => name,
        }
    }

    /// Resolves the projection curve for this index.
    pub fn curve_name<'a>(&self, curves: &'a CurveSet) -> CurveResult<&'a str> {
        match self {
            Self::Ibor(name) => curves.ibor_curve_name(name),
            Self::Overnight(name) => curves.overnight_curve_name(name),
        }
    }
}

impl std::fmt::Display for FloatingIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ibor(name) => write!(f, "{name}"),
            Self::Overnight(name) => write!(f, "{name} (ON)"),
        }
    }
}

/// A calibration instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Instrument {
    /// Money market deposit.
    Deposit(Deposit),
    /// Forward rate agreement.
    Fra(Fra),
    /// Interest rate swap or OIS.
    Swap(Swap),
    /// Issuer zero coupon bond.
    ZeroCouponBond(ZeroCouponBond),
}

impl Instrument {
    /// Market quote: a rate for deposits, FRAs and swaps, a yield for bonds.
    pub fn quote(&self) -> f64 {
        match self {
            Self::Deposit(i) => i.rate(),
            Self::Fra(i) => i.rate(),
            Self::Swap(i) => i.rate(),
            Self::ZeroCouponBond(i) => i.yield_rate(),
        }
    }

    /// Returns a copy with the market quote replaced.
    #[must_use]
    pub fn with_quote(&self, quote: f64) -> Self {
        match self {
            Self::Deposit(i) => Self::Deposit(i.clone().with_rate(quote)),
            Self::Fra(i) => Self::Fra(i.clone().with_rate(quote)),
            Self::Swap(i) => Self::Swap(i.clone().with_rate(quote)),
            Self::ZeroCouponBond(i) => Self::ZeroCouponBond(i.clone().with_yield(quote)),
        }
    }

    /// Final time touched by the instrument.
    pub fn maturity(&self) -> f64 {
        match self {
            Self::Deposit(i) => i.end(),
            Self::Fra(i) => i.end(),
            Self::Swap(i) => i.maturity(),
            Self::ZeroCouponBond(i) => i.maturity(),
        }
    }

    /// Short human-readable description.
    pub fn label(&self) -> String {
        match self {
            Self::Deposit(i) => format!("Deposit {} {:.4}Y", i.currency(), i.end()),
            Self::Fra(i) => format!("FRA {} {:.4}x{:.4}", i.index(), i.start(), i.end()),
            Self::Swap(i) => format!("Swap {} {} {:.4}Y", i.currency(), i.floating(), i.maturity()),
            Self::ZeroCouponBond(i) => format!("Zero {} {:.4}Y", i.issuer(), i.maturity()),
        }
    }

    /// Checks the instrument's schedule.
    ///
    /// Times must be finite and no later than [`MAX_TIME`]; swap frequencies
    /// must lie in `1..=`[`MAX_FREQUENCY`].
    pub fn validate(&self) -> CurveResult<()> {
        let period = |start: f64, end: f64| start >= 0.0 && end > start && within_horizon(end);
        let frequency = |f: u32| (1..=MAX_FREQUENCY).contains(&f);
        let ok = match self {
            Self::Deposit(i) => period(i.start(), i.end()),
            Self::Fra(i) => period(i.start(), i.end()),
            Self::Swap(i) => {
                period(0.0, i.maturity())
                    && frequency(i.fixed_frequency())
                    && frequency(i.floating_frequency())
            }
            Self::ZeroCouponBond(i) => period(0.0, i.maturity()),
        };
        if !ok || !self.quote().is_finite() {
            return Err(CurveError::invalid_instrument(format!(
                "{} has an invalid schedule or quote",
                self.label()
            )));
        }
        Ok(())
    }

    /// Rate that sets the instrument's value to zero.
    pub fn par_rate(&self, curves: &CurveSet) -> CurveResult<f64> {
        match self {
            Self::Deposit(i) => i.par_rate(curves),
            Self::Fra(i) => i.par_rate(curves),
            Self::Swap(i) => i.par_rate(curves),
            Self::ZeroCouponBond(i) => i.par_rate(curves),
        }
    }

    /// Point sensitivities of the par rate.
    pub fn par_rate_sensitivity(&self, curves: &CurveSet) -> CurveResult<PointSensitivities> {
        match self {
            Self::Deposit(i) => i.par_rate_sensitivity(curves),
            Self::Fra(i) => i.par_rate_sensitivity(curves),
            Self::Swap(i) => i.par_rate_sensitivity(curves),
            Self::ZeroCouponBond(i) => i.par_rate_sensitivity(curves),
        }
    }

    /// Present value for a unit notional at the quoted rate.
    pub fn present_value(&self, curves: &CurveSet) -> CurveResult<f64> {
        match self {
            Self::Deposit(i) => i.present_value(curves),
            Self::Fra(i) => i.present_value(curves),
            Self::Swap(i) => i.present_value(curves),
            Self::ZeroCouponBond(i) => i.present_value(curves),
        }
    }

    /// Point sensitivities of the present value.
    pub fn present_value_sensitivity(&self, curves: &CurveSet) -> CurveResult<PointSensitivities> {
        match self {
            Self::Deposit(i) => i.present_value_sensitivity(curves),
            Self::Fra(i) => i.present_value_sensitivity(curves),
            Self::Swap(i) => i.present_value_sensitivity(curves),
            Self::ZeroCouponBond(i) => i.present_value_sensitivity(curves),
        }
    }
}

impl From<Deposit> for Instrument {
    fn from(i: Deposit) -> Self {
        Self::Deposit(i)
    }
}

impl From<Fra> for Instrument {
    fn from(i: Fra) -> Self {
        Self::Fra(i)
    }
}

impl From<Swap> for Instrument {
    fn from(i: Swap) -> Self {
        Self::Swap(i)
    }
}

impl From<ZeroCouponBond> for Instrument {
    fn from(i: ZeroCouponBond) -> Self {
        Self::ZeroCouponBond(i)
    }
}

/// Growth factor `DF(start)/DF(end)` of a curve over a period.
pub(crate) fn growth(curves: &CurveSet, curve: &str, start: f64, end: f64) -> CurveResult<f64> {
    Ok(curves.discount_factor(curve, start)? / curves.discount_factor(curve, end)?)
}

/// Adds the sensitivities of `growth(curve, start, end)` scaled by `factor`.
///
/// `∂g/∂r(end) = g·end`, `∂g/∂r(start) = -g·start`.
pub(crate) fn add_growth_sensitivity(
    point: &mut PointSensitivities,
    curve: &str,
    start: f64,
    end: f64,
    growth: f64,
    factor: f64,
) {
    if start > 0.0 {
        point.add(curve, start, -factor * growth * start);
    }
    point.add(curve, end, factor * growth * end);
}
