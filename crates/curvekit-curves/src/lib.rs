//! # Curvekit Curves
//!
//! Curves and market instruments for the Curvekit calibration engine.
//!
//! This crate provides:
//!
//! - **Curves**: Interpolated zero-rate curves and spread curves over a base
//! - **Generators**: Recipes that turn a raw parameter vector into a curve
//! - **Curve Sets**: Immutable, name-keyed snapshots with currency, index and
//!   issuer role maps
//! - **Instruments**: Deposits, FRAs, swaps (IBOR and OIS) and issuer zero
//!   coupon bonds, priced off a curve set
//! - **Calculators**: Residuals and analytic point sensitivities, converted to
//!   sensitivities with respect to curve parameters
//!
//! Rates are continuously compounded zero rates and times are year fractions.
//!
//! ## Quick Start
//!
//! ```rust
//! use curvekit_curves::prelude::*;
//!
//! let ois = Curve::Interpolated(
//!     InterpolatedCurve::new("USD-OIS", vec![1.0, 5.0], vec![0.03, 0.035]).unwrap(),
//! );
//! let curves = CurveSet::new()
//!     .with_curves(vec![ois], &CurveRoleMap::new().with("USD-OIS", CurveRoles::new().discounting("USD")))
//!     .unwrap();
//!
//! let deposit = Instrument::Deposit(Deposit::new("USD", 0.0, 1.0, 0.03));
//! let par = deposit.par_rate(&curves).unwrap();
//! assert!((par - ((0.03_f64).exp() - 1.0)).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::similar_names)]

pub mod calculators;
pub mod curves;
pub mod error;
pub mod generator;
pub mod instruments;
pub mod multicurve;
pub mod sensitivity;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::calculators::{
        ParSpreadMarketQuoteCalculator, PresentValueCalculator, ResidualCalculator,
        SensitivityCalculator,
    };
    pub use crate::curves::{Curve, InterpolatedCurve, SpreadCurve};
    pub use crate::error::{CurveError, CurveResult};
    pub use crate::generator::CurveGenerator;
    pub use crate::instruments::{
        Deposit, FloatingIndex, Fra, Instrument, Swap, ZeroCouponBond,
    };
    pub use crate::multicurve::{CurveRoleMap, CurveRoles, CurveSet};
    pub use crate::sensitivity::{parameter_sensitivity, PointSensitivities};
}

pub use calculators::{ParSpreadMarketQuoteCalculator, PresentValueCalculator};
pub use curves::{Curve, InterpolatedCurve, SpreadCurve};
pub use error::{CurveError, CurveResult};
pub use generator::CurveGenerator;
pub use instruments::{Deposit, FloatingIndex, Fra, Instrument, Swap, ZeroCouponBond};
pub use multicurve::{CurveRoleMap, CurveRoles, CurveSet};
