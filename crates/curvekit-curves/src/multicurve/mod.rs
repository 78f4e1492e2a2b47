//! Multi-curve environment.
//!
//! A [`CurveSet`] holds every curve built so far, keyed by name, together with
//! the role maps that tell instruments which curve discounts a currency,
//! projects an index, or prices an issuer's debt.

mod curve_set;
mod roles;

pub use curve_set::CurveSet;
pub use roles::{CurveRoleMap, CurveRoles};
