//! Curve set container.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::curves::Curve;
use crate::error::{CurveError, CurveResult};

use super::roles::{CurveRoleMap, CurveRoles};

/// An immutable snapshot of calibrated curves.
///
/// Curves are kept in insertion order and shared through `Arc`, so cloning a
/// set is cheap. Methods that add curves return a new snapshot and leave the
/// receiver untouched.
///
/// A spread curve's base must already be in the set when the spread curve is
/// added, which keeps the base chain acyclic.
///
/// # Example
///
/// ```rust
/// use curvekit_curves::prelude::*;
///
/// let d = InterpolatedCurve::new("D", vec![1.0, 2.0], vec![0.02, 0.025]).unwrap();
/// let s = SpreadCurve::new("S", "D", vec![2.0], vec![0.01]).unwrap();
/// let roles = CurveRoleMap::new().with("S", CurveRoles::new().issuer("ACME"));
///
/// let curves = CurveSet::new().with_curves(vec![d.into(), s.into()], &roles).unwrap();
///
/// assert_eq!(curves.all_names(), &["D".to_string(), "S".to_string()]);
/// assert!((curves.zero_rate("S", 2.0).unwrap() - 0.035).abs() < 1e-14);
/// assert_eq!(curves.issuer_curve_name("ACME").unwrap(), "S");
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct CurveSet {
    order: Vec<String>,
    curves: HashMap<String, Arc<Curve>>,
    discounting: HashMap<String, String>,
    ibor: HashMap<String, String>,
    overnight: HashMap<String, String>,
    issuers: HashMap<String, String>,
}

impl fmt::Debug for CurveSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurveSet")
            .field("curves", &self.order)
            .field("discounting", &self.discounting)
            .field("ibor", &self.ibor)
            .field("overnight", &self.overnight)
            .field("issuers", &self.issuers)
            .finish()
    }
}

impl CurveSet {
    /// Creates an empty curve set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of this set with `curves` appended and `roles` applied.
    ///
    /// Roles are applied for the new curves only; entries of `roles` naming
    /// other curves are ignored.
    ///
    /// # Errors
    ///
    /// - `InvalidParameters` if a curve name is already present or a role is
    ///   already served by another curve
    /// - `CurveNotFound` if a spread curve's base is neither in the set nor
    ///   earlier in `curves`
    pub fn with_curves(&self, curves: Vec<Curve>, roles: &CurveRoleMap) -> CurveResult<Self> {
        let mut next = self.clone();
        for curve in curves {
            let name = curve.name().to_string();
            next.insert(curve)?;
            if let Some(curve_roles) = roles.roles(&name) {
                next.assign_roles(&name, curve_roles)?;
            }
        }
        Ok(next)
    }

    /// Returns a copy of this set with a single curve appended.
    pub fn with_curve(&self, curve: Curve, roles: &CurveRoles) -> CurveResult<Self> {
        let mut next = self.clone();
        let name = curve.name().to_string();
        next.insert(curve)?;
        next.assign_roles(&name, roles)?;
        Ok(next)
    }

    fn insert(&mut self, curve: Curve) -> CurveResult<()> {
        let name = curve.name().to_string();
        if self.curves.contains_key(&name) {
            return Err(CurveError::invalid_parameters(format!(
                "curve {name} is already present"
            )));
        }
        if let Some(base) = curve.base_name() {
            if !self.curves.contains_key(base) {
                return Err(CurveError::curve_not_found(base));
            }
        }
        self.curves.insert(name.clone(), Arc::new(curve));
        self.order.push(name);
        Ok(())
    }

    fn assign_roles(&mut self, name: &str, roles: &CurveRoles) -> CurveResult<()> {
        let assignments = [
            (&mut self.discounting, &roles.currencies, "discounting"),
            (&mut self.ibor, &roles.ibor_indices, "ibor index"),
            (&mut self.overnight, &roles.overnight_indices, "overnight index"),
            (&mut self.issuers, &roles.issuers, "issuer"),
        ];
        for (map, keys, kind) in assignments {
            for key in keys {
                if let Some(existing) = map.get(key) {
                    if existing != name {
                        return Err(CurveError::invalid_parameters(format!(
                            "{kind} {key} is already served by curve {existing}"
                        )));
                    }
                }
                map.insert(key.clone(), name.to_string());
            }
        }
        Ok(())
    }

    /// Returns an independent copy whose curves share no allocation with
    /// this set.
    #[must_use]
    pub fn deep_copy(&self) -> Self {
        Self {
            order: self.order.clone(),
            curves: self
                .curves
                .iter()
                .map(|(k, v)| (k.clone(), Arc::new(Curve::clone(v))))
                .collect(),
            discounting: self.discounting.clone(),
            ibor: self.ibor.clone(),
            overnight: self.overnight.clone(),
            issuers: self.issuers.clone(),
        }
    }

    /// Returns the curve with the given name.
    pub fn curve(&self, name: &str) -> CurveResult<&Curve> {
        self.curves
            .get(name)
            .map(Arc::as_ref)
            .ok_or_else(|| CurveError::curve_not_found(name))
    }

    /// Returns the shared handle of a curve, if present.
    pub fn get(&self, name: &str) -> Option<&Arc<Curve>> {
        self.curves.get(name)
    }

    /// Returns true if a curve with this name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.curves.contains_key(name)
    }

    /// All curve names in insertion order.
    pub fn all_names(&self) -> &[String] {
        &self.order
    }

    /// Number of curves.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns true if the set holds no curves.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Iterates over curves in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Curve> {
        self.order
            .iter()
            .filter_map(|name| self.curves.get(name).map(Arc::as_ref))
    }

    /// Number of parameters owned by a curve.
    pub fn number_of_parameters(&self, name: &str) -> CurveResult<usize> {
        Ok(self.curve(name)?.number_of_parameters())
    }

    /// Number of parameters needed to build a curve when the curves in
    /// `known` are already available.
    ///
    /// A spread curve whose base is not known also needs the base's
    /// parameters.
    pub fn intrinsic_parameter_count(&self, name: &str, known: &HashSet<String>) -> CurveResult<usize> {
        let mut total = 0;
        let mut current = self.curve(name)?;
        for _ in 0..=self.order.len() {
            total += current.number_of_parameters();
            match current.base_name() {
                Some(base) if !known.contains(base) => current = self.curve(base)?,
                _ => return Ok(total),
            }
        }
        Err(CurveError::invalid_parameters(format!(
            "base chain of curve {name} does not terminate"
        )))
    }

    /// Names along the base chain of a curve, starting with the curve itself.
    pub fn base_chain(&self, name: &str) -> CurveResult<Vec<&str>> {
        let mut chain = Vec::new();
        let mut current = self.curve(name)?;
        for _ in 0..=self.order.len() {
            chain.push(current.name());
            match current.base_name() {
                Some(base) => current = self.curve(base)?,
                None => return Ok(chain),
            }
        }
        Err(CurveError::invalid_parameters(format!(
            "base chain of curve {name} does not terminate"
        )))
    }

    /// Continuously compounded zero rate of a curve at `t`.
    pub fn zero_rate(&self, name: &str, t: f64) -> CurveResult<f64> {
        let mut rate = 0.0;
        for link in self.base_chain(name)? {
            rate += self.curve(link)?.own_rate(t)?;
        }
        Ok(rate)
    }

    /// Discount factor `exp(-r(t)·t)` of a curve.
    pub fn discount_factor(&self, name: &str, t: f64) -> CurveResult<f64> {
        Ok((-self.zero_rate(name, t)? * t).exp())
    }

    /// Simply compounded forward rate of a curve between `start` and `end`.
    pub fn forward_rate(&self, name: &str, start: f64, end: f64) -> CurveResult<f64> {
        if end <= start {
            return Err(CurveError::invalid_value(format!(
                "forward period [{start}, {end}] is empty"
            )));
        }
        let ratio = self.discount_factor(name, start)? / self.discount_factor(name, end)?;
        Ok((ratio - 1.0) / (end - start))
    }

    /// Name of the curve discounting a currency.
    pub fn discount_curve_name(&self, currency: &str) -> CurveResult<&str> {
        self.discounting
            .get(currency)
            .map(String::as_str)
            .ok_or_else(|| CurveError::no_curve_for_role(format!("discounting {currency}")))
    }

    /// Name of the curve projecting an IBOR index.
    pub fn ibor_curve_name(&self, index: &str) -> CurveResult<&str> {
        self.ibor
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CurveError::no_curve_for_role(format!("ibor index {index}")))
    }

    /// Name of the curve projecting an overnight index.
    pub fn overnight_curve_name(&self, index: &str) -> CurveResult<&str> {
        self.overnight
            .get(index)
            .map(String::as_str)
            .ok_or_else(|| CurveError::no_curve_for_role(format!("overnight index {index}")))
    }

    /// Name of the curve pricing an issuer's debt.
    pub fn issuer_curve_name(&self, issuer: &str) -> CurveResult<&str> {
        self.issuers
            .get(issuer)
            .map(String::as_str)
            .ok_or_else(|| CurveError::no_curve_for_role(format!("issuer {issuer}")))
    }
}
