//! Curve roles: which currencies, indices and issuers a curve serves.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

/// Roles played by a single curve.
///
/// # Example
///
/// ```rust
/// use curvekit_curves::multicurve::CurveRoles;
///
/// let roles = CurveRoles::new().discounting("USD").overnight("USD-SOFR");
/// assert_eq!(roles.currencies, vec!["USD".to_string()]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveRoles {
    /// Currencies discounted by the curve.
    pub currencies: Vec<String>,
    /// IBOR-style term indices projected by the curve.
    pub ibor_indices: Vec<String>,
    /// Overnight indices projected by the curve.
    pub overnight_indices: Vec<String>,
    /// Issuers (legal entities) whose debt is priced off the curve.
    pub issuers: Vec<String>,
}

impl CurveRoles {
    /// Creates an empty role description.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a discounting currency.
    #[must_use]
    pub fn discounting(mut self, currency: impl Into<String>) -> Self {
        self.currencies.push(currency.into());
        self
    }

    /// Adds a projected IBOR index.
    #[must_use]
    pub fn ibor(mut self, index: impl Into<String>) -> Self {
        self.ibor_indices.push(index.into());
        self
    }

    /// Adds a projected overnight index.
    #[must_use]
    pub fn overnight(mut self, index: impl Into<String>) -> Self {
        self.overnight_indices.push(index.into());
        self
    }

    /// Adds an issuer.
    #[must_use]
    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuers.push(issuer.into());
        self
    }

    /// Returns true if the curve plays no role.
    pub fn is_empty(&self) -> bool {
        self.currencies.is_empty()
            && self.ibor_indices.is_empty()
            && self.overnight_indices.is_empty()
            && self.issuers.is_empty()
    }
}

/// Curve name → roles, supplied with a calibration request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurveRoleMap {
    roles: BTreeMap<String, CurveRoles>,
}

impl CurveRoleMap {
    /// Creates an empty role map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns roles to a curve, merging with roles already assigned.
    #[must_use]
    pub fn with(mut self, curve: impl Into<String>, roles: CurveRoles) -> Self {
        self.insert(curve, roles);
        self
    }

    /// Assigns roles to a curve, merging with roles already assigned.
    pub fn insert(&mut self, curve: impl Into<String>, roles: CurveRoles) {
        let entry = self.roles.entry(curve.into()).or_default();
        entry.currencies.extend(roles.currencies);
        entry.ibor_indices.extend(roles.ibor_indices);
        entry.overnight_indices.extend(roles.overnight_indices);
        entry.issuers.extend(roles.issuers);
    }

    /// Returns the roles of a curve, if any were assigned.
    pub fn roles(&self, curve: &str) -> Option<&CurveRoles> {
        self.roles.get(curve)
    }

    /// Iterates over (curve name, roles) in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &CurveRoles)> {
        self.roles.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of curves with roles.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Returns true if no roles are assigned.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// Builds a role map from per-role maps keyed by curve name.
    ///
    /// `discounting` maps a curve to the currency it discounts; the index and
    /// issuer maps allow several entries per curve.
    pub fn from_index_maps(
        discounting: &HashMap<String, String>,
        ibor: &HashMap<String, Vec<String>>,
        overnight: &HashMap<String, Vec<String>>,
        issuers: &HashMap<String, Vec<String>>,
    ) -> Self {
        let mut map = Self::new();
        for (curve, currency) in discounting {
            map.insert(curve.clone(), CurveRoles::new().discounting(currency.clone()));
        }
        for (curve, indices) in ibor {
            map.insert(
                curve.clone(),
                CurveRoles {
                    ibor_indices: indices.clone(),
                    ..CurveRoles::default()
                },
            );
        }
        for (curve, indices) in overnight {
            map.insert(
                curve.clone(),
                CurveRoles {
                    overnight_indices: indices.clone(),
                    ..CurveRoles::default()
                },
            );
        }
        for (curve, names) in issuers {
            map.insert(
                curve.clone(),
                CurveRoles {
                    issuers: names.clone(),
                    ..CurveRoles::default()
                },
            );
        }
        map
    }
}
