//! Integration test: pricing calibration instruments off a multi-curve set.
//!
//! OIS discounting, a 3M LIBOR projection curve and an issuer spread curve
//! over OIS, all built through the public API.

use approx::assert_relative_eq;
use curvekit_curves::prelude::*;

fn roles() -> CurveRoleMap {
    CurveRoleMap::new()
        .with("USD-OIS", CurveRoles::new().discounting("USD").overnight("USD-SOFR"))
        .with("USD-3M", CurveRoles::new().ibor("USD-LIBOR-3M"))
        .with("ACME", CurveRoles::new().issuer("ACME"))
}

fn build(ois_rates: [f64; 3]) -> CurveSet {
    let ois = InterpolatedCurve::new("USD-OIS", vec![1.0, 2.0, 5.0], ois_rates.to_vec()).unwrap();
    let libor =
        InterpolatedCurve::new("USD-3M", vec![1.0, 2.0, 5.0], vec![0.034, 0.036, 0.039]).unwrap();
    let acme = SpreadCurve::new("ACME", "USD-OIS", vec![1.0, 5.0], vec![0.01, 0.015]).unwrap();
    CurveSet::new()
        .with_curves(vec![ois.into(), libor.into(), acme.into()], &roles())
        .unwrap()
}

fn curves() -> CurveSet {
    build([0.031, 0.033, 0.036])
}

fn instruments() -> Vec<Instrument> {
    let libor = FloatingIndex::Ibor("USD-LIBOR-3M".to_string());
    vec![
        Deposit::new("USD", 0.0, 0.5, 0.03).into(),
        Fra::new("USD", "USD-LIBOR-3M", 0.5, 0.75, 0.035).into(),
        Swap::ois("USD", "USD-SOFR", 3.0, 0.033).into(),
        Swap::new("USD", libor, 4.0, 2, 4, 0.037).into(),
        ZeroCouponBond::new("ACME", 3.0, 0.045).into(),
    ]
}

#[test]
fn test_par_quote_has_zero_value() {
    let curves = curves();
    for instrument in instruments() {
        let par = instrument.par_rate(&curves).unwrap();
        let at_par = instrument.with_quote(par);

        let pv = at_par.present_value(&curves).unwrap();
        assert!(pv.abs() < 1e-14, "{}: pv {pv:e}", instrument.label());

        let residual = ParSpreadMarketQuoteCalculator.residual(&at_par, &curves).unwrap();
        assert!(residual.abs() < 1e-15);
    }
}

#[test]
fn test_issuer_rate_is_base_plus_spread() {
    let curves = curves();
    let base = curves.zero_rate("USD-OIS", 3.0).unwrap();
    let issuer = curves.zero_rate("ACME", 3.0).unwrap();

    // Spread interpolates linearly between 1% at 1Y and 1.5% at 5Y.
    assert_relative_eq!(issuer - base, 0.0125, epsilon = 1e-15);
    assert_eq!(curves.issuer_curve_name("ACME").unwrap(), "ACME");
}

#[test]
fn test_issuer_bond_sees_discounting_nodes() {
    let curves = curves();
    let names: Vec<String> = curves.all_names().to_vec();
    let bond: Instrument = ZeroCouponBond::new("ACME", 3.0, 0.045).into();

    let point = ParSpreadMarketQuoteCalculator
        .point_sensitivity(&bond, &curves)
        .unwrap();
    let sensitivity = parameter_sensitivity(&point, &curves, &names).unwrap();

    // OIS nodes 2Y and 5Y carry the 3Y rate; LIBOR is untouched.
    assert_eq!(sensitivity.len(), 8);
    assert_relative_eq!(sensitivity[1], 2.0 / 3.0, epsilon = 1e-14);
    assert_relative_eq!(sensitivity[2], 1.0 / 3.0, epsilon = 1e-14);
    assert!(sensitivity.rows(3, 3).iter().all(|v| *v == 0.0));
    assert_relative_eq!(sensitivity[6] + sensitivity[7], 1.0, epsilon = 1e-14);

    let h = 1e-6;
    let up = bond.par_rate(&build([0.031, 0.033 + h, 0.036])).unwrap();
    let down = bond.par_rate(&build([0.031, 0.033 - h, 0.036])).unwrap();
    assert_relative_eq!((up - down) / (2.0 * h), sensitivity[1], epsilon = 1e-8);
}

#[test]
fn test_curve_set_is_copy_on_write() {
    let curves = curves();
    let extra = InterpolatedCurve::new("EUR-ESTR", vec![1.0], vec![0.02]).unwrap();
    let extended = curves
        .with_curve(extra.into(), &CurveRoles::new().discounting("EUR"))
        .unwrap();

    assert_eq!(curves.len(), 3);
    assert_eq!(extended.len(), 4);
    assert!(curves.discount_curve_name("EUR").is_err());
    assert_eq!(extended.discount_curve_name("EUR").unwrap(), "EUR-ESTR");

    let duplicate = InterpolatedCurve::new("USD-OIS", vec![1.0], vec![0.02]).unwrap();
    assert!(extended
        .with_curves(vec![duplicate.into()], &CurveRoleMap::new())
        .is_err());
}
