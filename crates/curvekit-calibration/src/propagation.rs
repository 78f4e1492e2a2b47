//! Propagation of inverse Jacobians across stages.
//!
//! After a stage is solved, the sensitivity of its curves' parameters to the
//! market quotes is expressed against the quotes of every earlier curve that
//! has a stored block, not just the quotes of the stage itself.
//!
//! # Method
//!
//! With `J = [J_b | J_c]` the residual sensitivities of the stage's
//! instruments to the parameters of the earlier (`b`) and current (`c`)
//! curves, the implicit function theorem gives
//!
//! ```text
//! ∂p_c/∂q_c = J_c⁻¹
//! ∂p_c/∂p_b = -J_c⁻¹ J_b
//! ∂p_c/∂q_b = (∂p_c/∂p_b) T
//! ```
//!
//! where `T` stacks the stored blocks of the earlier curves, each projected
//! onto the columns of the earlier curves' quotes.

use std::collections::HashSet;
use std::sync::Arc;

use curvekit_curves::calculators::SensitivityCalculator;
use curvekit_curves::{CurveSet, Instrument};
use curvekit_math::linear_algebra::{block, invert, set_block};
use curvekit_math::MathError;
use nalgebra::DMatrix;
use tracing::{debug, warn};

use crate::block::BuildingBlock;
use crate::bundle::BlockBundle;
use crate::error::{CalibrationError, CalibrationResult};
use crate::unit::stage_jacobian;

/// Matrices produced for the curves of one stage.
#[derive(Debug, Clone)]
pub struct BlockUpdate {
    /// Column addressing shared by all matrices of the stage.
    pub block: Arc<BuildingBlock>,
    /// Curve name and its inverse-Jacobian rows, in stage order.
    pub matrices: Vec<(String, DMatrix<f64>)>,
    /// Earlier curves whose quotes appear in the block.
    pub before: Vec<String>,
    /// Earlier curves left out because no block was stored for them.
    pub dropped: Vec<String>,
}

/// Computes the stored sensitivities of the curves in `current`.
///
/// `curves` is the merged snapshot after the stage was solved and
/// `instruments` the stage's calibrating instruments, in stage order.
/// `bundle` supplies the blocks of earlier curves and is not modified.
///
/// Earlier curves without a stored block cannot be chained through; they
/// are treated as constants, left out of the new block and listed in
/// [`BlockUpdate::dropped`].
///
/// # Errors
///
/// - `Configuration` if the stage's parameter count does not match its
///   instruments, if the direct block is singular, or if a stored block
///   disagrees with the curve it describes
/// - `Curve` for pricing failures
pub fn update_block_bundle<S: SensitivityCalculator + ?Sized>(
    instruments: &[Instrument],
    curves: &CurveSet,
    current: &[String],
    bundle: &BlockBundle,
    sensitivity: &S,
) -> CalibrationResult<BlockUpdate> {
    let current_set: HashSet<&str> = current.iter().map(String::as_str).collect();
    let (before, dropped): (Vec<String>, Vec<String>) = curves
        .all_names()
        .iter()
        .filter(|name| !current_set.contains(name.as_str()))
        .cloned()
        .partition(|name| bundle.contains(name));

    if !dropped.is_empty() {
        warn!(
            dropped = ?dropped,
            current = ?current,
            "curves without a stored block are left out of the sensitivity chain"
        );
    }

    let mut before_lengths = Vec::with_capacity(before.len());
    for name in &before {
        before_lengths.push((name.clone(), curves.number_of_parameters(name)?));
    }

    // Dropped curves stay fixed inputs: they count as known, but their
    // parameters get no columns.
    let mut known: HashSet<String> = before.iter().chain(&dropped).cloned().collect();
    let mut current_lengths = Vec::with_capacity(current.len());
    for name in current {
        current_lengths.push((name.clone(), curves.intrinsic_parameter_count(name, &known)?));
        known.insert(name.clone());
    }

    let before_block = BuildingBlock::from_lengths(before_lengths.iter().cloned())?;
    let current_block = BuildingBlock::from_lengths(current_lengths.iter().cloned())?;
    let nb = before_block.total_parameters();
    let nc = current_block.total_parameters();

    if nc != instruments.len() {
        return Err(CalibrationError::configuration(format!(
            "curves {current:?} need {nc} parameters but have {} instruments",
            instruments.len()
        )));
    }

    let ordered: Vec<String> = before.iter().chain(current).cloned().collect();
    let sensitivities = stage_jacobian(sensitivity, instruments, curves, &ordered)?;
    if sensitivities.ncols() != nb + nc {
        return Err(CalibrationError::configuration(format!(
            "curves {current:?} depend on parameters that have no stored block"
        )));
    }

    let indirect = block(&sensitivities, 0, 0, nc, nb)?;
    let direct = block(&sensitivities, 0, nb, nc, nc)?;
    let inverse_direct = match invert(&direct) {
        Ok(inverse) => inverse,
        Err(MathError::SingularMatrix) => {
            return Err(CalibrationError::configuration(format!(
                "sensitivity of the instruments of {current:?} to their own parameters is singular"
            )))
        }
        Err(e) => return Err(e.into()),
    };

    let before_quotes = if nb > 0 {
        let transition = transition_matrix(&before_block, bundle)?;
        -(&inverse_direct * &indirect) * transition
    } else {
        DMatrix::zeros(nc, 0)
    };

    let block_out = Arc::new(BuildingBlock::from_lengths(
        before_lengths.into_iter().chain(current_lengths),
    )?);

    let mut matrices = Vec::with_capacity(current.len());
    for (name, range) in current_block.iter() {
        let mut matrix = DMatrix::zeros(range.len, nb + nc);
        set_block(
            &mut matrix,
            0,
            0,
            &block(&before_quotes, range.start, 0, range.len, nb)?,
        )?;
        set_block(
            &mut matrix,
            0,
            nb,
            &block(&inverse_direct, range.start, 0, range.len, nc)?,
        )?;
        matrices.push((name.to_string(), matrix));
    }

    debug!(
        current = ?current,
        before = ?before,
        columns = nb + nc,
        "sensitivity blocks assembled"
    );

    Ok(BlockUpdate {
        block: block_out,
        matrices,
        before,
        dropped,
    })
}

/// Sensitivity of the earlier curves' parameters to the earlier curves'
/// quotes, laid out on `before` in both directions.
///
/// Row slice `l` is the stored matrix of curve `l`, with its columns
/// rearranged from `l`'s own block onto `before`. Quotes of curves missing
/// from `l`'s block do not move `l` and stay zero.
fn transition_matrix(before: &BuildingBlock, bundle: &BlockBundle) -> CalibrationResult<DMatrix<f64>> {
    let nb = before.total_parameters();
    let mut transition = DMatrix::zeros(nb, nb);

    for (row_name, row_range) in before.iter() {
        let entry = bundle.block(row_name).ok_or_else(|| {
            CalibrationError::configuration(format!("no stored block for curve {row_name}"))
        })?;
        if entry.matrix().nrows() != row_range.len {
            return Err(CalibrationError::configuration(format!(
                "stored block of curve {row_name} has {} rows but the curve has {} parameters",
                entry.matrix().nrows(),
                row_range.len
            )));
        }

        for (column_name, column_range) in before.iter() {
            let Some(stored) = entry.block().range(column_name) else {
                continue;
            };
            if stored.len != column_range.len {
                return Err(CalibrationError::configuration(format!(
                    "stored block of curve {row_name} addresses {} quotes of {column_name}, expected {}",
                    stored.len, column_range.len
                )));
            }
            let slice = block(entry.matrix(), 0, stored.start, row_range.len, stored.len)?;
            set_block(&mut transition, row_range.start, column_range.start, &slice)?;
        }
    }

    Ok(transition)
}

#[cfg(test)]
mod tests {
    use super::*;
    use curvekit_curves::calculators::ParSpreadMarketQuoteCalculator;
    use curvekit_curves::{CurveRoleMap, CurveRoles, Deposit, InterpolatedCurve};
    use approx::assert_relative_eq;

    fn roles() -> CurveRoleMap {
        CurveRoleMap::new()
            .with("D", CurveRoles::new().discounting("USD"))
            .with("F", CurveRoles::new().ibor("USD-LIBOR-3M"))
    }

    fn single_curve_set() -> CurveSet {
        let d = InterpolatedCurve::new("D", vec![1.0, 2.0], vec![0.03, 0.035]).unwrap();
        CurveSet::new().with_curves(vec![d.into()], &roles()).unwrap()
    }

    fn deposits() -> Vec<Instrument> {
        vec![
            Deposit::new("USD", 0.0, 1.0, 0.03).into(),
            Deposit::new("USD", 0.0, 2.0, 0.035).into(),
        ]
    }

    #[test]
    fn test_first_stage_is_inverse_jacobian() {
        let curves = single_curve_set();
        let calculator = ParSpreadMarketQuoteCalculator;
        let names = vec!["D".to_string()];

        let update =
            update_block_bundle(&deposits(), &curves, &names, &BlockBundle::new(), &calculator)
                .unwrap();

        assert!(update.before.is_empty());
        assert!(update.dropped.is_empty());
        assert_eq!(update.block.total_parameters(), 2);

        let jacobian = stage_jacobian(&calculator, &deposits(), &curves, &names).unwrap();
        let product = &jacobian * &update.matrices[0].1;
        for i in 0..2 {
            for j in 0..2 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_relative_eq!(product[(i, j)], expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_singular_direct_block() {
        let curves = single_curve_set();
        let instruments: Vec<Instrument> = vec![
            Deposit::new("USD", 0.0, 1.0, 0.03).into(),
            Deposit::new("USD", 0.0, 1.0, 0.03).into(),
        ];
        let err = update_block_bundle(
            &instruments,
            &curves,
            &["D".to_string()],
            &BlockBundle::new(),
            &ParSpreadMarketQuoteCalculator,
        )
        .unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("singular"));
    }

    #[test]
    fn test_count_mismatch() {
        let curves = single_curve_set();
        let err = update_block_bundle(
            &deposits()[..1],
            &curves,
            &["D".to_string()],
            &BlockBundle::new(),
            &ParSpreadMarketQuoteCalculator,
        )
        .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_transition_leaves_unrelated_quotes_at_zero() {
        let before = BuildingBlock::from_lengths([("A", 1), ("B", 2)]).unwrap();

        // A was calibrated alone; B's block also covers A's quote.
        let mut bundle = BlockBundle::new();
        let a_block = Arc::new(BuildingBlock::from_lengths([("A", 1)]).unwrap());
        bundle
            .add("A", a_block, DMatrix::from_row_slice(1, 1, &[2.0]))
            .unwrap();
        let b_block = Arc::new(BuildingBlock::from_lengths([("A", 1), ("B", 2)]).unwrap());
        bundle
            .add(
                "B",
                b_block,
                DMatrix::from_row_slice(2, 3, &[0.5, 3.0, 0.0, -0.5, 0.0, 4.0]),
            )
            .unwrap();

        let transition = transition_matrix(&before, &bundle).unwrap();
        let expected = DMatrix::from_row_slice(
            3,
            3,
            &[2.0, 0.0, 0.0, 0.5, 3.0, 0.0, -0.5, 0.0, 4.0],
        );
        assert_eq!(transition, expected);
    }

    #[test]
    fn test_transition_reorders_columns() {
        // B's stored block lists its own quotes before A's.
        let before = BuildingBlock::from_lengths([("A", 1), ("B", 1)]).unwrap();
        let mut bundle = BlockBundle::new();
        bundle
            .add(
                "A",
                Arc::new(BuildingBlock::from_lengths([("A", 1)]).unwrap()),
                DMatrix::from_row_slice(1, 1, &[1.0]),
            )
            .unwrap();
        bundle
            .add(
                "B",
                Arc::new(BuildingBlock::from_lengths([("B", 1), ("A", 1)]).unwrap()),
                DMatrix::from_row_slice(1, 2, &[7.0, 9.0]),
            )
            .unwrap();

        let transition = transition_matrix(&before, &bundle).unwrap();
        assert_eq!(transition, DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 9.0, 7.0]));
    }
}
