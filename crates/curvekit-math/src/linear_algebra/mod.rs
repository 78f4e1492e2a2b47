//! Linear algebra utilities.
//!
//! Free functions over `nalgebra` dense matrices. Every routine checks its
//! dimensions up front and reports problems as [`MathError`] instead of
//! panicking inside `nalgebra`.

use crate::error::{MathError, MathResult};
use nalgebra::{DMatrix, DVector};

/// Relative pivot size below which a matrix is treated as singular.
pub const SINGULARITY_THRESHOLD: f64 = 1e-14;

/// Inverts a square matrix using LU decomposition with partial pivoting.
///
/// # Errors
///
/// Returns [`MathError::SingularMatrix`] when the smallest pivot is negligible
/// relative to the largest one, and [`MathError::InvalidInput`] when the
/// matrix is not square.
pub fn invert(matrix: &DMatrix<f64>) -> MathResult<DMatrix<f64>> {
    let n = matrix.nrows();
    if n != matrix.ncols() {
        return Err(MathError::invalid_input(format!(
            "Matrix must be square for inversion, got {}x{}",
            n,
            matrix.ncols()
        )));
    }
    if n == 0 {
        return Ok(DMatrix::zeros(0, 0));
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(MathError::invalid_input("Matrix contains non-finite entries"));
    }

    let lu = matrix.clone().lu();
    let u = lu.u();
    let (min_pivot, max_pivot) = (0..n)
        .map(|i| u[(i, i)].abs())
        .fold((f64::INFINITY, 0.0_f64), |(lo, hi), p| (lo.min(p), hi.max(p)));

    if max_pivot == 0.0 || min_pivot <= SINGULARITY_THRESHOLD * max_pivot {
        return Err(MathError::SingularMatrix);
    }

    lu.try_inverse().ok_or(MathError::SingularMatrix)
}

/// Multiplies two matrices, checking that the inner dimensions agree.
pub fn multiply(a: &DMatrix<f64>, b: &DMatrix<f64>) -> MathResult<DMatrix<f64>> {
    if a.ncols() != b.nrows() {
        return Err(MathError::dimension_mismatch(a.shape(), b.shape()));
    }
    Ok(a * b)
}

/// Multiplies every entry of a matrix by `factor`.
pub fn scale(a: &DMatrix<f64>, factor: f64) -> DMatrix<f64> {
    a * factor
}

/// Copies the `nrows x ncols` sub-matrix starting at `(row, col)`.
pub fn block(
    matrix: &DMatrix<f64>,
    row: usize,
    col: usize,
    nrows: usize,
    ncols: usize,
) -> MathResult<DMatrix<f64>> {
    if row + nrows > matrix.nrows() || col + ncols > matrix.ncols() {
        return Err(MathError::invalid_input(format!(
            "Block ({row}, {col}) of size {nrows}x{ncols} exceeds {}x{} matrix",
            matrix.nrows(),
            matrix.ncols()
        )));
    }
    Ok(matrix.view((row, col), (nrows, ncols)).clone_owned())
}

/// Writes `source` into `target` with its top-left corner at `(row, col)`.
pub fn set_block(
    target: &mut DMatrix<f64>,
    row: usize,
    col: usize,
    source: &DMatrix<f64>,
) -> MathResult<()> {
    let (nrows, ncols) = source.shape();
    if row + nrows > target.nrows() || col + ncols > target.ncols() {
        return Err(MathError::invalid_input(format!(
            "Cannot place {nrows}x{ncols} block at ({row}, {col}) in {}x{} matrix",
            target.nrows(),
            target.ncols()
        )));
    }
    target.view_mut((row, col), (nrows, ncols)).copy_from(source);
    Ok(())
}

/// Solves `A x = b` through a singular value decomposition.
///
/// Singular values below `SINGULARITY_THRESHOLD` times the largest one are
/// discarded, which yields the least-norm solution on rank-deficient systems.
pub fn solve_linear_system(a: &DMatrix<f64>, b: &DVector<f64>) -> MathResult<DVector<f64>> {
    let n = a.nrows();
    if n != a.ncols() {
        return Err(MathError::invalid_input("Matrix must be square"));
    }
    if n != b.len() {
        return Err(MathError::dimension_mismatch((n, n), (b.len(), 1)));
    }
    if a.iter().chain(b.iter()).any(|v| !v.is_finite()) {
        return Err(MathError::invalid_input("Linear system contains non-finite entries"));
    }

    let svd = a.clone().svd(true, true);
    let largest = svd.singular_values.iter().copied().fold(0.0_f64, f64::max);
    if largest == 0.0 {
        return Err(MathError::SingularMatrix);
    }

    let x = svd
        .solve(b, SINGULARITY_THRESHOLD * largest)
        .map_err(MathError::invalid_input)?;

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::SingularMatrix);
    }
    Ok(x)
}
