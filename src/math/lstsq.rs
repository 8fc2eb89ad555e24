//! Small dense linear solves.
//!
//! Every linear system in this crate is tiny (at most 4 unknowns for the model
//! fits, a handful of knots for splines), so we always go through SVD and
//! accept a pseudo-inverse solution when the system is nearly singular.
//! Nalgebra's `QR::solve` would panic on tall matrices, SVD does not.

use nalgebra::{DMatrix, DVector};

/// Solve `a · x ≈ b` in the least-squares sense.
///
/// Returns `None` if no finite solution is found at any tolerance.
pub fn solve_least_squares(a: &DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if a.nrows() != b.len() || a.ncols() == 0 {
        return None;
    }
    let svd = a.clone().svd(true, true);

    // Progressively looser singular-value cut-offs.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(x) = svd.solve(b, tol) {
            if x.iter().all(|v| v.is_finite()) {
                return Some(x);
            }
        }
    }

    None
}
