//! Ordinary least squares solver.
//!
//! The calibration model is a straight line in (concentration ratio,
//! response ratio) space, so the design matrix is only ever `n x 2`
//! (intercept column + ratio column). We still solve it via SVD:
//!
//! - SVD handles tall matrices robustly (nalgebra's `QR::solve` is intended
//!   for square systems and will panic for non-square matrices)
//! - near-collinear inputs (all standards at almost the same level) fail as
//!   "no solution" here instead of surfacing later as inf/NaN concentrations
//! - at a dozen calibration rows, performance is irrelevant

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if the strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_an_intercept_and_slope_from_exact_ratios() {
        // response_ratio = 0.05 + 2 * conc_ratio at three calibration levels.
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.1, 1.0, 0.5, 1.0, 1.0]);
        let y = DVector::from_row_slice(&[0.25, 1.05, 2.05]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 0.05).abs() < 1e-10);
        assert!((beta[1] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn overdetermined_system_yields_finite_solution() {
        // Seven-level calibration with integration noise on the responses.
        let x = DMatrix::from_row_slice(
            7,
            2,
            &[
                1.0, 0.05, 1.0, 0.1, 1.0, 0.2, 1.0, 1.0, 1.0, 2.0, 1.0, 5.0, 1.0, 10.0,
            ],
        );
        let y = DVector::from_row_slice(&[0.052, 0.097, 0.204, 1.01, 1.98, 5.03, 9.96]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!(beta.iter().all(|v| v.is_finite()));
        assert!((beta[1] - 1.0).abs() < 0.05);
    }
}
