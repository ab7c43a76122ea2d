//! Least squares via SVD.
//!
//! Log-space growth fits are tiny (a handful of rows, two columns), but the
//! x values are day offsets that can sit far from zero, so the `[x, 1]`
//! design matrix is often badly conditioned. We solve with an SVD instead of
//! forming `XᵀX`.
//!
//! Nalgebra's `QR::solve` only handles square systems, which is why the SVD
//! path is used for tall matrices.

use nalgebra::{DMatrix, DVector};

/// Solve `min ‖Xβ - y‖²` using SVD.
///
/// Returns `None` if no finite solution is found at any tolerance.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() == 0 || x.nrows() != y.len() {
        return None;
    }

    let svd = x.clone().svd(true, true);

    // Near-duplicate x values make the smallest singular value tiny; loosen
    // the cutoff until the solve yields a finite answer.
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fit `y ≈ slope·x + intercept` and return `(slope, intercept)`.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Option<(f64, f64)> {
    if xs.len() != ys.len() || xs.is_empty() {
        return None;
    }

    let n = xs.len();
    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { xs[i] } else { 1.0 });
    let rhs = DVector::from_column_slice(ys);

    let beta = solve_least_squares(&design, &rhs)?;
    Some((beta[0], beta[1]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_recovers_exact_line() {
        // y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_handles_large_offsets() {
        let xs: Vec<f64> = (0..10).map(|i| 40_000.0 + i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 0.25 * x - 7.0).collect();

        let (slope, intercept) = fit_line(&xs, &ys).unwrap();
        assert!((slope - 0.25).abs() < 1e-8);
        assert!((intercept + 7.0).abs() < 1e-4);
    }

    #[test]
    fn fit_line_rejects_mismatched_inputs() {
        assert!(fit_line(&[1.0, 2.0], &[1.0]).is_none());
        assert!(fit_line(&[], &[]).is_none());
    }
}
