//! Least squares and straight-line trend fitting.
//!
//! Scatter charts overlay a trend line `y = a + b x` fitted by ordinary least
//! squares. The general solver works on any design matrix; `fit_line` builds
//! the two-column `[1, x]` design for the common case.
//!
//! Implementation choices:
//! - SVD solve, so tall (more rows than columns) and near-singular systems are
//!   handled without panicking. (Nalgebra's `QR::solve` is intended for square
//!   systems.)
//! - Pairs with a missing or non-finite coordinate are dropped before fitting.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// A fitted line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub intercept: f64,
    pub slope: f64,
    /// Coefficient of determination of the fit.
    pub r_squared: f64,
    pub n: usize,
}

impl LineFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit a straight line through the complete `(x, y)` pairs.
///
/// Needs at least two pairs with distinct `x` values.
pub fn fit_line(points: &[(Option<f64>, Option<f64>)]) -> Option<LineFit> {
    let pairs: Vec<(f64, f64)> = points
        .iter()
        .filter_map(|&(x, y)| Some((x?, y?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect();
    let n = pairs.len();
    if n < 2 {
        return None;
    }
    let x0 = pairs[0].0;
    if pairs.iter().all(|p| p.0 == x0) {
        return None;
    }

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { pairs[i].0 });
    let y = DVector::from_iterator(n, pairs.iter().map(|p| p.1));
    let beta = solve_least_squares(&design, &y)?;

    let fit = LineFit {
        intercept: beta[0],
        slope: beta[1],
        r_squared: 0.0,
        n,
    };

    let mean_y = y.mean();
    let ss_tot: f64 = y.iter().map(|v| (v - mean_y) * (v - mean_y)).sum();
    let ss_res: f64 = pairs
        .iter()
        .map(|&(x, y)| {
            let e = y - fit.predict(x);
            e * e
        })
        .sum();
    let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

    Some(LineFit { r_squared, ..fit })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_skips_incomplete_pairs() {
        let pts = [
            (Some(4.0), Some(0.70)),
            (Some(5.0), Some(0.75)),
            (None, Some(9.0)),
            (Some(6.0), None),
            (Some(6.0), Some(0.80)),
        ];
        let fit = fit_line(&pts).unwrap();
        assert_eq!(fit.n, 3);
        assert!((fit.slope - 0.05).abs() < 1e-10);
        assert!((fit.intercept - 0.50).abs() < 1e-10);
        assert!((fit.r_squared - 1.0).abs() < 1e-10);
    }

    #[test]
    fn fit_line_needs_spread_in_x() {
        assert!(fit_line(&[(Some(1.0), Some(2.0)), (Some(1.0), Some(3.0))]).is_none());
        assert!(fit_line(&[(Some(1.0), Some(2.0))]).is_none());
    }
}
