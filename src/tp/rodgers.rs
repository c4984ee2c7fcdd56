//! Rodgers (2000) correlation smoothing, also used by the hybrid profile.

use ndarray::{Array2, ArrayView1, Axis};

/// Correlation matrix `C[i, j] = exp(-|ln(P_i / P_j)| / h)`.
///
/// After Rodgers 2000, Inverse Methods for Atmospheric Sounding (eq. 3.26),
/// as used in NEMESIS (Irwin et al. 2008).
pub(crate) fn correlation_matrix(pressure: &[f64], h: f64) -> Array2<f64> {
    let n = pressure.len();
    Array2::from_shape_fn((n, n), |(i, j)| {
        (-(pressure[i] / pressure[j]).ln().abs() / h).exp()
    })
}

/// Scale each row to sum to one.
pub(crate) fn row_normalized(matrix: &Array2<f64>) -> Array2<f64> {
    let sums = matrix.sum_axis(Axis(1)).insert_axis(Axis(1));
    matrix / &sums
}

/// Weighted average of `temperature` for every row of `weights`.
pub(crate) fn smooth(weights: &Array2<f64>, temperature: &[f64]) -> Vec<f64> {
    weights.dot(&ArrayView1::from(temperature)).to_vec()
}

/// Blend the Rodgers matrix with an external covariance,
/// `(1 - alpha) C_rodgers + alpha C_external`, and smooth with it.
pub(crate) fn hybrid(
    correlation: &Array2<f64>,
    external: &Array2<f64>,
    alpha: f64,
    temperature: &[f64],
) -> Vec<f64> {
    let blended = correlation * (1. - alpha) + external * alpha;
    smooth(&row_normalized(&blended), temperature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn correlation_is_symmetric_with_unit_diagonal() {
        let c = correlation_matrix(&[1e5, 1e4, 1e3], 1.5);
        for i in 0..3 {
            assert_eq!(c[[i, i]], 1.);
            for j in 0..3 {
                assert_relative_eq!(c[[i, j]], c[[j, i]], max_relative = 1e-12);
            }
        }
        assert_relative_eq!(c[[0, 1]], (-(10f64).ln() / 1.5).exp(), max_relative = 1e-12);
    }

    #[test]
    fn rows_sum_to_one() {
        let w = row_normalized(&correlation_matrix(&[1e5, 1e4, 1e3, 1e2], 7.));
        for row in w.outer_iter() {
            assert_relative_eq!(row.sum(), 1., max_relative = 1e-12);
        }
    }

    #[test]
    fn hybrid_at_alpha_one_uses_external_only() {
        let correlation = correlation_matrix(&[1e5, 1e4], 1.);
        let external = Array2::eye(2);
        let t = hybrid(&correlation, &external, 1., &[1000., 500.]);
        assert_relative_eq!(t[0], 1000.);
        assert_relative_eq!(t[1], 500.);
    }
}
