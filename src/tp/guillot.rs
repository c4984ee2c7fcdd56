//! Guillot (2010) analytic two-stream profile.

use super::expint::expn;
use crate::constants::{GUILLOT_EPSILON, GUILLOT_T_INT};

/// Temperature profile from Guillot 2010, A&A 520, A27 (eq. 49), with the
/// two visible streams of Line et al. 2012, ApJ 729, 93 (eq. 19).
///
/// `params` is `[T_irr, kappa_ir, kappa_v1, kappa_v2, alpha]`, where `alpha`
/// splits the downward visible flux between the two streams. Opacities are
/// in m²/kg, `pressure` in Pa and `gravity` in m/s².
pub(crate) fn guillot2010(pressure: &[f64], gravity: f64, params: &[f64]) -> Vec<f64> {
    let (t_irr, kappa_ir, kappa_v1, kappa_v2, alpha) =
        (params[0], params[1], params[2], params[3], params[4]);

    let gamma_1 = kappa_v1 / (kappa_ir + GUILLOT_EPSILON);
    let gamma_2 = kappa_v2 / (kappa_ir + GUILLOT_EPSILON);

    let internal = 0.75 * GUILLOT_T_INT.powi(4);
    let irradiated = 0.75 * t_irr.powi(4);

    pressure
        .iter()
        .map(|p| {
            let tau = kappa_ir * p / gravity;
            let t4 = internal * (2. / 3. + tau)
                + irradiated * (1. - alpha) * eta(gamma_1, tau)
                + irradiated * alpha * eta(gamma_2, tau);
            t4.powf(0.25)
        })
        .collect()
}

/// Visible-stream term of the Guillot profile.
fn eta(gamma: f64, tau: f64) -> f64 {
    let gt = gamma * tau;
    2. / 3.
        + 2. / (3. * gamma) * (1. + (gt / 2. - 1.) * (-gt).exp())
        + 2. * gamma / 3. * (1. - tau.powi(2) / 2.) * expn(2, gt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn internal_flux_only() {
        let pressure = [1e6, 1e4, 1e2];
        let (g, kappa_ir) = (25., 0.05);
        let t = guillot2010(&pressure, g, &[0., kappa_ir, 0.01, 0.02, 0.]);
        for (t, p) in t.iter().zip(&pressure) {
            let tau = kappa_ir * p / g;
            let expected = (0.75 * GUILLOT_T_INT.powi(4) * (2. / 3. + tau)).powf(0.25);
            assert_relative_eq!(*t, expected, max_relative = 1e-12);
        }
    }

    #[test]
    fn eta_at_zero_depth() {
        // E2(0) = 1, so eta(gamma, 0) = 2/3 + 2 gamma / 3
        assert_relative_eq!(eta(0.5, 0.), 2. / 3. + 1. / 3., max_relative = 1e-12);
    }

    #[test]
    fn hotter_with_irradiation() {
        let pressure = [1e5, 1e3, 1e1];
        let cold = guillot2010(&pressure, 10., &[0., 0.01, 0.005, 0.005, 0.5]);
        let hot = guillot2010(&pressure, 10., &[1500., 0.01, 0.005, 0.005, 0.5]);
        for (cold, hot) in cold.iter().zip(&hot) {
            assert!(hot > cold);
            assert!(hot.is_finite());
        }
    }

    #[test]
    fn zero_infrared_opacity_stays_finite() {
        let t = guillot2010(&[1e5, 1e3], 10., &[1000., 0., 1e-12, 1e-12, 0.3]);
        assert!(t.iter().all(|t| t.is_finite()));
    }
}
