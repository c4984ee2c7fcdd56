//! One-dimensional linear interpolation.
//!
//! These behave like `numpy.interp`: `xp` must be ascending and values
//! outside its range are clamped to the end points.

/// Locate `x` in the ascending grid `xp`.
///
/// Returns the indices of the bracketing nodes and the weight of the upper
/// node, so that the interpolated value is `(1 - w) * fp[lo] + w * fp[hi]`.
/// Outside the grid both indices point at the nearest end node.
pub(crate) fn bracket(x: f64, xp: &[f64]) -> (usize, usize, f64) {
    let last = xp.len() - 1;
    if x <= xp[0] {
        return (0, 0, 0.);
    }
    if x >= xp[last] {
        return (last, last, 0.);
    }

    // First node strictly above x; guaranteed to be in 1..=last
    let hi = xp.partition_point(|&node| node <= x);
    let lo = hi - 1;
    let width = xp[hi] - xp[lo];
    let w = if width > 0. { (x - xp[lo]) / width } else { 0. };
    (lo, hi, w)
}

/// Interpolate `fp(xp)` at `x`.
///
/// Equal neighbouring values give exactly that value back.
pub(crate) fn interp(x: f64, xp: &[f64], fp: &[f64]) -> f64 {
    let (lo, hi, w) = bracket(x, xp);
    fp[lo] + w * (fp[hi] - fp[lo])
}

/// Interpolate node temperatures onto a descending pressure grid, linearly
/// in log-pressure.
///
/// `node_pressure` must be descending, like `pressure`.
pub(crate) fn interp_log_pressure(
    pressure: &[f64],
    node_pressure: &[f64],
    node_values: &[f64],
) -> Vec<f64> {
    let log_nodes: Vec<f64> = node_pressure.iter().rev().map(|p| p.ln()).collect();
    let values: Vec<f64> = node_values.iter().rev().copied().collect();

    pressure
        .iter()
        .map(|p| interp(p.ln(), &log_nodes, &values))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn clamps_outside_range() {
        let xp = [1., 2., 3.];
        let fp = [10., 20., 40.];
        assert_eq!(interp(0., &xp, &fp), 10.);
        assert_eq!(interp(5., &xp, &fp), 40.);
        assert_relative_eq!(interp(2.5, &xp, &fp), 30.);
        assert_eq!(interp(2., &xp, &fp), 20.);
    }

    #[test]
    fn log_pressure_midpoint() {
        let pressure = [1e4, 1e3, 1e2];
        let t = interp_log_pressure(&pressure, &[1e4, 1e2], &[1000., 500.]);
        assert_relative_eq!(t[0], 1000.);
        assert_relative_eq!(t[1], 750., epsilon = 1e-9);
        assert_relative_eq!(t[2], 500.);
    }
}
