//! Profiles interpolated linearly in log-pressure through a few control
//! points.
//!
//! Control pressures are clamped to the grid and to the order of the nodes
//! above them, so the node axis handed to the interpolation is always
//! monotonic.

use smallvec::SmallVec;

use crate::interp::interp_log_pressure;

fn pressure_bounds(pressure: &[f64]) -> (f64, f64) {
    pressure
        .iter()
        .fold((f64::NEG_INFINITY, f64::INFINITY), |(max, min), &p| {
            (max.max(p), min.min(p))
        })
}

/// `[T1, dT, P1]`: `T1` at the bottom, `T1 - dT` at `P1` and isothermal
/// above it.
pub(crate) fn two_point(pressure: &[f64], params: &[f64]) -> Vec<f64> {
    let (max_p, min_p) = pressure_bounds(pressure);
    let t_trop = params[0] - params[1];

    let p1 = params[2].min(max_p).max(min_p);

    let node_p: SmallVec<[f64; 4]> = SmallVec::from_slice(&[max_p, p1, min_p]);
    let node_t: SmallVec<[f64; 4]> = SmallVec::from_slice(&[params[0], t_trop, t_trop]);
    interp_log_pressure(pressure, &node_p, &node_t)
}

/// `[T1, dT1, dT2, P1, P2]`: like [`two_point`] with a second intermediate
/// point `T1 - dT1 - dT2` at `P2`.
pub(crate) fn three_point(pressure: &[f64], params: &[f64]) -> Vec<f64> {
    let (max_p, min_p) = pressure_bounds(pressure);
    let t_point1 = params[0] - params[1];
    let t_point2 = t_point1 - params[2];

    let p1 = params[3].min(max_p).max(min_p);
    // P2 sits above P1
    let p2 = params[4].min(p1).max(min_p);

    let node_p: SmallVec<[f64; 4]> = SmallVec::from_slice(&[max_p, p1, p2, min_p]);
    let node_t: SmallVec<[f64; 4]> =
        SmallVec::from_slice(&[params[0], t_point1, t_point2, t_point2]);
    interp_log_pressure(pressure, &node_p, &node_t)
}
