//! Ad-hoc profiles from temperature nodes.

use crate::error::AtmosphereError;
use crate::interp::interp_log_pressure;

/// Interpolate node temperatures onto `pressure` in log-pressure and smooth
/// the result with a moving average.
///
/// `node_pressure` is descending, like `pressure`. The averaging window is
/// `smooth_window` percent of the layers, widened to an odd count; the
/// `window / 2` layers at either end are left unsmoothed.
pub fn tp_from_nodes(
    pressure: &[f64],
    node_pressure: &[f64],
    node_temperature: &[f64],
    smooth_window: f64,
) -> Result<Vec<f64>, AtmosphereError> {
    if node_pressure.len() != node_temperature.len() || node_pressure.is_empty() {
        return Err(AtmosphereError::InconsistentInputs(
            "TP nodes need one temperature per pressure",
        ));
    }

    let raw = interp_log_pressure(pressure, node_pressure, node_temperature);

    let n = raw.len();
    let mut width = (n as f64 * smooth_window / 100.).max(0.) as usize;
    if width % 2 == 0 {
        width += 1;
    }
    if width < 3 || width > n {
        return Ok(raw);
    }

    let half = width / 2;
    let mut smoothed = raw.clone();
    for (i, window) in raw.windows(width).enumerate() {
        smoothed[i + half] = window.iter().sum::<f64>() / width as f64;
    }
    Ok(smoothed)
}
