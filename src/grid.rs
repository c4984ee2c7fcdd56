//! Vertical physical grids: gravity, pressure, scale height, altitude and
//! number density.
//!
//! All profiles share the ordering of the pressure grid: index 0 is the
//! bottom of the atmosphere (highest pressure) and the last index is the top.

use crate::constants::{G, KBOLTZ};
use crate::error::AtmosphereError;

/// Surface gravity in m/s² for a planet `mass` in kg and `radius` in m.
///
/// Gravity is treated as constant with altitude.
pub fn surface_gravity(mass: f64, radius: f64) -> Result<f64, AtmosphereError> {
    if !(mass > 0.) {
        return Err(AtmosphereError::InvalidOption {
            name: "planet_mass",
            value: mass,
        });
    }
    if !(radius > 0.) {
        return Err(AtmosphereError::InvalidOption {
            name: "planet_radius",
            value: radius,
        });
    }
    Ok(G * mass / radius.powi(2))
}

/// Log-spaced pressure grid in Pa, in descending order.
///
/// The grid spans `num_scale_heights` e-foldings below `max_pressure`, so the
/// first element is `max_pressure` and the last is
/// `max_pressure * exp(-num_scale_heights)`.
pub fn pressure_profile(
    max_pressure: f64,
    num_scale_heights: f64,
    nlayers: usize,
) -> Result<Vec<f64>, AtmosphereError> {
    if !(max_pressure > 0.) {
        return Err(AtmosphereError::InvalidOption {
            name: "max_pressure",
            value: max_pressure,
        });
    }
    if !(num_scale_heights > 0.) {
        return Err(AtmosphereError::InvalidOption {
            name: "num_scale_heights",
            value: num_scale_heights,
        });
    }
    if nlayers < 2 {
        return Err(AtmosphereError::InvalidOption {
            name: "nlayers",
            value: nlayers as f64,
        });
    }

    let log_max = max_pressure.ln();
    let log_min = log_max - num_scale_heights;
    let step = (log_max - log_min) / (nlayers - 1) as f64;

    let mut pressure: Vec<f64> = (0..nlayers)
        .rev()
        .map(|i| (log_min + i as f64 * step).exp())
        .collect();
    pressure[0] = max_pressure;
    Ok(pressure)
}

/// Atmospheric scale height in m.
///
/// Per-layer scale heights `k T / (mu g)` are averaged into one value, so the
/// altitude grid uses a single global scale height. `temperature` is in K and
/// `mu` is the per-layer mean molecular mass in kg.
pub fn scale_height(temperature: &[f64], mu: &[f64], gravity: f64) -> f64 {
    let n = temperature.len().min(mu.len());
    if n == 0 {
        return 0.;
    }
    let sum: f64 = temperature
        .iter()
        .zip(mu)
        .map(|(t, mu)| KBOLTZ * t / (mu * gravity))
        .sum();
    sum / n as f64
}

/// Altitude in m above the `max_pressure` level.
pub fn altitude_profile(pressure: &[f64], scale_height: f64, max_pressure: f64) -> Vec<f64> {
    pressure
        .iter()
        .map(|p| -scale_height * (p / max_pressure).ln())
        .collect()
}

/// Number density in m⁻³ for pressures in Pa and temperatures in K.
pub fn density_profile(pressure: &[f64], temperature: &[f64]) -> Vec<f64> {
    pressure
        .iter()
        .zip(temperature)
        .map(|(p, t)| p / (KBOLTZ * t))
        .collect()
}
