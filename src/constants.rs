//! Physical constants and unit scales, all in SI.

#![allow(clippy::excessive_precision)]

/// Boltzmann constant (J/K)
pub const KBOLTZ: f64 = 1.380648813e-23;

/// Gravitational constant (m³/kg/s²)
pub const G: f64 = 6.67384e-11;

/// Atomic mass unit (kg)
pub const AMU: f64 = 1.660538921e-27;

/// Jupiter radius (m)
pub const RJUP: f64 = 6.9911e7;

/// Jupiter mass (kg)
pub const MJUP: f64 = 1.898e27;

/// One bar in Pa
pub const BAR: f64 = 1e5;

/// Internal temperature (K) of the Guillot profile
pub const GUILLOT_T_INT: f64 = 200.0;

/// Added to the infrared opacity before dividing by it
pub const GUILLOT_EPSILON: f64 = 1e-10;
