//! Inputs supplied by the data provider.
//!
//! The engine only reads these. Cross sections are in m², tabulated on the
//! provider's own pressure and temperature axes and on the working
//! wavenumber grid.

use std::collections::HashMap;

use ndarray::{Array1, Array2, Array3};

/// Absorption cross sections of the active gases.
#[derive(Debug, Clone, Default)]
pub struct CrossSectionTable {
    /// Pressure axis in bar, ascending
    pub pressure: Vec<f64>,
    /// Temperature axis in K
    pub temperature: Vec<f64>,
    /// Per gas, dimensioned as (`npressure`, `ntemperature`, `nwavenumber`)
    pub xsec: HashMap<String, Array3<f64>>,
}

/// Collision-induced absorption cross sections.
#[derive(Debug, Clone, Default)]
pub struct CiaTable {
    /// Temperature axis in K
    pub temperature: Vec<f64>,
    /// Per pair name such as "H2-He", dimensioned as (`ntemperature`, `nwavenumber`)
    pub xsec: HashMap<String, Array2<f64>>,
}

/// Everything an [`AtmosphereState`] needs from the data provider.
///
/// [`AtmosphereState`]: crate::atmosphere::AtmosphereState
#[derive(Debug, Clone, Default)]
pub struct AtmosphereData {
    /// Working wavenumber grid in cm⁻¹
    pub wavenumber: Vec<f64>,
    /// Active (absorbing) gases and their initial mixing ratios
    pub active_gases: Vec<(String, f64)>,
    /// Inactive gases and their initial mixing ratios, relative to the
    /// non-active part of the atmosphere
    pub inactive_gases: Vec<(String, f64)>,
    /// Molecular weights in AMU that override the built-in table
    pub molecular_weights: HashMap<String, f64>,
    /// Absorption cross sections
    pub cross_sections: CrossSectionTable,
    /// Rayleigh cross sections per gas, each of length `nwavenumber`
    pub rayleigh: HashMap<String, Array1<f64>>,
    /// Collision-induced absorption
    pub cia: CiaTable,
}
