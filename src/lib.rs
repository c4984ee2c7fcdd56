//! Atmosphere state for exoplanet transmission and emission retrievals
//!
//! The [`AtmosphereState`] owns the fixed pressure grid and everything derived
//! from it: temperature, mean molecular weight, scale height, altitude and
//! number density, along with the absorption, Rayleigh and collision-induced
//! cross sections interpolated onto the grid. The forward model reads these
//! on every iteration of a fit.
//!
//! Temperature-pressure profiles come in six variants, see [`TpType`]. Each
//! is prepared once for the pressure grid and then evaluated cheaply for
//! every new parameter vector.
//!
//! NOTE: the Python interface lives in the `python` module, behind the
//! `python` feature. None of the other modules use `pyo3`.

pub mod atmosphere;
pub mod composition;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod grid;
pub(crate) mod interp;
pub mod tp;
pub mod xsec;

#[cfg(feature = "python")]
mod python;

pub use atmosphere::AtmosphereState;
pub use config::{AtmosphereConfig, CloudConfig};
pub use data::{AtmosphereData, CiaTable, CrossSectionTable};
pub use error::{AtmosphereError, ErrorKind};
pub use tp::{HybridCovariance, PreparedTp, TpType};
