//! Python interface.
//!
//! The cross-section tables and gas lists are passed in as plain Python
//! objects and numpy arrays; the configuration is a JSON document with the
//! same fields as [`AtmosphereConfig`].

use std::collections::HashMap;

use log::{debug, info};
use ndarray::{Array2, ArrayView1, Axis};
use numpy::{
    PyArray1, PyArray2, PyArray3, PyArray4, PyReadonlyArray1, PyReadonlyArray2,
    PyReadonlyArray3, ToPyArray,
};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::data::{CiaTable, CrossSectionTable};
use crate::tp::{sample_grid, tp_from_nodes};
use crate::{AtmosphereConfig, AtmosphereData, AtmosphereError, AtmosphereState, TpType};

impl From<AtmosphereError> for PyErr {
    fn from(e: AtmosphereError) -> Self {
        PyValueError::new_err(e.to_string())
    }
}

fn thread_pool(num_threads: Option<usize>) -> PyResult<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(num_threads.unwrap_or(0))
        .build()
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// The atmosphere of a planet on a fixed pressure grid.
///
/// `config` is a JSON document; any field left out takes its default.
///
/// `active_gases` and `inactive_gases` are lists of (name, mixing ratio).
///
/// `xsec_pressure` (bar, ascending) and `xsec_temperature` (K) are the axes of
/// the absorption tables in `cross_sections`, each dimensioned as
/// (`npressure`, `ntemperature`, `nwavenumber`).
///
/// `rayleigh` maps every gas to its cross section of shape (`nwavenumber`, ).
///
/// `cia` maps pair names like "H2-He" to tables of shape (`ntemperature`,
/// `nwavenumber`) on the `cia_temperature` axis.
///
/// `molecular_weights` (AMU) overrides the built-in table.
///
/// `tp_type` overrides the profile named in `config`; `covariance` is the
/// external (`nlayers`, `nlayers`) covariance required by the hybrid profile.
#[pyclass(name = "Atmosphere")]
struct PyAtmosphere {
    state: AtmosphereState,
}

#[pymethods]
impl PyAtmosphere {
    #[new]
    #[pyo3(signature = (config, wavenumber, active_gases, inactive_gases, xsec_pressure, xsec_temperature, cross_sections, rayleigh, cia_temperature, cia, molecular_weights=None, tp_type=None, covariance=None))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        config: &str,
        wavenumber: PyReadonlyArray1<'_, f64>,
        active_gases: Vec<(String, f64)>,
        inactive_gases: Vec<(String, f64)>,
        xsec_pressure: PyReadonlyArray1<'_, f64>,
        xsec_temperature: PyReadonlyArray1<'_, f64>,
        cross_sections: HashMap<String, PyReadonlyArray3<'_, f64>>,
        rayleigh: HashMap<String, PyReadonlyArray1<'_, f64>>,
        cia_temperature: PyReadonlyArray1<'_, f64>,
        cia: HashMap<String, PyReadonlyArray2<'_, f64>>,
        molecular_weights: Option<HashMap<String, f64>>,
        tp_type: Option<&str>,
        covariance: Option<PyReadonlyArray2<'_, f64>>,
    ) -> PyResult<Self> {
        let config = AtmosphereConfig::from_json_str(config)?;
        let tp_type = tp_type.map(str::parse::<TpType>).transpose()?;

        let data = AtmosphereData {
            wavenumber: wavenumber.as_slice()?.to_vec(),
            active_gases,
            inactive_gases,
            molecular_weights: molecular_weights.unwrap_or_default(),
            cross_sections: CrossSectionTable {
                pressure: xsec_pressure.as_slice()?.to_vec(),
                temperature: xsec_temperature.as_slice()?.to_vec(),
                xsec: cross_sections
                    .into_iter()
                    .map(|(gas, table)| (gas, table.as_array().to_owned()))
                    .collect(),
            },
            rayleigh: rayleigh
                .into_iter()
                .map(|(gas, table)| (gas, table.as_array().to_owned()))
                .collect(),
            cia: CiaTable {
                temperature: cia_temperature.as_slice()?.to_vec(),
                xsec: cia
                    .into_iter()
                    .map(|(pair, table)| (pair, table.as_array().to_owned()))
                    .collect(),
            },
        };
        debug!("copied provider tables");

        let covariance = covariance.map(|c| c.as_array().to_owned());
        let state = AtmosphereState::new(&data, config, tp_type, covariance)?;
        Ok(Self { state })
    }

    /// Refresh gravity, scale height, altitude and density.
    fn update(&mut self) -> PyResult<()> {
        Ok(self.state.update()?)
    }

    /// Evaluate the TP profile and store it as the temperature profile.
    fn set_tp_profile(&mut self, params: PyReadonlyArray1<'_, f64>) -> PyResult<()> {
        Ok(self.state.set_tp_profile(params.as_slice()?)?)
    }

    /// Evaluate the TP profile without storing it.
    fn evaluate_tp<'py>(
        &self,
        py: Python<'py>,
        params: PyReadonlyArray1<'_, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let temperature = self.state.evaluate_tp(params.as_slice()?)?;
        Ok(temperature.to_pyarray(py))
    }

    /// Evaluate one TP profile per row of `params`, dimensioned as
    /// (`num_samples`, `num_params`), returning (`num_samples`, `nlayers`).
    ///
    /// The number of worker threads is controlled by `num_threads`. It must
    /// be a positive integer, or `None` to automatically choose the number of
    /// threads.
    #[pyo3(signature = (params, num_threads=None))]
    fn evaluate_tp_batch<'py>(
        &self,
        py: Python<'py>,
        params: PyReadonlyArray2<'_, f64>,
        num_threads: Option<usize>,
    ) -> PyResult<Bound<'py, PyArray2<f64>>> {
        let params = params.as_array().to_owned();
        let num_samples = params.nrows();
        let pool = thread_pool(num_threads)?;
        info!("Evaluating {num_samples} TP profiles");

        let state = &self.state;
        let results =
            py.allow_threads(|| pool.install(|| state.evaluate_tp_batch(params.view())));

        let mut output = Array2::zeros([num_samples, state.nlayers()]);
        results
            .into_iter()
            .enumerate()
            .try_for_each(|(index, temperature)| -> Result<_, AtmosphereError> {
                let temperature = temperature?;
                let rhs = ArrayView1::from(temperature.as_slice());
                output.index_axis_mut(Axis(0), index).assign(&rhs);
                Ok(())
            })?;
        Ok(output.to_pyarray(py))
    }

    /// Select another TP profile by name.
    #[pyo3(signature = (tp_type, covariance=None))]
    fn set_tp_type(
        &mut self,
        tp_type: &str,
        covariance: Option<PyReadonlyArray2<'_, f64>>,
    ) -> PyResult<()> {
        let tp_type = tp_type.parse::<TpType>()?;
        let covariance = covariance.map(|c| c.as_array().to_owned());
        Ok(self.state.set_tp_type(tp_type, covariance)?)
    }

    /// Replace the hybrid covariance.
    fn set_hybrid_covariance(&mut self, covariance: PyReadonlyArray2<'_, f64>) -> PyResult<()> {
        Ok(self
            .state
            .set_hybrid_covariance(covariance.as_array().to_owned())?)
    }

    /// Replace the temperature profile.
    fn set_temperature_profile(&mut self, temperature: PyReadonlyArray1<'_, f64>) -> PyResult<()> {
        Ok(self
            .state
            .set_temperature_profile(temperature.as_slice()?.to_vec())?)
    }

    /// Replace the mixing ratios, (`ngases`, `nlayers`) each.
    #[pyo3(signature = (active, inactive=None))]
    fn set_mixing_ratios(
        &mut self,
        active: PyReadonlyArray2<'_, f64>,
        inactive: Option<PyReadonlyArray2<'_, f64>>,
    ) -> PyResult<()> {
        let active = active.as_array().to_owned();
        let inactive = inactive.map(|m| m.as_array().to_owned());
        Ok(self.state.set_mixing_ratios(active, inactive)?)
    }

    #[getter]
    fn nlayers(&self) -> usize {
        self.state.nlayers()
    }

    #[getter]
    fn tp_type(&self) -> &'static str {
        self.state.tp_type().name()
    }

    #[getter]
    fn tp_parameter_names(&self) -> PyResult<Vec<String>> {
        Ok(self.state.tp_parameter_names()?)
    }

    #[getter]
    fn sample_index(&self) -> Option<Vec<usize>> {
        self.state
            .hybrid_covariance()
            .map(|h| h.sample_index().to_vec())
    }

    #[getter]
    fn planet_radius(&self) -> f64 {
        self.state.planet_radius()
    }

    #[setter]
    fn set_planet_radius(&mut self, radius: f64) {
        self.state.set_planet_radius(radius);
    }

    #[getter]
    fn planet_mass(&self) -> f64 {
        self.state.planet_mass()
    }

    #[setter]
    fn set_planet_mass(&mut self, mass: f64) {
        self.state.set_planet_mass(mass);
    }

    #[getter]
    fn gravity(&self) -> f64 {
        self.state.gravity()
    }

    #[getter]
    fn scale_height(&self) -> f64 {
        self.state.scale_height()
    }

    #[getter]
    fn mu<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.state.mu().to_pyarray(py)
    }

    #[getter]
    fn pressure_profile<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.state.pressure_profile().to_pyarray(py)
    }

    #[getter]
    fn temperature_profile<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.state.temperature_profile().to_pyarray(py)
    }

    #[getter]
    fn altitude_profile<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.state.altitude_profile().to_pyarray(py)
    }

    #[getter]
    fn density_profile<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray1<f64>> {
        self.state.density_profile().to_pyarray(py)
    }

    #[getter]
    fn active_mixratio<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.state.active_mixratio().to_pyarray(py)
    }

    #[getter]
    fn inactive_mixratio<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.state.inactive_mixratio().to_pyarray(py)
    }

    #[getter]
    fn sigma_array<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray4<f64>> {
        self.state.sigma_array().to_pyarray(py)
    }

    #[getter]
    fn sigma_rayleigh_array<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray2<f64>> {
        self.state.sigma_rayleigh_array().to_pyarray(py)
    }

    #[getter]
    fn sigma_cia_array<'py>(&self, py: Python<'py>) -> Bound<'py, PyArray3<f64>> {
        self.state.sigma_cia_array().to_pyarray(py)
    }

    #[getter]
    fn sigma_array_flat<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray1<f64>>> {
        Ok(self.state.sigma_array_flat()?.to_pyarray(py))
    }

    #[getter]
    fn sigma_rayleigh_array_flat<'py>(
        &self,
        py: Python<'py>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        Ok(self.state.sigma_rayleigh_array_flat()?.to_pyarray(py))
    }

    #[getter]
    fn sigma_cia_array_flat<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyArray1<f64>>> {
        Ok(self.state.sigma_cia_array_flat()?.to_pyarray(py))
    }

    #[getter]
    fn cia_index(&self) -> Vec<usize> {
        self.state.cia_index()
    }
}

/// Select the sampling grid of a hybrid profile from a reference row.
#[pyfunction]
#[pyo3(signature = (reference, threshold, max_run))]
fn sampling_grid(
    reference: PyReadonlyArray1<'_, f64>,
    threshold: f64,
    max_run: usize,
) -> PyResult<Vec<usize>> {
    Ok(sample_grid(reference.as_slice()?, threshold, max_run))
}

/// Interpolate node temperatures onto `pressure` and smooth the result.
///
/// `smooth_window` is the width of the running mean as a percentage of the
/// number of layers.
#[pyfunction]
#[pyo3(signature = (pressure, node_pressure, node_temperature, smooth_window=10.))]
fn profile_from_nodes<'py>(
    py: Python<'py>,
    pressure: PyReadonlyArray1<'_, f64>,
    node_pressure: PyReadonlyArray1<'_, f64>,
    node_temperature: PyReadonlyArray1<'_, f64>,
    smooth_window: f64,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let temperature = tp_from_nodes(
        pressure.as_slice()?,
        node_pressure.as_slice()?,
        node_temperature.as_slice()?,
        smooth_window,
    )?;
    Ok(temperature.to_pyarray(py))
}

/// A Python module implemented in Rust.
#[pymodule]
fn exo_atmos(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();

    m.add_class::<PyAtmosphere>()?;
    m.add_function(wrap_pyfunction!(sampling_grid, m)?)?;
    m.add_function(wrap_pyfunction!(profile_from_nodes, m)?)?;
    m.add(
        "TP_TYPES",
        TpType::ALL.iter().map(|t| t.name()).collect::<Vec<_>>(),
    )?;
    Ok(())
}
