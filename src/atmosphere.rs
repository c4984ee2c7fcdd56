//! The atmosphere state handed to the forward model.

#[cfg(test)]
mod tests;

use log::{debug, info, warn};
use ndarray::{Array2, Array3, Array4, ArrayView2, Axis};
use rayon::prelude::*;

use crate::composition::{mean_molecular_weight, Composition};
use crate::config::{AtmosphereConfig, CloudConfig};
use crate::constants::{AMU, BAR, MJUP, RJUP};
use crate::data::AtmosphereData;
use crate::error::AtmosphereError;
use crate::grid;
use crate::tp::{HybridCovariance, PreparedTp, TpCache, TpSetup, TpType};
use crate::xsec::SigmaArrays;

/// Physical state of a planetary atmosphere.
///
/// Every profile has length `nlayers` and is indexed like the pressure
/// profile, from the bottom of the atmosphere (index 0) to the top. The
/// pressure grid is fixed for the lifetime of the state; the temperature and
/// mixing ratios change on every fitting iteration, after which
/// [`AtmosphereState::update`] refreshes the derived profiles.
#[derive(Debug, Clone)]
pub struct AtmosphereState {
    config: AtmosphereConfig,
    composition: Composition,
    /// Molecular weights in kg, active gases then inactive gases
    molecular_weights: Vec<f64>,

    planet_radius: f64,
    planet_mass: f64,
    gravity: f64,

    /// Mean molecular mass in kg
    mu: Vec<f64>,
    /// Pressure in Pa, descending
    pressure: Vec<f64>,
    /// Temperature in K
    temperature: Vec<f64>,
    /// Scale height in m
    scale_height: f64,
    /// Altitude in m
    altitude: Vec<f64>,
    /// Number density in m⁻³
    density: Vec<f64>,

    tp_type: TpType,
    hybrid: Option<HybridCovariance>,
    tp_cache: TpCache,

    sigma: SigmaArrays,
}

impl AtmosphereState {
    /// Build the atmosphere.
    ///
    /// `tp_type` overrides the variant in `config`. `covariance` is the
    /// external TP covariance of the hybrid profile, for example from a
    /// previous retrieval stage; it is required when the variant is hybrid
    /// and ignored otherwise.
    pub fn new(
        data: &AtmosphereData,
        config: AtmosphereConfig,
        tp_type: Option<TpType>,
        covariance: Option<Array2<f64>>,
    ) -> Result<Self, AtmosphereError> {
        info!("Initialising atmosphere object");
        config.validate()?;

        let nlayers = config.nlayers;
        let composition = Composition::new(nlayers, &data.active_gases, &data.inactive_gases)?;
        let overfull = composition.overfull_layers();
        if !overfull.is_empty() {
            warn!(
                "total mixing ratio exceeds 1 in {} of {nlayers} layers",
                overfull.len()
            );
        }

        let molecular_weights = if config.couple_mu {
            composition.molecular_weights(&data.molecular_weights)?
        } else {
            Vec::new()
        };
        let mu = mean_molecular_weight(&composition, &molecular_weights, config.couple_mu, config.mu);

        let gravity = grid::surface_gravity(config.planet_mass, config.planet_radius)?;
        let pressure =
            grid::pressure_profile(config.max_pressure, config.num_scale_heights, nlayers)?;

        info!("Planet radius: {:.3} RJUP", config.planet_radius / RJUP);
        info!("Planet mass: {:.3} MJUP", config.planet_mass / MJUP);
        info!("Planet gravity (log g): {:.3} SI", gravity.log10());
        info!("Mean molecular weight: {:.5} AMU", mu[0] / AMU);
        info!("Atmospheric max pressure: {:.3} bar", config.max_pressure / BAR);

        let temperature = vec![config.planet_temperature; nlayers];
        let scale_height = grid::scale_height(&temperature, &mu, gravity);
        let altitude = grid::altitude_profile(&pressure, scale_height, config.max_pressure);
        let density = grid::density_profile(&pressure, &temperature);

        let tp_type = tp_type.unwrap_or(config.tp_type);
        let hybrid = match (tp_type, covariance) {
            (TpType::Hybrid, Some(matrix)) => Some(HybridCovariance::new(
                matrix,
                &pressure,
                config.hybrid_threshold,
                config.hybrid_max_run,
            )?),
            (TpType::Hybrid, None) => {
                return Err(AtmosphereError::MissingOption("hybrid covariance"))
            }
            _ => None,
        };

        let sigma = SigmaArrays::new(data, &composition, &pressure, &config.cia_pairs)?;
        debug!(
            "cross sections: {} gases x {} layers x {} temperatures x {} wavenumbers",
            sigma.sigma.dim().0,
            sigma.sigma.dim().1,
            sigma.sigma.dim().2,
            sigma.sigma.dim().3
        );

        let state = Self {
            planet_radius: config.planet_radius,
            planet_mass: config.planet_mass,
            config,
            composition,
            molecular_weights,
            gravity,
            mu,
            pressure,
            temperature,
            scale_height,
            altitude,
            density,
            tp_type,
            hybrid,
            tp_cache: TpCache::new(),
            sigma,
        };
        info!("Atmosphere object initialised");
        Ok(state)
    }

    /// Recompute the gravity-dependent profiles.
    ///
    /// Gravity, then scale height, then altitude, then density; each step
    /// uses the value just computed. The pressure grid is not recomputed.
    pub fn update(&mut self) -> Result<(), AtmosphereError> {
        self.gravity = grid::surface_gravity(self.planet_mass, self.planet_radius)?;
        self.scale_height = grid::scale_height(&self.temperature, &self.mu, self.gravity);
        self.altitude =
            grid::altitude_profile(&self.pressure, self.scale_height, self.config.max_pressure);
        self.density = grid::density_profile(&self.pressure, &self.temperature);
        Ok(())
    }

    fn tp_setup(&self) -> TpSetup<'_> {
        TpSetup {
            pressure: &self.pressure,
            corr_length: self.config.tp_corr_length,
            hybrid: self.hybrid.as_ref(),
        }
    }

    /// The prepared TP profile, built on first use.
    pub fn prepared_tp(&self) -> Result<&PreparedTp, AtmosphereError> {
        self.tp_cache.get_or_prepare(self.tp_type, &self.tp_setup())
    }

    /// Select another TP variant.
    ///
    /// Switching to hybrid requires a covariance, given here or earlier.
    pub fn set_tp_type(
        &mut self,
        tp_type: TpType,
        covariance: Option<Array2<f64>>,
    ) -> Result<(), AtmosphereError> {
        if let Some(matrix) = covariance {
            self.set_hybrid_covariance(matrix)?;
        }
        if tp_type == TpType::Hybrid && self.hybrid.is_none() {
            return Err(AtmosphereError::MissingOption("hybrid covariance"));
        }
        self.tp_type = tp_type;
        self.tp_cache.invalidate();
        Ok(())
    }

    /// Replace the external covariance of the hybrid profile and reselect
    /// its sampling grid.
    pub fn set_hybrid_covariance(&mut self, matrix: Array2<f64>) -> Result<(), AtmosphereError> {
        self.hybrid = Some(HybridCovariance::new(
            matrix,
            &self.pressure,
            self.config.hybrid_threshold,
            self.config.hybrid_max_run,
        )?);
        self.tp_cache.invalidate();
        Ok(())
    }

    /// Evaluate the TP profile without changing the state.
    pub fn evaluate_tp(&self, params: &[f64]) -> Result<Vec<f64>, AtmosphereError> {
        self.prepared_tp()?.evaluate(params, self.gravity)
    }

    /// Evaluate the TP profile and store it as the temperature profile.
    ///
    /// Call [`AtmosphereState::update`] afterwards to refresh the derived
    /// profiles.
    pub fn set_tp_profile(&mut self, params: &[f64]) -> Result<(), AtmosphereError> {
        self.temperature = self.evaluate_tp(params)?;
        Ok(())
    }

    /// Evaluate many parameter vectors in parallel, one per row of `params`.
    ///
    /// A failed row does not affect the others.
    pub fn evaluate_tp_batch(
        &self,
        params: ArrayView2<'_, f64>,
    ) -> Vec<Result<Vec<f64>, AtmosphereError>> {
        let prepared = match self.prepared_tp() {
            Ok(prepared) => prepared,
            Err(e) => return vec![Err(e); params.nrows()],
        };

        let mut results = Vec::new();
        params
            .axis_iter(Axis(0))
            .into_par_iter()
            .map(|row| match row.as_slice() {
                Some(row) => prepared.evaluate(row, self.gravity),
                None => prepared.evaluate(&row.to_vec(), self.gravity),
            })
            .collect_into_vec(&mut results);
        results
    }

    /// Replace the temperature profile directly.
    pub fn set_temperature_profile(&mut self, temperature: Vec<f64>) -> Result<(), AtmosphereError> {
        if temperature.len() != self.nlayers() {
            return Err(AtmosphereError::InconsistentInputs(
                "temperature profile must have length nlayers",
            ));
        }
        self.temperature = temperature;
        Ok(())
    }

    /// Replace the mixing ratio profiles, (`ngases`, `nlayers`) each, and
    /// recompute the mean molecular weight if it is coupled to the mixture.
    pub fn set_mixing_ratios(
        &mut self,
        active: Array2<f64>,
        inactive: Option<Array2<f64>>,
    ) -> Result<(), AtmosphereError> {
        self.composition.set_mixratios(active, inactive)?;
        if self.config.couple_mu {
            self.mu = self.composition.coupled_mu(&self.molecular_weights);
        }
        Ok(())
    }

    /// Change the planet radius in m. Takes effect on the next update.
    pub fn set_planet_radius(&mut self, radius: f64) {
        self.planet_radius = radius;
    }

    /// Change the planet mass in kg. Takes effect on the next update.
    pub fn set_planet_mass(&mut self, mass: f64) {
        self.planet_mass = mass;
    }

    /// Configuration the state was built from.
    pub fn config(&self) -> &AtmosphereConfig {
        &self.config
    }

    /// Number of layers.
    pub fn nlayers(&self) -> usize {
        self.pressure.len()
    }

    /// Selected TP variant.
    pub fn tp_type(&self) -> TpType {
        self.tp_type
    }

    /// Hybrid covariance and sampling grid, if one was given.
    pub fn hybrid_covariance(&self) -> Option<&HybridCovariance> {
        self.hybrid.as_ref()
    }

    /// Labels of the current TP free parameters.
    pub fn tp_parameter_names(&self) -> Result<Vec<String>, AtmosphereError> {
        Ok(self.prepared_tp()?.parameter_names())
    }

    /// Gas mixture.
    pub fn composition(&self) -> &Composition {
        &self.composition
    }

    /// Active mixing ratios, (`nactive`, `nlayers`).
    pub fn active_mixratio(&self) -> &Array2<f64> {
        self.composition.active_mixratio()
    }

    /// Inactive mixing ratios, (`ninactive`, `nlayers`).
    pub fn inactive_mixratio(&self) -> &Array2<f64> {
        self.composition.inactive_mixratio()
    }

    /// Planet radius in m.
    pub fn planet_radius(&self) -> f64 {
        self.planet_radius
    }

    /// Planet mass in kg.
    pub fn planet_mass(&self) -> f64 {
        self.planet_mass
    }

    /// Surface gravity in m/s².
    pub fn gravity(&self) -> f64 {
        self.gravity
    }

    /// Mean molecular mass in kg per layer.
    pub fn mu(&self) -> &[f64] {
        &self.mu
    }

    /// Pressure in Pa, descending.
    pub fn pressure_profile(&self) -> &[f64] {
        &self.pressure
    }

    /// Temperature in K.
    pub fn temperature_profile(&self) -> &[f64] {
        &self.temperature
    }

    /// Scale height in m.
    pub fn scale_height(&self) -> f64 {
        self.scale_height
    }

    /// Altitude in m above the bottom layer.
    pub fn altitude_profile(&self) -> &[f64] {
        &self.altitude
    }

    /// Number density in m⁻³.
    pub fn density_profile(&self) -> &[f64] {
        &self.density
    }

    /// Cloud deck, if enabled.
    pub fn clouds(&self) -> Option<&CloudConfig> {
        self.config.clouds.as_ref()
    }

    /// All cross-section arrays.
    pub fn sigma_arrays(&self) -> &SigmaArrays {
        &self.sigma
    }

    /// Absorption cross sections, (`nactive`, `nlayers`, `ntemperature`, `nwavenumber`).
    pub fn sigma_array(&self) -> &Array4<f64> {
        &self.sigma.sigma
    }

    /// Rayleigh cross sections, (`ngases`, `nwavenumber`).
    pub fn sigma_rayleigh_array(&self) -> &Array2<f64> {
        &self.sigma.rayleigh
    }

    /// CIA cross sections, (`npairs`, `ntemperature`, `nwavenumber`).
    pub fn sigma_cia_array(&self) -> &Array3<f64> {
        &self.sigma.cia
    }

    /// Row-major absorption cross sections.
    pub fn sigma_array_flat(&self) -> Result<&[f64], AtmosphereError> {
        self.sigma
            .sigma
            .as_slice()
            .ok_or(AtmosphereError::NotContiguous)
    }

    /// Row-major Rayleigh cross sections.
    pub fn sigma_rayleigh_array_flat(&self) -> Result<&[f64], AtmosphereError> {
        self.sigma
            .rayleigh
            .as_slice()
            .ok_or(AtmosphereError::NotContiguous)
    }

    /// Row-major CIA cross sections.
    pub fn sigma_cia_array_flat(&self) -> Result<&[f64], AtmosphereError> {
        self.sigma
            .cia
            .as_slice()
            .ok_or(AtmosphereError::NotContiguous)
    }

    /// Gas indices of each CIA pair, flattened to (`2 * npairs`, ).
    pub fn cia_index(&self) -> Vec<usize> {
        self.sigma.cia_index_flat()
    }
}
