//! Gas mixture: mixing-ratio profiles and mean molecular weight.

use std::collections::HashMap;

use ndarray::{Array2, Axis};

use crate::constants::AMU;
use crate::error::AtmosphereError;

/// Molecular weight in AMU of the species the opacity tables usually carry.
pub fn builtin_molecular_weight(gas: &str) -> Option<f64> {
    #![allow(clippy::excessive_precision)]
    let weight = match gas {
        "H2" => 2.01588,
        "He" => 4.002602,
        "H2O" => 18.01528,
        "CH4" => 16.04246,
        "CO" => 28.0101,
        "CO2" => 44.0095,
        "NH3" => 17.03052,
        "N2" => 28.0134,
        "O2" => 31.9988,
        "O3" => 47.9982,
        "NO" => 30.0061,
        "OH" => 17.00734,
        "HCN" => 27.0253,
        "C2H2" => 26.0373,
        "C2H4" => 28.0532,
        "C2H6" => 30.069,
        "H2S" => 34.0809,
        "PH3" => 33.99758,
        "SO2" => 64.0638,
        "SiO" => 44.0849,
        "TiO" => 63.8664,
        "VO" => 66.9409,
        "FeH" => 56.853,
        "Na" => 22.98977,
        "K" => 39.0983,
        "Ar" => 39.948,
        _ => return None,
    };
    Some(weight)
}

/// Gas names and their mixing ratio in every layer.
///
/// Mixing ratio arrays are dimensioned as (`ngases`, `nlayers`). Inactive
/// mixing ratios are relative to the non-active part of the atmosphere.
#[derive(Debug, Clone)]
pub struct Composition {
    nlayers: usize,
    active_gases: Vec<String>,
    inactive_gases: Vec<String>,
    active_mixratio: Array2<f64>,
    inactive_mixratio: Array2<f64>,
}

impl Composition {
    /// Build constant-with-altitude profiles from one mixing ratio per gas.
    pub fn new(
        nlayers: usize,
        active: &[(String, f64)],
        inactive: &[(String, f64)],
    ) -> Result<Self, AtmosphereError> {
        let active_gases: Vec<String> = active.iter().map(|(name, _)| name.clone()).collect();
        let inactive_gases: Vec<String> = inactive.iter().map(|(name, _)| name.clone()).collect();

        let mut seen = std::collections::HashSet::new();
        for gas in active_gases.iter().chain(&inactive_gases) {
            if !seen.insert(gas.as_str()) {
                return Err(AtmosphereError::DuplicateGas(gas.clone()));
            }
        }

        let profile = |gases: &[(String, f64)]| {
            Array2::from_shape_fn((gases.len(), nlayers), |(gas, _)| gases[gas].1)
        };

        Ok(Self {
            nlayers,
            active_mixratio: profile(active),
            inactive_mixratio: profile(inactive),
            active_gases,
            inactive_gases,
        })
    }

    /// Number of layers.
    pub fn nlayers(&self) -> usize {
        self.nlayers
    }

    /// Active (absorbing) gas names.
    pub fn active_gases(&self) -> &[String] {
        &self.active_gases
    }

    /// Inactive gas names.
    pub fn inactive_gases(&self) -> &[String] {
        &self.inactive_gases
    }

    /// Active gases followed by inactive gases.
    pub fn all_gases(&self) -> impl Iterator<Item = &String> {
        self.active_gases.iter().chain(&self.inactive_gases)
    }

    /// Active mixing ratios, (`nactive`, `nlayers`).
    pub fn active_mixratio(&self) -> &Array2<f64> {
        &self.active_mixratio
    }

    /// Inactive mixing ratios, (`ninactive`, `nlayers`).
    pub fn inactive_mixratio(&self) -> &Array2<f64> {
        &self.inactive_mixratio
    }

    /// Replace the active mixing ratios.
    pub fn set_active_mixratio(&mut self, mixratio: Array2<f64>) -> Result<(), AtmosphereError> {
        self.set_mixratios(mixratio, None)
    }

    /// Replace the inactive mixing ratios.
    pub fn set_inactive_mixratio(&mut self, mixratio: Array2<f64>) -> Result<(), AtmosphereError> {
        self.check_inactive(&mixratio)?;
        self.inactive_mixratio = mixratio;
        Ok(())
    }

    /// Replace the active and, if given, the inactive mixing ratios.
    ///
    /// Both shapes are checked before anything is stored, so on error the
    /// composition is unchanged.
    pub fn set_mixratios(
        &mut self,
        active: Array2<f64>,
        inactive: Option<Array2<f64>>,
    ) -> Result<(), AtmosphereError> {
        if active.dim() != (self.active_gases.len(), self.nlayers) {
            return Err(AtmosphereError::InconsistentInputs(
                "active mixing ratios must be (nactive, nlayers)",
            ));
        }
        if let Some(inactive) = &inactive {
            self.check_inactive(inactive)?;
        }

        self.active_mixratio = active;
        if let Some(inactive) = inactive {
            self.inactive_mixratio = inactive;
        }
        Ok(())
    }

    fn check_inactive(&self, mixratio: &Array2<f64>) -> Result<(), AtmosphereError> {
        if mixratio.dim() != (self.inactive_gases.len(), self.nlayers) {
            return Err(AtmosphereError::InconsistentInputs(
                "inactive mixing ratios must be (ninactive, nlayers)",
            ));
        }
        Ok(())
    }

    /// Inactive mixing ratios as fractions of the whole atmosphere, scaled
    /// by `1 - sum(active)` in each layer.
    pub fn absolute_inactive_mixratio(&self) -> Array2<f64> {
        let remaining = self.active_mixratio.sum_axis(Axis(0)).mapv(|sum| 1. - sum);
        &self.inactive_mixratio * &remaining
    }

    /// Indices of layers whose total mixing ratio exceeds one.
    ///
    /// The total counts the inactive gases at their absolute fraction. A
    /// layer whose active gases alone exceed one is also reported, since
    /// its inactive fractions would be negative.
    pub fn overfull_layers(&self) -> Vec<usize> {
        const TOLERANCE: f64 = 1e-9;
        let active = self.active_mixratio.sum_axis(Axis(0));
        let total = &active + &self.absolute_inactive_mixratio().sum_axis(Axis(0));
        active
            .iter()
            .zip(&total)
            .enumerate()
            .filter_map(|(layer, (&active, &total))| {
                (active > 1. + TOLERANCE || total > 1. + TOLERANCE).then_some(layer)
            })
            .collect()
    }

    /// Per-layer molecular weights in kg, active gases then inactive gases.
    ///
    /// `overrides` (AMU) take precedence over [`builtin_molecular_weight`].
    pub fn molecular_weights(
        &self,
        overrides: &HashMap<String, f64>,
    ) -> Result<Vec<f64>, AtmosphereError> {
        self.all_gases()
            .map(|gas| {
                overrides
                    .get(gas)
                    .copied()
                    .or_else(|| builtin_molecular_weight(gas))
                    .map(|w| w * AMU)
                    .ok_or_else(|| AtmosphereError::UnknownGas(gas.clone()))
            })
            .collect()
    }

    /// Mean molecular mass in kg for every layer, from the mixture.
    ///
    /// `weights` are in kg, ordered as from [`Composition::molecular_weights`].
    pub fn coupled_mu(&self, weights: &[f64]) -> Vec<f64> {
        let nactive = self.active_gases.len();
        let inactive = self.absolute_inactive_mixratio();

        (0..self.nlayers)
            .map(|layer| {
                let active_sum: f64 = self
                    .active_mixratio
                    .column(layer)
                    .iter()
                    .zip(&weights[..nactive])
                    .map(|(x, w)| x * w)
                    .sum();
                let inactive_sum: f64 = inactive
                    .column(layer)
                    .iter()
                    .zip(&weights[nactive..])
                    .map(|(x, w)| x * w)
                    .sum();
                active_sum + inactive_sum
            })
            .collect()
    }
}

/// Mean molecular mass per layer, in kg.
///
/// Either the fixed `mu` (AMU) in every layer, or the mixture-weighted value
/// when `coupled`.
pub fn mean_molecular_weight(
    composition: &Composition,
    weights: &[f64],
    coupled: bool,
    mu: f64,
) -> Vec<f64> {
    if coupled {
        composition.coupled_mu(weights)
    } else {
        vec![mu * AMU; composition.nlayers()]
    }
}
