//! Cross sections projected onto the working pressure grid.


use log::debug;
use ndarray::{s, Array2, Array3, Array4, Axis};
use rayon::prelude::*;
use smallvec::SmallVec;

use crate::composition::Composition;
use crate::constants::BAR;
use crate::data::{AtmosphereData, CiaTable, CrossSectionTable};
use crate::error::AtmosphereError;
use crate::interp::bracket;

/// Cross-section arrays aligned with an atmosphere's layers.
#[derive(Debug, Clone)]
pub struct SigmaArrays {
    /// Absorption cross sections, (`nactive`, `nlayers`, `ntemperature`, `nwavenumber`)
    pub sigma: Array4<f64>,
    /// Rayleigh cross sections of every gas, active first, (`ngases`, `nwavenumber`)
    pub rayleigh: Array2<f64>,
    /// CIA cross sections, (`npairs`, `ntemperature`, `nwavenumber`)
    pub cia: Array3<f64>,
    /// For each CIA pair, the index of both gases in the active+inactive list
    pub cia_index: Vec<[usize; 2]>,
}

impl SigmaArrays {
    /// Build all cross-section arrays for the gases in `composition`, on the
    /// pressure grid `pressure` (Pa).
    pub fn new(
        data: &AtmosphereData,
        composition: &Composition,
        pressure: &[f64],
        cia_pairs: &[String],
    ) -> Result<Self, AtmosphereError> {
        let nwavenumber = data.wavenumber.len();

        let sigma = interpolate_sigma(
            &data.cross_sections,
            composition.active_gases(),
            pressure,
            nwavenumber,
        )?;

        let gases: Vec<&str> = composition.all_gases().map(String::as_str).collect();
        let rayleigh = rayleigh_array(data, &gases)?;

        let cia = cia_array(&data.cia, cia_pairs, nwavenumber)?;
        let cia_index = cia_gas_index(
            cia_pairs,
            composition.active_gases(),
            composition.inactive_gases(),
        )?;

        Ok(Self {
            sigma,
            rayleigh,
            cia,
            cia_index,
        })
    }

    /// The CIA index flattened to (`2 * npairs`, ).
    pub fn cia_index_flat(&self) -> Vec<usize> {
        self.cia_index.iter().flatten().copied().collect()
    }
}

/// Interpolate the pressure axis of each gas's table onto `pressure` (Pa).
///
/// Interpolation is linear in pressure and clamped at the table edges; the
/// table's pressure axis must be strictly ascending. The temperature and
/// wavenumber axes are carried through unchanged.
pub fn interpolate_sigma(
    table: &CrossSectionTable,
    gases: &[String],
    pressure: &[f64],
    nwavenumber: usize,
) -> Result<Array4<f64>, AtmosphereError> {
    let npressure = table.pressure.len();
    let ntemperature = table.temperature.len();
    if npressure == 0 || ntemperature == 0 {
        return Err(AtmosphereError::InconsistentInputs(
            "cross-section table has an empty pressure or temperature axis",
        ));
    }

    if table.pressure.windows(2).any(|w| !(w[1] > w[0])) {
        return Err(AtmosphereError::InconsistentInputs(
            "cross-section pressure axis must be strictly ascending",
        ));
    }

    // The tables are tabulated in bar
    let brackets: Vec<_> = pressure
        .iter()
        .map(|p| bracket(p / BAR, &table.pressure))
        .collect();

    let mut sigma = Array4::zeros((gases.len(), pressure.len(), ntemperature, nwavenumber));

    for (gas_index, gas) in gases.iter().enumerate() {
        let xsec = table
            .xsec
            .get(gas)
            .ok_or_else(|| AtmosphereError::MissingCrossSection {
                kind: "absorption",
                name: gas.clone(),
            })?;
        if xsec.dim() != (npressure, ntemperature, nwavenumber) {
            return Err(AtmosphereError::InconsistentInputs(
                "cross-section table must be (npressure, ntemperature, nwavenumber)",
            ));
        }

        // Each layer only reads the table, so they are built in parallel
        let mut layers = Vec::new();
        brackets
            .par_iter()
            .map(|&(lo, hi, w)| {
                let lower = xsec.index_axis(Axis(0), lo);
                let upper = xsec.index_axis(Axis(0), hi);
                &lower * (1. - w) + &upper * w
            })
            .collect_into_vec(&mut layers);

        for (layer, values) in layers.iter().enumerate() {
            sigma.slice_mut(s![gas_index, layer, .., ..]).assign(values);
        }
        debug!("interpolated {gas} cross sections onto {} layers", pressure.len());
    }

    Ok(sigma)
}

/// Collect the Rayleigh cross sections of `gases`, one row each.
pub fn rayleigh_array(data: &AtmosphereData, gases: &[&str]) -> Result<Array2<f64>, AtmosphereError> {
    let nwavenumber = data.wavenumber.len();
    let mut rayleigh = Array2::zeros((gases.len(), nwavenumber));

    for (mut row, &gas) in rayleigh.outer_iter_mut().zip(gases) {
        let values = data
            .rayleigh
            .get(gas)
            .ok_or_else(|| AtmosphereError::MissingCrossSection {
                kind: "rayleigh",
                name: gas.to_owned(),
            })?;
        if values.len() != nwavenumber {
            return Err(AtmosphereError::InconsistentInputs(
                "rayleigh cross sections must have length nwavenumber",
            ));
        }
        row.assign(values);
    }

    Ok(rayleigh)
}

/// Collect the CIA cross sections of `pairs`.
pub fn cia_array(
    cia: &CiaTable,
    pairs: &[String],
    nwavenumber: usize,
) -> Result<Array3<f64>, AtmosphereError> {
    let ntemperature = cia.temperature.len();
    let mut out = Array3::zeros((pairs.len(), ntemperature, nwavenumber));

    for (mut slab, pair) in out.outer_iter_mut().zip(pairs) {
        let values = cia
            .xsec
            .get(pair)
            .ok_or_else(|| AtmosphereError::MissingCrossSection {
                kind: "cia",
                name: pair.clone(),
            })?;
        if values.dim() != (ntemperature, nwavenumber) {
            return Err(AtmosphereError::InconsistentInputs(
                "CIA table must be (ntemperature, nwavenumber)",
            ));
        }
        slab.assign(values);
    }

    Ok(out)
}

/// Resolve both gases of each CIA pair.
///
/// Active gases are searched first; inactive gases are offset by the number
/// of active gases, matching the row order of the Rayleigh array.
pub fn cia_gas_index(
    pairs: &[String],
    active: &[String],
    inactive: &[String],
) -> Result<Vec<[usize; 2]>, AtmosphereError> {
    pairs
        .iter()
        .map(|pair| {
            let gases: SmallVec<[&str; 2]> = pair.split('-').collect();
            if gases.len() != 2 {
                return Err(AtmosphereError::UnresolvedCiaGas {
                    pair: pair.clone(),
                    gas: pair.clone(),
                });
            }

            let mut index = [0; 2];
            for (slot, gas) in index.iter_mut().zip(&gases) {
                *slot = active
                    .iter()
                    .position(|g| g == gas)
                    .or_else(|| {
                        inactive
                            .iter()
                            .position(|g| g == gas)
                            .map(|i| active.len() + i)
                    })
                    .ok_or_else(|| AtmosphereError::UnresolvedCiaGas {
                        pair: pair.clone(),
                        gas: (*gas).to_owned(),
                    })?;
            }
            Ok(index)
        })
        .collect()
}
