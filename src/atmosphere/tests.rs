use std::collections::HashMap;

use approx::assert_relative_eq;
use ndarray::{Array1, Array2, Array3};

use super::*;
use crate::constants::{G, KBOLTZ};
use crate::data::{CiaTable, CrossSectionTable};
use crate::error::ErrorKind;

const NWAVENUMBER: usize = 4;

fn hot_jupiter_data() -> AtmosphereData {
    let pressure = vec![1e-6, 1e-3, 1., 10., 100.];
    let temperature = vec![500., 1000., 1500., 2000.];
    let xsec = |scale: f64| {
        Array3::from_shape_fn((5, 4, NWAVENUMBER), |(ip, it, iw)| {
            scale * 1e-26 * (1. + ip as f64) * (1. + it as f64) / (1. + iw as f64)
        })
    };

    AtmosphereData {
        wavenumber: vec![500., 1000., 2000., 4000.],
        active_gases: vec![("H2O".into(), 1e-4), ("CH4".into(), 1e-5)],
        inactive_gases: vec![("H2".into(), 0.85), ("He".into(), 0.15)],
        molecular_weights: HashMap::new(),
        cross_sections: CrossSectionTable {
            pressure,
            temperature,
            xsec: HashMap::from([("H2O".into(), xsec(1.)), ("CH4".into(), xsec(3.))]),
        },
        rayleigh: ["H2O", "CH4", "H2", "He"]
            .into_iter()
            .map(|gas| (gas.to_owned(), Array1::from_elem(NWAVENUMBER, 1e-31)))
            .collect(),
        cia: CiaTable {
            temperature: vec![1000., 2000.],
            xsec: HashMap::from([
                ("H2-H2".into(), Array2::from_elem((2, NWAVENUMBER), 1e-45)),
                ("H2-He".into(), Array2::from_elem((2, NWAVENUMBER), 2e-45)),
            ]),
        },
    }
}

fn config() -> AtmosphereConfig {
    AtmosphereConfig {
        nlayers: 100,
        max_pressure: 1e6,
        num_scale_heights: 15.,
        planet_temperature: 1500.,
        cia_pairs: vec!["H2-H2".into(), "H2-He".into()],
        ..Default::default()
    }
}

fn covariance(nlayers: usize) -> Array2<f64> {
    Array2::from_shape_fn((nlayers, nlayers), |(i, j)| {
        (-(i.abs_diff(j) as f64) / 12.).exp()
    })
}

#[test]
fn isothermal_end_to_end() {
    let mut atm = AtmosphereState::new(&hot_jupiter_data(), config(), None, None).unwrap();

    let p = atm.pressure_profile();
    assert_eq!(p.len(), 100);
    assert_eq!(p[0], 1e6);
    assert_relative_eq!(p[99], 1e6 * (-15f64).exp(), max_relative = 1e-12);

    atm.set_tp_profile(&[1500.]).unwrap();
    atm.update().unwrap();

    assert!(atm.temperature_profile().iter().all(|&t| t == 1500.));
    let z = atm.altitude_profile();
    assert_eq!(z.len(), 100);
    assert_eq!(z[0], 0.);
    assert!(z.windows(2).all(|w| w[1] > w[0]));

    let g = G * atm.planet_mass() / atm.planet_radius().powi(2);
    assert_relative_eq!(atm.gravity(), g, max_relative = 1e-12);
    assert_relative_eq!(
        atm.scale_height(),
        KBOLTZ * 1500. / (2.3 * AMU * g),
        max_relative = 1e-12
    );
    assert_relative_eq!(atm.density_profile()[0], 1e6 / (KBOLTZ * 1500.), max_relative = 1e-12);
}

#[test]
fn array_shapes_and_flat_views() {
    let atm = AtmosphereState::new(&hot_jupiter_data(), config(), None, None).unwrap();

    assert_eq!(atm.sigma_array().dim(), (2, 100, 4, NWAVENUMBER));
    assert_eq!(atm.sigma_rayleigh_array().dim(), (4, NWAVENUMBER));
    assert_eq!(atm.sigma_cia_array().dim(), (2, 2, NWAVENUMBER));

    assert_eq!(atm.sigma_array_flat().unwrap().len(), 2 * 100 * 4 * NWAVENUMBER);
    assert_eq!(atm.sigma_rayleigh_array_flat().unwrap().len(), 4 * NWAVENUMBER);
    assert_eq!(atm.sigma_cia_array_flat().unwrap().len(), 2 * 2 * NWAVENUMBER);
    assert_eq!(atm.cia_index(), vec![2, 2, 2, 3]);

    // The bottom layer sits on the 10 bar node of the table
    let bottom = atm.sigma_array()[[0, 0, 0, 0]];
    assert_relative_eq!(bottom, 4e-26, max_relative = 1e-12);
}

#[test]
fn update_follows_gravity() {
    let mut atm = AtmosphereState::new(&hot_jupiter_data(), config(), None, None).unwrap();
    let z_before = atm.altitude_profile()[99];

    atm.set_planet_mass(atm.planet_mass() * 2.);
    atm.update().unwrap();

    // Twice the gravity halves the scale height
    assert_relative_eq!(atm.altitude_profile()[99], z_before / 2., max_relative = 1e-12);
    assert_eq!(atm.pressure_profile()[0], 1e6);

    atm.set_planet_mass(-1.);
    assert!(atm.update().is_err());
}

#[test]
fn update_uses_new_temperature() {
    let mut atm = AtmosphereState::new(&hot_jupiter_data(), config(), None, None).unwrap();
    let h_before = atm.scale_height();
    let n_before = atm.density_profile()[10];

    atm.set_tp_profile(&[750.]).unwrap();
    atm.update().unwrap();

    assert_relative_eq!(atm.scale_height(), h_before / 2., max_relative = 1e-12);
    assert_relative_eq!(atm.density_profile()[10], n_before * 2., max_relative = 1e-12);
}

#[test]
fn tp_type_override_and_reselection() {
    let mut atm =
        AtmosphereState::new(&hot_jupiter_data(), config(), Some(TpType::TwoPoint), None).unwrap();
    assert_eq!(atm.tp_type(), TpType::TwoPoint);
    assert_eq!(atm.tp_parameter_names().unwrap().len(), 3);
    atm.set_tp_profile(&[2000., 800., 1e3]).unwrap();
    assert_eq!(atm.temperature_profile()[0], 2000.);

    atm.set_tp_type(TpType::Rodgers, None).unwrap();
    assert_eq!(atm.prepared_tp().unwrap().tp_type(), TpType::Rodgers);
    assert_eq!(atm.prepared_tp().unwrap().num_params(), 100);

    let err = atm.set_tp_profile(&[2000., 800., 1e3]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
}

#[test]
fn hybrid_needs_covariance_at_construction() {
    let err = AtmosphereState::new(&hot_jupiter_data(), config(), Some(TpType::Hybrid), None)
        .unwrap_err();
    assert_eq!(err, AtmosphereError::MissingOption("hybrid covariance"));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}

#[test]
fn hybrid_second_stage() {
    let atm = AtmosphereState::new(
        &hot_jupiter_data(),
        config(),
        Some(TpType::Hybrid),
        Some(covariance(100)),
    )
    .unwrap();

    let hybrid = atm.hybrid_covariance().unwrap();
    let nsample = hybrid.sample_index().len();
    assert_eq!(hybrid.sample_index()[0], 0);
    assert_eq!(hybrid.sample_index()[nsample - 1], 99);

    let mut params = vec![1400.; nsample + 1];
    params[0] = 0.5;
    let t = atm.evaluate_tp(&params).unwrap();
    assert_eq!(t.len(), 100);
    for t in t {
        assert_relative_eq!(t, 1400., max_relative = 1e-12);
    }
}

#[test]
fn new_covariance_invalidates_cache() {
    let mut atm = AtmosphereState::new(
        &hot_jupiter_data(),
        config(),
        Some(TpType::Hybrid),
        Some(covariance(100)),
    )
    .unwrap();
    let before = atm.prepared_tp().unwrap().num_params();

    // A reference row that changes by more than the threshold every layer
    // samples every layer
    let steep = Array2::from_shape_fn((100, 100), |(_, j)| 1. + 0.06 * j as f64);
    atm.set_hybrid_covariance(steep).unwrap();
    let after = atm.prepared_tp().unwrap().num_params();
    assert_eq!(after, 101);
    assert!(before < after);

    assert!(atm.set_hybrid_covariance(Array2::eye(99)).is_err());
}

#[test]
fn batch_matches_single_evaluations() {
    let atm = AtmosphereState::new(&hot_jupiter_data(), config(), Some(TpType::Guillot), None)
        .unwrap();
    let samples = ndarray::arr2(&[
        [1200., 0.01, 0.005, 0.01, 0.1],
        [1500., 0.02, 0.001, 0.03, 0.5],
        [1800., 0.05, 0.01, 0.02, 0.9],
    ]);

    let batch = atm.evaluate_tp_batch(samples.view());
    assert_eq!(batch.len(), 3);
    for (row, result) in samples.outer_iter().zip(batch) {
        let single = atm.evaluate_tp(row.as_slice().unwrap()).unwrap();
        assert_eq!(result.unwrap(), single);
    }

    // Column-major rows are not contiguous
    let column_major = samples.t().to_owned().reversed_axes();
    assert!(column_major.row(0).as_slice().is_none());
    for (a, b) in atm
        .evaluate_tp_batch(column_major.view())
        .into_iter()
        .zip(atm.evaluate_tp_batch(samples.view()))
    {
        assert_eq!(a.unwrap(), b.unwrap());
    }

    let wrong = Array2::zeros((2, 4));
    assert!(atm
        .evaluate_tp_batch(wrong.view())
        .iter()
        .all(|r| r.is_err()));
}

#[test]
fn coupled_mu_follows_mixing_ratios() {
    let config = AtmosphereConfig {
        couple_mu: true,
        ..config()
    };
    let mut atm = AtmosphereState::new(&hot_jupiter_data(), config, None, None).unwrap();
    let mu_before = atm.mu()[0];
    assert!(mu_before / AMU > 2. && mu_before / AMU < 2.5);

    let active = Array2::from_shape_fn((2, 100), |(gas, _)| if gas == 0 { 0.1 } else { 0. });
    atm.set_mixing_ratios(active, None).unwrap();
    assert!(atm.mu()[0] > mu_before);
    assert_eq!(atm.active_mixratio()[[0, 50]], 0.1);

    assert!(atm.set_mixing_ratios(Array2::zeros((3, 100)), None).is_err());
}

#[test]
fn failed_mixing_ratio_update_keeps_state() {
    let config = AtmosphereConfig {
        couple_mu: true,
        ..config()
    };
    let mut atm = AtmosphereState::new(&hot_jupiter_data(), config, None, None).unwrap();
    let active_before = atm.active_mixratio().clone();
    let mu_before = atm.mu().to_vec();

    let err = atm
        .set_mixing_ratios(Array2::from_elem((2, 100), 0.2), Some(Array2::zeros((5, 100))))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DimensionMismatch);
    assert_eq!(atm.active_mixratio(), &active_before);
    assert_eq!(atm.mu(), mu_before.as_slice());

    // The stored mixture still reproduces the stored mu
    let weights = atm.composition().molecular_weights(&HashMap::new()).unwrap();
    let mu = atm.composition().coupled_mu(&weights);
    for (a, b) in mu.iter().zip(atm.mu()) {
        assert_relative_eq!(a, b, max_relative = 1e-12);
    }
}

#[test]
fn clouds_are_passed_through() {
    let config = AtmosphereConfig {
        clouds: Some(CloudConfig {
            lower_pressure: 1e4,
            upper_pressure: 1e2,
            m: 1.,
            a: 0.2,
        }),
        ..config()
    };
    let atm = AtmosphereState::new(&hot_jupiter_data(), config, None, None).unwrap();
    assert_eq!(atm.clouds().unwrap().lower_pressure, 1e4);
}

#[test]
fn construction_errors() {
    let mut data = hot_jupiter_data();
    data.rayleigh.remove("He");
    let err = AtmosphereState::new(&data, config(), None, None).unwrap_err();
    assert_eq!(
        err,
        AtmosphereError::MissingCrossSection {
            kind: "rayleigh",
            name: "He".into()
        }
    );

    let config = AtmosphereConfig {
        cia_pairs: vec!["H2-N2".into()],
        ..config()
    };
    let mut data = hot_jupiter_data();
    data.cia
        .xsec
        .insert("H2-N2".into(), Array2::zeros((2, NWAVENUMBER)));
    let err = AtmosphereState::new(&data, config, None, None).unwrap_err();
    assert!(matches!(err, AtmosphereError::UnresolvedCiaGas { .. }));
    assert_eq!(err.kind(), ErrorKind::Configuration);
}
