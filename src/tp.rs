//! Temperature-pressure profiles.
//!
//! A profile is evaluated in two phases. [`PreparedTp::prepare`] does the
//! one-time work for a variant (e.g. building the Rodgers correlation
//! matrix) and returns an immutable value; [`PreparedTp::evaluate`] then maps
//! a free-parameter vector to one temperature per layer, as often as the
//! optimizer asks. [`TpCache`] holds the prepared value between evaluations
//! and builds it exactly once, even when evaluations run in parallel.

mod expint;
mod guillot;
mod nodes;
mod points;
mod rodgers;
mod sampling;


pub use self::nodes::tp_from_nodes;
pub use self::sampling::sample_grid;

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use log::debug;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::AtmosphereError;
use crate::interp::interp_log_pressure;

/// The TP profile variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TpType {
    /// One temperature for every layer: `[T]`
    #[serde(rename = "isothermal")]
    Isothermal,
    /// Guillot (2010) two-stream profile: `[T_irr, kappa_ir, kappa_v1, kappa_v2, alpha]`
    #[serde(rename = "guillot")]
    Guillot,
    /// Layer-by-layer profile smoothed with a Rodgers (2000) correlation
    /// matrix: one temperature per layer
    #[serde(rename = "rodgers")]
    Rodgers,
    /// Rodgers smoothing blended with an external covariance, on an adaptive
    /// pressure subsample: `[alpha, T_1..T_m]`
    #[serde(rename = "hybrid")]
    Hybrid,
    /// Surface and tropopause, isothermal above: `[T1, dT, P1]`. `P1` is
    /// clamped to the pressure grid
    #[serde(rename = "2point")]
    TwoPoint,
    /// Surface and two intermediate points: `[T1, dT1, dT2, P1, P2]`. `P1` is
    /// clamped to the pressure grid and `P2` to at most `P1`
    #[serde(rename = "3point")]
    ThreePoint,
}

impl TpType {
    /// Every variant.
    pub const ALL: [TpType; 6] = [
        TpType::Isothermal,
        TpType::Guillot,
        TpType::Rodgers,
        TpType::Hybrid,
        TpType::TwoPoint,
        TpType::ThreePoint,
    ];

    /// Name used in configuration files.
    pub fn name(self) -> &'static str {
        match self {
            TpType::Isothermal => "isothermal",
            TpType::Guillot => "guillot",
            TpType::Rodgers => "rodgers",
            TpType::Hybrid => "hybrid",
            TpType::TwoPoint => "2point",
            TpType::ThreePoint => "3point",
        }
    }

    /// Length of the free-parameter vector.
    ///
    /// `nsample` is the size of the hybrid pressure subsample and is ignored
    /// by the other variants.
    pub fn num_params(self, nlayers: usize, nsample: usize) -> usize {
        match self {
            TpType::Isothermal => 1,
            TpType::Guillot => 5,
            TpType::Rodgers => nlayers,
            TpType::Hybrid => 1 + nsample,
            TpType::TwoPoint => 3,
            TpType::ThreePoint => 5,
        }
    }

    /// Labels of the free parameters, in order.
    pub fn parameter_names(self, nlayers: usize, nsample: usize) -> Vec<String> {
        let layers = |n: usize| (0..n).map(|i| format!("T_{i}"));
        match self {
            TpType::Isothermal => vec!["T".into()],
            TpType::Guillot => ["T_irr", "kappa_irr", "kappa_v1", "kappa_v2", "alpha"]
                .map(String::from)
                .to_vec(),
            TpType::Rodgers => layers(nlayers).collect(),
            TpType::Hybrid => std::iter::once("alpha".to_string())
                .chain(layers(nsample))
                .collect(),
            TpType::TwoPoint => ["T_surface", "T_trop", "P_trop"].map(String::from).to_vec(),
            TpType::ThreePoint => ["T_surface", "T_point1", "T_point2", "P_point1", "P_point2"]
                .map(String::from)
                .to_vec(),
        }
    }
}

impl fmt::Display for TpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TpType {
    type Err = AtmosphereError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TpType::ALL
            .into_iter()
            .find(|tp| tp.name() == s)
            .ok_or_else(|| AtmosphereError::UnknownTpType(s.to_owned()))
    }
}

/// An external TP covariance together with the pressure subsample it
/// selects, used by the hybrid profile.
#[derive(Debug, Clone, PartialEq)]
pub struct HybridCovariance {
    matrix: Array2<f64>,
    sample_index: Vec<usize>,
    sample_pressure: Vec<f64>,
}

impl HybridCovariance {
    /// Select the sampling grid from the first row of `matrix`, which must be
    /// (`nlayers`, `nlayers`) for the grid `pressure`.
    pub fn new(
        matrix: Array2<f64>,
        pressure: &[f64],
        threshold: f64,
        max_run: usize,
    ) -> Result<Self, AtmosphereError> {
        let nlayers = pressure.len();
        if matrix.dim() != (nlayers, nlayers) || nlayers == 0 {
            return Err(AtmosphereError::InconsistentInputs(
                "hybrid covariance must be (nlayers, nlayers)",
            ));
        }

        let reference = matrix.row(0).to_vec();
        let sample_index = sample_grid(&reference, threshold, max_run);
        let sample_pressure = sample_index.iter().map(|&i| pressure[i]).collect();
        debug!(
            "hybrid sampling grid has {} of {nlayers} layers",
            sample_index.len()
        );

        Ok(Self {
            matrix,
            sample_index,
            sample_pressure,
        })
    }

    /// The covariance matrix.
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    /// Selected layer indices, ascending, always including the first and
    /// last layer.
    pub fn sample_index(&self) -> &[usize] {
        &self.sample_index
    }

    /// Pressures of the selected layers.
    pub fn sample_pressure(&self) -> &[f64] {
        &self.sample_pressure
    }
}

/// What a variant needs to know besides its free parameters.
#[derive(Debug, Clone, Copy)]
pub struct TpSetup<'a> {
    /// Descending pressure grid in Pa
    pub pressure: &'a [f64],
    /// Rodgers correlation length, in scale heights
    pub corr_length: f64,
    /// External covariance, required by the hybrid variant
    pub hybrid: Option<&'a HybridCovariance>,
}

/// Variant-specific coefficients computed once by [`PreparedTp::prepare`].
#[derive(Debug, Clone)]
enum TpCoefficients {
    Isothermal,
    Guillot,
    /// Row-normalized Rodgers correlation matrix
    Rodgers { weights: Array2<f64> },
    /// Un-normalized Rodgers matrix, the external covariance, and the
    /// pressures of the free temperatures
    Hybrid {
        correlation: Array2<f64>,
        external: Array2<f64>,
        sample_pressure: Vec<f64>,
    },
    TwoPoint,
    ThreePoint,
}

/// A TP variant ready for evaluation.
#[derive(Debug, Clone)]
pub struct PreparedTp {
    pressure: Vec<f64>,
    coefficients: TpCoefficients,
}

impl PreparedTp {
    /// Validate the setup for `tp_type` and build its coefficients.
    pub fn prepare(tp_type: TpType, setup: &TpSetup<'_>) -> Result<Self, AtmosphereError> {
        Self::check(tp_type, setup)?;
        Ok(Self::build(tp_type, setup))
    }

    /// Everything that can fail in [`PreparedTp::prepare`].
    fn check(tp_type: TpType, setup: &TpSetup<'_>) -> Result<(), AtmosphereError> {
        let nlayers = setup.pressure.len();
        if nlayers < 2 {
            return Err(AtmosphereError::InconsistentInputs(
                "TP profiles need at least two layers",
            ));
        }
        if matches!(tp_type, TpType::Rodgers | TpType::Hybrid) && !(setup.corr_length > 0.) {
            return Err(AtmosphereError::InvalidOption {
                name: "tp_corr_length",
                value: setup.corr_length,
            });
        }
        if tp_type == TpType::Hybrid {
            let hybrid = setup
                .hybrid
                .ok_or(AtmosphereError::MissingOption("hybrid covariance"))?;
            if hybrid.matrix.dim() != (nlayers, nlayers) {
                return Err(AtmosphereError::InconsistentInputs(
                    "hybrid covariance must be (nlayers, nlayers)",
                ));
            }
        }
        Ok(())
    }

    /// Build the coefficients. The setup must have passed [`PreparedTp::check`].
    fn build(tp_type: TpType, setup: &TpSetup<'_>) -> Self {
        let coefficients = match tp_type {
            TpType::Isothermal => TpCoefficients::Isothermal,
            TpType::Guillot => TpCoefficients::Guillot,
            TpType::Rodgers => {
                let correlation = rodgers::correlation_matrix(setup.pressure, setup.corr_length);
                TpCoefficients::Rodgers {
                    weights: rodgers::row_normalized(&correlation),
                }
            }
            TpType::Hybrid => TpCoefficients::Hybrid {
                correlation: rodgers::correlation_matrix(setup.pressure, setup.corr_length),
                external: setup
                    .hybrid
                    .map(|hybrid| hybrid.matrix.clone())
                    .unwrap_or_default(),
                sample_pressure: setup
                    .hybrid
                    .map(|hybrid| hybrid.sample_pressure.clone())
                    .unwrap_or_default(),
            },
            TpType::TwoPoint => TpCoefficients::TwoPoint,
            TpType::ThreePoint => TpCoefficients::ThreePoint,
        };
        debug!("prepared {tp_type} TP profile for {} layers", setup.pressure.len());

        Self {
            pressure: setup.pressure.to_vec(),
            coefficients,
        }
    }

    /// The variant this was prepared for.
    pub fn tp_type(&self) -> TpType {
        match self.coefficients {
            TpCoefficients::Isothermal => TpType::Isothermal,
            TpCoefficients::Guillot => TpType::Guillot,
            TpCoefficients::Rodgers { .. } => TpType::Rodgers,
            TpCoefficients::Hybrid { .. } => TpType::Hybrid,
            TpCoefficients::TwoPoint => TpType::TwoPoint,
            TpCoefficients::ThreePoint => TpType::ThreePoint,
        }
    }

    /// Number of layers.
    pub fn nlayers(&self) -> usize {
        self.pressure.len()
    }

    fn nsample(&self) -> usize {
        match &self.coefficients {
            TpCoefficients::Hybrid {
                sample_pressure, ..
            } => sample_pressure.len(),
            _ => 0,
        }
    }

    /// Length of the free-parameter vector.
    pub fn num_params(&self) -> usize {
        self.tp_type().num_params(self.nlayers(), self.nsample())
    }

    /// Labels of the free parameters.
    pub fn parameter_names(&self) -> Vec<String> {
        self.tp_type().parameter_names(self.nlayers(), self.nsample())
    }

    /// Temperature in K for each layer, given the free parameters and the
    /// current surface gravity in m/s².
    ///
    /// Non-finite temperatures are returned as they are; rejecting them is up
    /// to the caller.
    pub fn evaluate(&self, params: &[f64], gravity: f64) -> Result<Vec<f64>, AtmosphereError> {
        let expected = self.num_params();
        if params.len() != expected {
            return Err(AtmosphereError::ParameterCount {
                tp_type: self.tp_type(),
                expected,
                found: params.len(),
            });
        }

        let pressure = &self.pressure;
        let temperature = match &self.coefficients {
            TpCoefficients::Isothermal => vec![params[0]; pressure.len()],
            TpCoefficients::Guillot => guillot::guillot2010(pressure, gravity, params),
            TpCoefficients::Rodgers { weights } => rodgers::smooth(weights, params),
            TpCoefficients::Hybrid {
                correlation,
                external,
                sample_pressure,
            } => {
                let t_interp = interp_log_pressure(pressure, sample_pressure, &params[1..]);
                rodgers::hybrid(correlation, external, params[0], &t_interp)
            }
            TpCoefficients::TwoPoint => points::two_point(pressure, params),
            TpCoefficients::ThreePoint => points::three_point(pressure, params),
        };

        Ok(temperature)
    }
}

/// Compute-once holder for a [`PreparedTp`].
///
/// The first [`TpCache::get_or_prepare`] builds the coefficients; concurrent
/// callers wait for that build and then share the result. The cache must be
/// invalidated whenever the variant or the hybrid covariance changes.
#[derive(Debug, Clone, Default)]
pub struct TpCache {
    prepared: OnceLock<PreparedTp>,
}

impl TpCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The prepared profile, if it has been built.
    pub fn get(&self) -> Option<&PreparedTp> {
        self.prepared.get()
    }

    /// Return the prepared profile, building it on first use.
    pub fn get_or_prepare(
        &self,
        tp_type: TpType,
        setup: &TpSetup<'_>,
    ) -> Result<&PreparedTp, AtmosphereError> {
        if let Some(prepared) = self.prepared.get() {
            return Ok(prepared);
        }
        PreparedTp::check(tp_type, setup)?;
        Ok(self
            .prepared
            .get_or_init(|| PreparedTp::build(tp_type, setup)))
    }

    /// Drop the prepared profile.
    pub fn invalidate(&mut self) {
        self.prepared = OnceLock::new();
    }
}
