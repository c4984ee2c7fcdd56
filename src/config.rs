//! Construction-time configuration of an atmosphere.

use serde::{Deserialize, Serialize};

use crate::constants::{MJUP, RJUP};
use crate::error::AtmosphereError;
use crate::tp::TpType;

/// Cloud deck parameters, passed through unchanged to the forward model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CloudConfig {
    /// Pressure at the bottom of the cloud deck in Pa
    pub lower_pressure: f64,
    /// Pressure at the top of the cloud deck in Pa
    pub upper_pressure: f64,
    /// Power-law exponent of the cloud opacity
    pub m: f64,
    /// Amplitude of the cloud opacity
    pub a: f64,
}

/// Settings consumed once when an [`AtmosphereState`] is built.
///
/// Units are SI except for `mu`, which is given in AMU.
///
/// [`AtmosphereState`]: crate::atmosphere::AtmosphereState
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereConfig {
    /// TP profile variant
    pub tp_type: TpType,
    /// Number of atmospheric layers
    pub nlayers: usize,
    /// Pressure at the bottom of the atmosphere in Pa
    pub max_pressure: f64,
    /// Number of scale heights spanned by the pressure grid
    pub num_scale_heights: f64,
    /// Planet radius in m
    pub planet_radius: f64,
    /// Planet mass in kg
    pub planet_mass: f64,
    /// Initial isothermal temperature in K
    pub planet_temperature: f64,
    /// Derive the mean molecular weight from the gas mixture
    pub couple_mu: bool,
    /// Fixed mean molecular weight in AMU, used when `couple_mu` is false
    pub mu: f64,
    /// Correlation length of the Rodgers smoothing, in scale heights
    pub tp_corr_length: f64,
    /// Covariance change that selects a new hybrid sampling point
    pub hybrid_threshold: f64,
    /// Largest index gap allowed between hybrid sampling points
    pub hybrid_max_run: usize,
    /// Optional cloud deck
    pub clouds: Option<CloudConfig>,
    /// Collision-induced absorption pairs, e.g. "H2-He"
    pub cia_pairs: Vec<String>,
}

impl Default for AtmosphereConfig {
    fn default() -> Self {
        Self {
            tp_type: TpType::Isothermal,
            nlayers: 100,
            max_pressure: 1e6,
            num_scale_heights: 15.,
            planet_radius: RJUP,
            planet_mass: MJUP,
            planet_temperature: 1500.,
            couple_mu: false,
            mu: 2.3,
            tp_corr_length: 7.,
            hybrid_threshold: 0.05,
            hybrid_max_run: 10,
            clouds: None,
            cia_pairs: Vec::new(),
        }
    }
}

impl AtmosphereConfig {
    /// Parse a JSON configuration document. Missing fields take their
    /// default values.
    pub fn from_json_str(json: &str) -> Result<Self, AtmosphereError> {
        let config: Self = serde_json::from_str(json).map_err(|e| {
            // Unknown TP names get their own error variant
            match serde_json::from_str::<serde_json::Value>(json)
                .ok()
                .and_then(|v| v.get("tp_type")?.as_str().map(str::to_owned))
            {
                Some(name) if name.parse::<TpType>().is_err() => {
                    AtmosphereError::UnknownTpType(name)
                }
                _ => AtmosphereError::InvalidConfig(e.to_string()),
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check that every option is in range.
    pub fn validate(&self) -> Result<(), AtmosphereError> {
        let positive = [
            ("max_pressure", self.max_pressure),
            ("num_scale_heights", self.num_scale_heights),
            ("planet_radius", self.planet_radius),
            ("planet_mass", self.planet_mass),
            ("planet_temperature", self.planet_temperature),
            ("tp_corr_length", self.tp_corr_length),
        ];
        for (name, value) in positive {
            if !(value > 0. && value.is_finite()) {
                return Err(AtmosphereError::InvalidOption { name, value });
            }
        }
        if !self.couple_mu && !(self.mu > 0.) {
            return Err(AtmosphereError::InvalidOption {
                name: "mu",
                value: self.mu,
            });
        }
        if self.nlayers < 2 {
            return Err(AtmosphereError::InvalidOption {
                name: "nlayers",
                value: self.nlayers as f64,
            });
        }
        if !(self.hybrid_threshold >= 0.) {
            return Err(AtmosphereError::InvalidOption {
                name: "hybrid_threshold",
                value: self.hybrid_threshold,
            });
        }
        if self.hybrid_max_run == 0 {
            return Err(AtmosphereError::InvalidOption {
                name: "hybrid_max_run",
                value: 0.,
            });
        }
        if let Some(clouds) = &self.clouds {
            if !(clouds.lower_pressure > 0. && clouds.upper_pressure > 0.) {
                return Err(AtmosphereError::InvalidOption {
                    name: "clouds",
                    value: clouds.lower_pressure.min(clouds.upper_pressure),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_fills_defaults() {
        let config =
            AtmosphereConfig::from_json_str(r#"{"tp_type": "2point", "nlayers": 40}"#).unwrap();
        assert_eq!(config.tp_type, TpType::TwoPoint);
        assert_eq!(config.nlayers, 40);
        assert_eq!(config.max_pressure, 1e6);
        assert_eq!(config.hybrid_max_run, 10);
        assert!(config.clouds.is_none());
    }

    #[test]
    fn json_with_clouds_and_pairs() {
        let json = r#"{
            "tp_type": "guillot",
            "clouds": {"lower_pressure": 1e4, "upper_pressure": 1e2, "m": 1.0, "a": 0.5},
            "cia_pairs": ["H2-H2", "H2-He"]
        }"#;
        let config = AtmosphereConfig::from_json_str(json).unwrap();
        assert_eq!(config.cia_pairs, vec!["H2-H2", "H2-He"]);
        assert_eq!(config.clouds.unwrap().upper_pressure, 1e2);
    }

    #[test]
    fn unknown_tp_type_is_rejected() {
        let err = AtmosphereConfig::from_json_str(r#"{"tp_type": "polynomial"}"#).unwrap_err();
        assert_eq!(err, AtmosphereError::UnknownTpType("polynomial".into()));
    }

    #[test]
    fn malformed_json_is_invalid_config() {
        let err = AtmosphereConfig::from_json_str(r#"{"nlayers": "many"}"#).unwrap_err();
        assert!(matches!(err, AtmosphereError::InvalidConfig(_)));
    }

    #[test]
    fn out_of_range_options() {
        let config = AtmosphereConfig {
            planet_mass: 0.,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AtmosphereError::InvalidOption {
                name: "planet_mass",
                ..
            })
        ));

        let config = AtmosphereConfig {
            nlayers: 1,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = AtmosphereConfig {
            hybrid_max_run: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
