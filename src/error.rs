use crate::tp::TpType;

/// Broad classes of [`AtmosphereError`].
///
/// Both are fatal for the operation that raised them. Configuration errors
/// surface at construction; dimension mismatches surface before any numeric
/// evaluation takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A configuration value is unknown, missing, or out of range
    Configuration,
    /// An input has the wrong length or shape
    DimensionMismatch,
}

/// Possible atmosphere errors.
#[derive(Debug, Clone, PartialEq)]
pub enum AtmosphereError {
    /// The TP profile name is not one of the known variants
    UnknownTpType(String),
    /// The configuration document could not be parsed
    InvalidConfig(String),
    /// A required option was not supplied
    MissingOption(&'static str),
    /// An option has a value outside its valid range
    InvalidOption {
        /// Name of the option
        name: &'static str,
        /// The offending value
        value: f64,
    },
    /// A gas is listed more than once
    DuplicateGas(String),
    /// No molecular weight is known for the gas
    UnknownGas(String),
    /// The data provider has no cross-section table for a gas or pair
    MissingCrossSection {
        /// Which table was searched ("absorption", "rayleigh", "cia")
        kind: &'static str,
        /// Gas or pair name
        name: String,
    },
    /// A CIA pair constituent is in neither gas list
    UnresolvedCiaGas {
        /// The full pair name, e.g. "H2-He"
        pair: String,
        /// The constituent that could not be found
        gas: String,
    },
    /// The TP parameter vector has the wrong length for the variant
    ParameterCount {
        /// Selected TP variant
        tp_type: TpType,
        /// Number of parameters the variant takes
        expected: usize,
        /// Number of parameters supplied
        found: usize,
    },
    /// The inputs don't have the expected shape(s)
    InconsistentInputs(&'static str),
    /// An array is not contiguous when it was assumed to be
    NotContiguous,
}

impl AtmosphereError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AtmosphereError::ParameterCount { .. }
            | AtmosphereError::InconsistentInputs(_)
            | AtmosphereError::NotContiguous => ErrorKind::DimensionMismatch,
            _ => ErrorKind::Configuration,
        }
    }
}

impl std::fmt::Display for AtmosphereError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AtmosphereError::UnknownTpType(name) => {
                write!(f, "invalid TP profile name: {name:?}")
            }
            AtmosphereError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            AtmosphereError::MissingOption(name) => {
                write!(f, "required option {name:?} was not given")
            }
            AtmosphereError::InvalidOption { name, value } => {
                write!(f, "option {name:?} has invalid value {value}")
            }
            AtmosphereError::DuplicateGas(gas) => write!(f, "gas {gas:?} is listed twice"),
            AtmosphereError::UnknownGas(gas) => {
                write!(f, "no molecular weight known for gas {gas:?}")
            }
            AtmosphereError::MissingCrossSection { kind, name } => {
                write!(f, "no {kind} cross section for {name:?}")
            }
            AtmosphereError::UnresolvedCiaGas { pair, gas } => {
                write!(f, "CIA pair {pair:?}: gas {gas:?} is not an active or inactive gas")
            }
            AtmosphereError::ParameterCount {
                tp_type,
                expected,
                found,
            } => write!(
                f,
                "TP profile {tp_type} takes {expected} parameters, but {found} were given"
            ),
            AtmosphereError::InconsistentInputs(what) => {
                write!(f, "inputs have the wrong shape: {what}")
            }
            AtmosphereError::NotContiguous => write!(f, "array slice not contiguous in memory"),
        }
    }
}

impl std::error::Error for AtmosphereError {}
