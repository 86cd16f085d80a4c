use std::{
    error::Error,
    fmt::{self, Display},
};

use comms::KeyErr;
use rand_distr::{NormalError, uniform::Error as UniformError};

/// The specific result type for the different instances of `RandParamGen` generators.
pub type Result<T> = std::result::Result<T, RandErr>;

/// Error returned by the `RandParamGen` constructors whenever there is an error creating
/// a new instance of the struct, each constructor has it's own constraints given that
/// they use different distributions.
#[derive(Debug)]
pub enum RandErr {
    Normal(NormalError),
    Uniform(UniformError),
}

impl From<NormalError> for RandErr {
    fn from(value: NormalError) -> Self {
        Self::Normal(value)
    }
}

impl From<UniformError> for RandErr {
    fn from(value: UniformError) -> Self {
        Self::Uniform(value)
    }
}

impl Display for RandErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RandErr::Normal(e) => write!(f, "invalid normal distribution: {e}"),
            RandErr::Uniform(e) => write!(f, "invalid uniform distribution: {e}"),
        }
    }
}

impl Error for RandErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            RandErr::Normal(e) => Some(e),
            RandErr::Uniform(e) => Some(e),
        }
    }
}

/// Error returned when an `InitSpec` can't become an `InitPolicy`.
#[derive(Debug)]
pub enum InitErr {
    Rand(RandErr),
    /// An override whose name isn't a valid parameter key, it could never be used.
    Override(KeyErr),
    /// Momentum accumulators always start at zero and can't be overridden.
    MomentumOverride { key: String },
}

impl From<RandErr> for InitErr {
    fn from(value: RandErr) -> Self {
        Self::Rand(value)
    }
}

impl From<KeyErr> for InitErr {
    fn from(value: KeyErr) -> Self {
        Self::Override(value)
    }
}

impl Display for InitErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitErr::Rand(e) => write!(f, "{e}"),
            InitErr::Override(e) => write!(f, "invalid initialization override: {e}"),
            InitErr::MomentumOverride { key } => {
                write!(f, "`{key}` is a momentum accumulator, it can't be overridden")
            }
        }
    }
}

impl Error for InitErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InitErr::Rand(e) => Some(e),
            InitErr::Override(e) => Some(e),
            InitErr::MomentumOverride { .. } => None,
        }
    }
}
