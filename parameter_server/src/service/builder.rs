use std::{
    error::Error,
    fmt::{self, Display},
};

use comms::specs::server::ServerSpec;
use log::info;

use super::ParameterServer;
use crate::{
    initialization::{InitErr, InitPolicy},
    optimization::UpdatePolicy,
    storage::{ParameterHandle, ParameterStore},
};

/// Error returned when a `ServerSpec` can't be turned into a server.
#[derive(Debug)]
pub enum BuildErr {
    Init(InitErr),
    NoWorkers,
}

impl Display for BuildErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildErr::Init(e) => write!(f, "invalid initialization: {e}"),
            BuildErr::NoWorkers => f.write_str("the server must wait for at least one worker"),
        }
    }
}

impl Error for BuildErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BuildErr::Init(e) => Some(e),
            BuildErr::NoWorkers => None,
        }
    }
}

impl From<InitErr> for BuildErr {
    fn from(value: InitErr) -> Self {
        Self::Init(value)
    }
}

/// Builds `ParameterServer`s given a specification.
#[derive(Debug, Default)]
pub struct ServerBuilder {
    rank: u64,
}

impl ServerBuilder {
    /// Creates a new `ServerBuilder` for the server of rank 0.
    ///
    /// # Returns
    /// A new `ServerBuilder` instance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the rank of the server being built.
    ///
    /// The rank is mixed into the run seed, servers holding slices of the same key
    /// must not draw the same values for them.
    pub fn with_rank(mut self, rank: usize) -> Self {
        self.rank = rank as u64;
        self
    }

    /// Builds a new `ParameterServer` following a spec.
    ///
    /// # Arguments
    /// * `spec` - The specification of the parameter server.
    ///
    /// # Returns
    /// A new server or a `BuildErr` if the `ServerSpec` is invalid.
    pub fn build(&self, spec: &ServerSpec) -> Result<ParameterServer, BuildErr> {
        if spec.workers == 0 {
            return Err(BuildErr::NoWorkers);
        }

        let store = self.build_store(spec)?;
        Ok(ParameterServer::new(ParameterHandle::new(store)))
    }

    /// Builds only the `ParameterStore` of a spec.
    ///
    /// An absent seed is drawn once here and logged, so the run can be reproduced.
    ///
    /// # Arguments
    /// * `spec` - The specification of the parameter server.
    ///
    /// # Returns
    /// A new store or a `BuildErr` if the initialization is invalid.
    pub fn build_store(&self, spec: &ServerSpec) -> Result<ParameterStore, BuildErr> {
        let seed = spec.seed.unwrap_or_else(rand::random);
        info!(seed = seed, rank = self.rank; "initialization seed");

        let server_seed = seed ^ self.rank.wrapping_mul(0x9e37_79b9_7f4a_7c15);
        let init = InitPolicy::new(spec.init.clone(), server_seed)?;
        let update = UpdatePolicy::new(spec.update, spec.momentum);
        Ok(ParameterStore::new(init, update))
    }
}
