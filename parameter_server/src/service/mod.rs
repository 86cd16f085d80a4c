mod builder;
mod error;
mod pserver;

pub use builder::{BuildErr, ServerBuilder};
pub use error::ServerErr;
pub use pserver::ParameterServer;
