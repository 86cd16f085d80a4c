pub mod initialization;
mod local;
pub mod optimization;
pub mod service;
pub mod storage;

pub use local::LocalTransport;
pub use service::{ParameterServer, ServerBuilder};
pub use storage::{ParameterHandle, ParameterStore};
