pub mod accumulate;
pub mod backend;
pub mod client;
pub mod error;
pub mod partition;
pub mod reduce;
pub mod strategy;
pub mod trainer;
pub mod worker;

pub use client::SyncClient;
pub use error::WorkerErr;
pub use worker::{EpochStats, Worker};
