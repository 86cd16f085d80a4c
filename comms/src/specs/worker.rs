use std::{net::SocketAddr, num::NonZeroUsize};

use serde::{Deserialize, Serialize};

/// A tensor of the model, its key and shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub key: String,
    pub shape: Vec<usize>,
}

/// The tensor backend used to combine gradients on the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendSpec {
    #[default]
    Cpu,
    Unavailable,
}

/// When gradients leave the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncSpec {
    /// A push and pull for every computed step.
    #[default]
    Dense,
    /// Accumulate `cycle` steps locally before each push and pull.
    Bulk { cycle: NonZeroUsize },
}

/// What the worker pushes, must agree with the server's `UpdateSpec`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConventionSpec {
    /// Push the gradient into the weight key, scaled by `-learning_rate` if given.
    Direct { learning_rate: Option<f32> },
    /// Push into the momentum key, read back the delta and push it into the weight key.
    ClientMomentum {
        learning_rate: f32,
        #[serde(default)]
        weight_decay: f32,
    },
}

/// The specification for a worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub servers: Vec<SocketAddr>,
    pub layers: Vec<LayerSpec>,
    pub devices: NonZeroUsize,
    #[serde(default)]
    pub backend: BackendSpec,
    #[serde(default)]
    pub sync: SyncSpec,
    pub convention: ConventionSpec,
    pub epochs: usize,
    /// The total amount of data shards per epoch, across all workers.
    pub shards: usize,
    /// Tensors with at least this many elements are sliced across every server.
    #[serde(default = "default_min_slice_size")]
    pub min_slice_size: usize,
}

fn default_min_slice_size() -> usize {
    crate::DEFAULT_MIN_SLICE_LEN
}
