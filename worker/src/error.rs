use std::{error::Error, fmt, io};

use comms::{IdentityErr, KeyErr};

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Worker runtime failures.
#[derive(Debug)]
pub enum WorkerErr {
    Io(io::Error),
    Key(KeyErr),
    Identity(IdentityErr),
    ShapeMismatch {
        key: String,
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    IncompatibleShapes {
        expected: Vec<usize>,
        got: Vec<usize>,
    },
    InvalidLayer {
        key: String,
    },
    MissingGradients {
        shard: usize,
        expected: usize,
        got: usize,
    },
    EmptyReduction,
    BackendUnavailable,
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::Io(e) => write!(f, "io error: {e}"),
            WorkerErr::Key(e) => write!(f, "configuration error: {e}"),
            WorkerErr::Identity(e) => write!(f, "invalid identity: {e}"),
            WorkerErr::ShapeMismatch { key, expected, got } => write!(
                f,
                "shape mismatch for `{key}`: expected {expected:?}, got {got:?}"
            ),
            WorkerErr::IncompatibleShapes { expected, got } => {
                write!(f, "can't combine tensors of shapes {expected:?} and {got:?}")
            }
            WorkerErr::InvalidLayer { key } => write!(
                f,
                "layer `{key}` is a momentum accumulator, only weights and biases can be trained"
            ),
            WorkerErr::MissingGradients {
                shard,
                expected,
                got,
            } => write!(
                f,
                "the trainer returned {got} gradients for shard {shard}, expected {expected}"
            ),
            WorkerErr::EmptyReduction => f.write_str("there are no gradients to reduce"),
            WorkerErr::BackendUnavailable => f.write_str("the tensor backend is unavailable"),
        }
    }
}

impl Error for WorkerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerErr::Io(e) => Some(e),
            WorkerErr::Key(e) => Some(e),
            WorkerErr::Identity(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for WorkerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<KeyErr> for WorkerErr {
    fn from(value: KeyErr) -> Self {
        Self::Key(value)
    }
}

impl From<IdentityErr> for WorkerErr {
    fn from(value: IdentityErr) -> Self {
        Self::Identity(value)
    }
}
