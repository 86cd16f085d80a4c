use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

use tokio::task::JoinError;

use crate::storage::StoreErr;

/// The parameter server's result type.
pub type Result<T> = std::result::Result<T, ServerErr>;

/// Failures that stop a `ParameterServer`.
#[derive(Debug)]
pub enum ServerErr {
    Io(io::Error),
    Store(StoreErr),
    RankSizeChanged { expected: usize, got: usize },
    UnexpectedMessage { got: &'static str },
    PullTooLarge { key: String, len: usize },
    Join(JoinError),
}

impl Display for ServerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerErr::Io(e) => write!(f, "io error: {e}"),
            ServerErr::Store(e) => write!(f, "configuration error: {e}"),
            ServerErr::RankSizeChanged { expected, got } => write!(
                f,
                "configuration error: rank size changed mid run, expected {expected}, got {got}"
            ),
            ServerErr::UnexpectedMessage { got } => {
                write!(f, "received an unexpected message kind: {got}")
            }
            ServerErr::PullTooLarge { key, len } => write!(
                f,
                "configuration error: pull of {len} elements for `{key}` exceeds the frame limit"
            ),
            ServerErr::Join(e) => write!(f, "connection task failed: {e}"),
        }
    }
}

impl Error for ServerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ServerErr::Io(e) => Some(e),
            ServerErr::Store(e) => Some(e),
            ServerErr::Join(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ServerErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<StoreErr> for ServerErr {
    fn from(value: StoreErr) -> Self {
        Self::Store(value)
    }
}

impl From<JoinError> for ServerErr {
    fn from(value: JoinError) -> Self {
        Self::Join(value)
    }
}
