use std::{
    error::Error,
    fmt::{self, Display},
};

use comms::KeyErr;

use crate::initialization::RandErr;

/// The specific result type for size mismatch checks inside the optimization rules.
pub type Result<T> = std::result::Result<T, SizeMismatchErr>;

/// Error returned whenever there is a size mismatch between gradients, parameters
/// and external buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeMismatchErr {
    pub expected: usize,
    pub got: usize,
}

impl SizeMismatchErr {
    /// Checks that a buffer of `got` elements fits a parameter of `expected` elements.
    pub fn check(expected: usize, got: usize) -> Result<()> {
        if expected != got {
            return Err(Self { expected, got });
        }

        Ok(())
    }
}

impl Display for SizeMismatchErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "the provided buffer length {} doesn't match the parameter size {}",
            self.got, self.expected
        )
    }
}

impl Error for SizeMismatchErr {}

/// Configuration errors raised by the `ParameterStore`, all of them are fatal.
#[derive(Debug)]
pub enum StoreErr {
    Key(KeyErr),
    SizeMismatch {
        key: String,
        expected: usize,
        got: usize,
    },
    Init {
        key: String,
        source: RandErr,
    },
}

impl StoreErr {
    pub(super) fn size_mismatch(key: &str, err: SizeMismatchErr) -> Self {
        Self::SizeMismatch {
            key: key.to_string(),
            expected: err.expected,
            got: err.got,
        }
    }
}

impl Display for StoreErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreErr::Key(e) => write!(f, "{e}"),
            StoreErr::SizeMismatch { key, expected, got } => write!(
                f,
                "size mismatch for parameter `{key}`: expected {expected} elements, got {got}"
            ),
            StoreErr::Init { key, source } => {
                write!(f, "failed to initialize parameter `{key}`: {source}")
            }
        }
    }
}

impl Error for StoreErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreErr::Key(e) => Some(e),
            StoreErr::Init { source, .. } => Some(source),
            StoreErr::SizeMismatch { .. } => None,
        }
    }
}

impl From<KeyErr> for StoreErr {
    fn from(value: KeyErr) -> Self {
        Self::Key(value)
    }
}
