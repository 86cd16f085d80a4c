mod error;
mod handle;
mod slot;
mod store;

pub use error::{Result, SizeMismatchErr, StoreErr};
pub use handle::ParameterHandle;
use slot::Slot;
pub use store::ParameterStore;
