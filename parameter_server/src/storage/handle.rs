use std::ops::Deref;

use tokio::task;

use super::{ParameterStore, StoreErr};

/// The async interface to interact with a `ParameterStore`.
///
/// It bridges the async runtime with the blocking implementation of the `ParameterStore`,
/// which requires the multi-thread runtime.
#[derive(Clone)]
pub struct ParameterHandle(ParameterStore);

impl Deref for ParameterHandle {
    type Target = ParameterStore;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ParameterHandle {
    /// Creates a new `ParameterHandle`
    ///
    /// # Arguments
    /// * `store` - The underlying parameter store.
    ///
    /// # Returns
    /// A new `ParameterHandle` instance.
    pub fn new(store: ParameterStore) -> Self {
        Self(store)
    }

    /// Async call to the synchronous implementation of `ParameterStore::pull`.
    pub async fn pull(&self, name: &str, out: &mut [f32]) -> Result<(), StoreErr> {
        task::block_in_place(|| self.0.pull(name, out))
    }

    /// Async call to the synchronous implementation of `ParameterStore::push`.
    pub async fn push(&self, name: &str, grad: &[f32], out: &mut [f32]) -> Result<(), StoreErr> {
        task::block_in_place(|| self.0.push(name, grad, out))
    }
}
