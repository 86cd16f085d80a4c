use std::io;

use comms::{Key, Transport};

use crate::storage::{ParameterHandle, StoreErr};

/// A `Transport` that reaches a `ParameterStore` in the same process.
///
/// Requests go straight through a `ParameterHandle` without framing, which makes it a
/// single server deployment with every key owned by the local store.
#[derive(Clone)]
pub struct LocalTransport {
    handle: ParameterHandle,
}

impl LocalTransport {
    /// Creates a new `LocalTransport`.
    ///
    /// # Arguments
    /// * `handle` - The handle to the local parameter store.
    ///
    /// # Returns
    /// A new `LocalTransport` instance.
    pub fn new(handle: ParameterHandle) -> Self {
        Self { handle }
    }
}

fn invalid(err: StoreErr) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}

impl Transport for LocalTransport {
    async fn pull_weight(&mut self, buffer: &mut [f32], key: &Key) -> io::Result<()> {
        self.handle.pull(key.name(), buffer).await.map_err(invalid)
    }

    async fn push_grad_and_pull_weight(
        &mut self,
        grad: &[f32],
        buffer: &mut [f32],
        key: &Key,
    ) -> io::Result<()> {
        self.handle
            .push(key.name(), grad, buffer)
            .await
            .map_err(invalid)
    }

    async fn disconnect(&mut self) -> io::Result<()> {
        Ok(())
    }
}
