use comms::{Key, Transport};
use log::debug;
use ndarray::{ArrayD, IxDyn};

use crate::error::Result;

/// The only part of the worker that talks to the parameter servers.
///
/// Calls don't return until the server replied, and at most one is outstanding at a
/// time since every call borrows the client mutably. Transport failures are passed on
/// untouched, a failed push may or may not have been applied.
pub struct SyncClient<T: Transport> {
    transport: T,
    send_buf: Vec<f32>,
}

impl<T: Transport> SyncClient<T> {
    /// Creates a new `SyncClient`.
    ///
    /// # Args
    /// * `transport` - The transport to the parameter servers.
    ///
    /// # Returns
    /// A new `SyncClient` instance.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            send_buf: Vec::new(),
        }
    }

    /// Fetches the current value of `key`.
    ///
    /// # Args
    /// * `key` - The parameter to fetch.
    /// * `shape` - The shape of the parameter.
    ///
    /// # Errors
    /// Returns `WorkerErr::Io` if the transport failed.
    pub async fn pull(&mut self, key: &Key, shape: &[usize]) -> Result<ArrayD<f32>> {
        let mut out = ArrayD::zeros(IxDyn(shape));
        // SAFETY: A freshly allocated tensor is in standard layout.
        let buffer = out.as_slice_mut().unwrap();

        debug!(key = key.name(); "pull");
        self.transport.pull_weight(buffer, key).await?;
        Ok(out)
    }

    /// Submits `delta` for `key` and returns the value the server holds after applying it.
    ///
    /// # Args
    /// * `key` - The parameter to update.
    /// * `delta` - The gradient or delta, with the shape of the parameter.
    ///
    /// # Errors
    /// Returns `WorkerErr::Io` if the transport failed.
    pub async fn push_and_pull(&mut self, key: &Key, delta: &ArrayD<f32>) -> Result<ArrayD<f32>> {
        let Self {
            transport,
            send_buf,
        } = self;

        let grad = match delta.as_slice() {
            Some(grad) => grad,
            None => {
                send_buf.clear();
                send_buf.extend(delta.iter());
                send_buf.as_slice()
            }
        };

        let mut out = ArrayD::zeros(delta.raw_dim());
        // SAFETY: A freshly allocated tensor is in standard layout.
        let buffer = out.as_slice_mut().unwrap();

        debug!(key = key.name(); "push and pull");
        transport.push_grad_and_pull_weight(grad, buffer, key).await?;
        Ok(out)
    }

    /// Releases the connections to the servers.
    ///
    /// # Errors
    /// Returns `WorkerErr::Io` if the transport failed.
    pub async fn disconnect(&mut self) -> Result<()> {
        self.transport.disconnect().await?;
        Ok(())
    }
}
