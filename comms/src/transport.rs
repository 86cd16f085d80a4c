use std::io;

use crate::key::Key;

/// The boundary between the synchronization core and whatever moves bytes to the servers.
///
/// Every call suspends the caller until the reply has arrived. Failures are reported as-is,
/// no retry is ever attempted at this layer: a push that failed ambiguously may or may not
/// have been applied by the server.
#[allow(unused)]
#[trait_variant::make(Transport: Send)]
pub trait TransportTemplate {
    /// Should fill `buffer` with the current value of `key`.
    ///
    /// # Arguments
    /// * `buffer` - Where the parameter will be written to, its length is the size of the parameter.
    /// * `key` - The parameter to fetch.
    ///
    /// # Returns
    /// An io error if occurred.
    async fn pull_weight(&mut self, buffer: &mut [f32], key: &Key) -> io::Result<()>;

    /// Should submit `grad` for `key` and, once the server applied it, write the updated value into `buffer`.
    ///
    /// # Arguments
    /// * `grad` - The gradient or delta to submit.
    /// * `buffer` - Where the updated parameter will be written to.
    /// * `key` - The parameter to update.
    ///
    /// # Returns
    /// An io error if occurred.
    async fn push_grad_and_pull_weight(
        &mut self,
        grad: &[f32],
        buffer: &mut [f32],
        key: &Key,
    ) -> io::Result<()>;

    /// Should release the connection to the servers.
    ///
    /// # Returns
    /// An io error if occurred.
    async fn disconnect(&mut self) -> io::Result<()>;
}
