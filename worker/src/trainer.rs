use ndarray::ArrayD;

use crate::error::Result;

/// The external tensor engine computing the gradients of a model.
pub trait Trainer: Send {
    /// Should compute one gradient per layer for the data shard `shard` on `device`.
    ///
    /// # Args
    /// * `device` - The local device running the computation.
    /// * `shard` - The data shard index.
    /// * `params` - The current value of every layer, in layout order.
    ///
    /// # Returns
    /// The gradients, in the same order and shapes as `params`.
    fn gradients(
        &mut self,
        device: usize,
        shard: usize,
        params: &[ArrayD<f32>],
    ) -> Result<Vec<ArrayD<f32>>>;
}

/// A quadratic loss `sum w²`, its gradient is `2w`.
#[derive(Debug, Default)]
pub struct MockTrainer;

impl Trainer for MockTrainer {
    fn gradients(
        &mut self,
        _device: usize,
        _shard: usize,
        params: &[ArrayD<f32>],
    ) -> Result<Vec<ArrayD<f32>>> {
        Ok(params.iter().map(|p| p * 2f32).collect())
    }
}
