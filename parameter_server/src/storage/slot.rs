use comms::Key;

use super::{SizeMismatchErr, StoreErr};
use crate::optimization::{BoxedOptimizer, Optimizer};

/// A materialized parameter together with its update rule.
pub struct Slot {
    key: Key,
    params: Box<[f32]>,
    optimizer: BoxedOptimizer,
}

impl Slot {
    /// Creates a new `Slot`.
    ///
    /// # Arguments
    /// * `key` - The parsed key of the parameter.
    /// * `params` - The initial state of the parameter.
    /// * `optimizer` - The update rule resolved for `key`.
    ///
    /// # Returns
    /// A new `Slot` instance.
    pub fn new(key: Key, params: Box<[f32]>, optimizer: BoxedOptimizer) -> Self {
        Self {
            key,
            params,
            optimizer,
        }
    }

    /// Copies the current value into `out`.
    ///
    /// # Returns
    /// A `StoreErr::SizeMismatch` if `out` isn't the same size as the parameter.
    pub fn read_into(&self, out: &mut [f32]) -> Result<(), StoreErr> {
        self.check(out.len())?;
        out.copy_from_slice(&self.params);
        Ok(())
    }

    /// Applies `grad` through the update rule and copies the result into `out`.
    ///
    /// # Returns
    /// A `StoreErr::SizeMismatch` if `grad` or `out` aren't the same size as the parameter.
    pub fn update_into(&mut self, grad: &[f32], out: &mut [f32]) -> Result<(), StoreErr> {
        self.check(grad.len())?;
        self.check(out.len())?;

        self.optimizer
            .update_params(grad, &mut self.params)
            .map_err(|e| StoreErr::size_mismatch(self.key.name(), e))?;

        out.copy_from_slice(&self.params);
        Ok(())
    }

    fn check(&self, got: usize) -> Result<(), StoreErr> {
        SizeMismatchErr::check(self.params.len(), got)
            .map_err(|e| StoreErr::size_mismatch(self.key.name(), e))
    }
}
