use crate::storage::Result;

/// Defines the rule for updating a parameter based on a pushed gradient or delta.
pub trait Optimizer {
    /// Updates the provided slice of parameters in place.
    ///
    /// # Arguments
    /// * `grad` - The pushed gradient or delta.
    /// * `params` - The parameters to update.
    ///
    /// # Returns
    /// An error if there's a mismatch in the sizes of `grad` and `params`.
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()>;
}
