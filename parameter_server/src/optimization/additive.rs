use super::Optimizer;
use crate::storage::{Result, SizeMismatchErr};

/// Applies an already scaled delta, `params += delta`.
#[derive(Debug, Default)]
pub struct Additive;

impl Optimizer for Additive {
    fn update_params(&mut self, delta: &[f32], params: &mut [f32]) -> Result<()> {
        SizeMismatchErr::check(params.len(), delta.len())?;
        params.iter_mut().zip(delta).for_each(|(p, d)| *p += d);
        Ok(())
    }
}
