use super::Optimizer;
use crate::storage::{Result, SizeMismatchErr};

/// Plain SGD applied by the server, `params -= learning_rate * grad`.
#[derive(Debug)]
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }
}

impl Optimizer for GradientDescent {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        SizeMismatchErr::check(params.len(), grad.len())?;

        params
            .iter_mut()
            .zip(grad)
            .for_each(|(param, g)| *param -= self.learning_rate * g);

        Ok(())
    }
}
