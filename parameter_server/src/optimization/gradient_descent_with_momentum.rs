use super::Optimizer;
use crate::storage::{Result, SizeMismatchErr};

/// Momentum computed server-side from a raw gradient, the velocity never leaves the server.
#[derive(Debug)]
pub struct GradientDescentWithMomentum {
    learning_rate: f32,
    momentum: f32,
    velocity: Box<[f32]>,
}

impl GradientDescentWithMomentum {
    /// Creates the rule for a parameter of `len` elements, its velocity starts at zero.
    pub fn new(len: usize, learning_rate: f32, momentum: f32) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity: vec![0.; len].into_boxed_slice(),
        }
    }
}

impl Optimizer for GradientDescentWithMomentum {
    /// Applies `v = momentum * v + grad` and then `params -= learning_rate * v`.
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        SizeMismatchErr::check(params.len(), grad.len())?;
        SizeMismatchErr::check(self.velocity.len(), grad.len())?;

        for ((param, g), velocity) in params.iter_mut().zip(grad).zip(&mut self.velocity) {
            *velocity = self.momentum * *velocity + g;
            *param -= self.learning_rate * *velocity;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn velocity_carries_over() {
        let mut optimizer = GradientDescentWithMomentum::new(1, 1., 0.5);
        let mut params = [0.];

        optimizer.update_params(&[1.], &mut params).unwrap();
        assert_eq!(params, [-1.]);

        optimizer.update_params(&[1.], &mut params).unwrap();
        assert_eq!(params, [-2.5]);
    }

    #[test]
    fn rejects_other_lengths() {
        let mut optimizer = GradientDescentWithMomentum::new(2, 1., 0.5);
        let err = optimizer.update_params(&[1.], &mut [0.]).unwrap_err();
        assert_eq!(err, SizeMismatchErr { expected: 2, got: 1 });
    }
}
