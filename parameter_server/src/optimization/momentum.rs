use super::Optimizer;
use crate::storage::{Result, SizeMismatchErr};

/// The rule for momentum accumulators, `value = momentum * value - delta`.
///
/// The accumulator is the parameter itself, so no extra state is kept.
#[derive(Debug)]
pub struct Momentum {
    momentum: f32,
}

impl Momentum {
    /// Creates a new `Momentum` update rule.
    ///
    /// # Arguments
    /// * `momentum` - The decay coefficient of the accumulator.
    ///
    /// # Returns
    /// A new `Momentum` instance.
    pub fn new(momentum: f32) -> Self {
        Self { momentum }
    }
}

impl Optimizer for Momentum {
    fn update_params(&mut self, delta: &[f32], params: &mut [f32]) -> Result<()> {
        SizeMismatchErr::check(params.len(), delta.len())?;

        let mu = self.momentum;
        params
            .iter_mut()
            .zip(delta)
            .for_each(|(a, d)| *a = mu * *a - d);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decays_the_accumulator() {
        let mut optimizer = Momentum::new(0.75);
        let mut acc = [0.];

        optimizer.update_params(&[1.], &mut acc).unwrap();
        assert_eq!(acc, [-1.]);

        optimizer.update_params(&[2.], &mut acc).unwrap();
        assert_eq!(acc, [-2.75]);

        optimizer.update_params(&[0.], &mut acc).unwrap();
        assert_eq!(acc, [-2.0625]);
    }
}
