use comms::{Key, Role, specs::server::UpdateSpec};

use super::{Additive, GradientDescent, GradientDescentWithMomentum, Momentum, Optimizer};

/// A boxed update rule, one per materialized parameter.
pub type BoxedOptimizer = Box<dyn Optimizer + Send>;

/// The keyed dispatch from a parameter's role to its update rule.
///
/// Momentum accumulators (`wd`, `bd`) always integrate the pushed delta into a decaying
/// accumulator, weights and biases follow the configured `UpdateSpec`.
#[derive(Debug, Clone, Copy)]
pub struct UpdatePolicy {
    update: UpdateSpec,
    momentum: f32,
}

impl UpdatePolicy {
    /// Creates a new `UpdatePolicy`.
    ///
    /// # Arguments
    /// * `update` - The update rule for weights and biases.
    /// * `momentum` - The decay coefficient of the momentum accumulators.
    ///
    /// # Returns
    /// A new `UpdatePolicy` instance.
    pub fn new(update: UpdateSpec, momentum: f32) -> Self {
        Self { update, momentum }
    }

    /// Resolves the update rule of `key`, called once when the key is materialized.
    ///
    /// # Arguments
    /// * `key` - The parsed key.
    /// * `len` - The amount of elements of the parameter.
    ///
    /// # Returns
    /// The update rule for the parameter.
    pub fn resolve(&self, key: &Key, len: usize) -> BoxedOptimizer {
        match (key.role(), self.update) {
            (Role::WeightMomentum | Role::BiasMomentum, _) => Box::new(Momentum::new(self.momentum)),
            (Role::Weight | Role::Bias, UpdateSpec::Additive) => Box::new(Additive),
            (Role::Weight | Role::Bias, UpdateSpec::GradientDescent { learning_rate }) => {
                Box::new(GradientDescent::new(learning_rate))
            }
            (
                Role::Weight | Role::Bias,
                UpdateSpec::GradientDescentWithMomentum {
                    learning_rate,
                    momentum,
                },
            ) => Box::new(GradientDescentWithMomentum::new(len, learning_rate, momentum)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(policy: &UpdatePolicy, name: &str, start: f32, deltas: &[f32]) -> f32 {
        let key = Key::parse(name).unwrap();
        let mut optimizer = policy.resolve(&key, 1);
        let mut value = [start];

        for delta in deltas {
            optimizer.update_params(&[*delta], &mut value).unwrap();
        }

        value[0]
    }

    #[test]
    fn momentum_keys_decay() {
        let policy = UpdatePolicy::new(UpdateSpec::Additive, 0.75);
        assert_eq!(apply(&policy, "wd_0", 0., &[1.]), -1.);
        assert_eq!(apply(&policy, "bd_0", 0., &[1., 2.]), -2.75);
    }

    #[test]
    fn weights_follow_the_update_spec() {
        let additive = UpdatePolicy::new(UpdateSpec::Additive, 0.75);
        assert_eq!(apply(&additive, "w_0", 1., &[0.5, 0.25]), 1.75);

        let sgd = UpdatePolicy::new(UpdateSpec::GradientDescent { learning_rate: 0.5 }, 0.75);
        assert_eq!(apply(&sgd, "b1", 1., &[1.]), 0.5);
    }
}
