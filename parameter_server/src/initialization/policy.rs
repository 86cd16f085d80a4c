use std::collections::HashMap;

use comms::{
    Key, Role,
    specs::server::{DistributionSpec, InitSpec, ParamGenSpec},
};
use rand::{SeedableRng, rngs::StdRng};

use super::{ConstParamGen, InitErr, ParamGen, RandParamGen, Result};

/// Makes `callback`'s argument type generic, each distribution resolves to a different
/// concrete `RandParamGen` and this avoids boxing them.
///
/// # Arguments
/// * `rng` - A random number generator.
/// * `dist_spec` - A specification for a distribution.
/// * `callback` - The closure to call passing in the created param gen.
macro_rules! with_distribution {
    ($rng:expr, $dist_spec:expr, $callback:expr) => {
        match $dist_spec {
            DistributionSpec::Uniform { low, high } => {
                let param_gen = RandParamGen::uniform($rng, low, high)?;
                ($callback)(param_gen)
            }
            DistributionSpec::UniformInclusive { low, high } => {
                let param_gen = RandParamGen::uniform_inclusive($rng, low, high)?;
                ($callback)(param_gen)
            }
            DistributionSpec::XavierUniform { fan_in, fan_out } => {
                let param_gen = RandParamGen::xavier_uniform($rng, fan_in, fan_out)?;
                ($callback)(param_gen)
            }
            DistributionSpec::LecunUniform { fan_in } => {
                let param_gen = RandParamGen::lecun_uniform($rng, fan_in)?;
                ($callback)(param_gen)
            }
            DistributionSpec::Normal { mean, std_dev } => {
                let param_gen = RandParamGen::normal($rng, mean, std_dev)?;
                ($callback)(param_gen)
            }
            DistributionSpec::Kaiming { fan_in } => {
                let param_gen = RandParamGen::kaiming($rng, fan_in)?;
                ($callback)(param_gen)
            }
            DistributionSpec::Xavier { fan_in, fan_out } => {
                let param_gen = RandParamGen::xavier($rng, fan_in, fan_out)?;
                ($callback)(param_gen)
            }
            DistributionSpec::Lecun { fan_in } => {
                let param_gen = RandParamGen::lecun($rng, fan_in)?;
                ($callback)(param_gen)
            }
        }
    };
}

/// The initialization hook of the parameter store.
///
/// Momentum accumulators start at zero, weights and biases are sampled from their
/// configured generator. Every key gets its own rng, seeded from the run seed and
/// the key's role and index, so the value of a key doesn't depend on the order in
/// which keys are first touched.
#[derive(Debug, Clone)]
pub struct InitPolicy {
    seed: u64,
    weight: ParamGenSpec,
    bias: ParamGenSpec,
    overrides: HashMap<String, ParamGenSpec>,
}

impl InitPolicy {
    /// Creates a new `InitPolicy`, validating every distribution and override up front.
    ///
    /// # Arguments
    /// * `spec` - The initialization specification.
    /// * `seed` - The seed of this run.
    ///
    /// # Returns
    /// A new `InitPolicy` or an `InitErr` if any distribution is invalid, or an
    /// override names something that isn't a weight or bias key.
    pub fn new(spec: InitSpec, seed: u64) -> std::result::Result<Self, InitErr> {
        let InitSpec {
            weight,
            bias,
            overrides,
        } = spec;

        for name in overrides.keys() {
            if Key::parse(name)?.role().is_momentum() {
                return Err(InitErr::MomentumOverride { key: name.clone() });
            }
        }

        for gen_spec in [&weight, &bias].into_iter().chain(overrides.values()) {
            if let ParamGenSpec::Rand { distribution } = *gen_spec {
                with_distribution!(StdRng::seed_from_u64(seed), distribution, drop);
            }
        }

        Ok(Self {
            seed,
            weight,
            bias,
            overrides,
        })
    }

    /// Fully populates `out` with the initial value of `key`.
    ///
    /// # Arguments
    /// * `key` - The key being materialized.
    /// * `out` - The buffer of the new parameter.
    ///
    /// # Returns
    /// A `RandErr` if the generator for `key` can't be built.
    pub fn init_layer(&self, key: &Key, out: &mut [f32]) -> Result<()> {
        if key.role().is_momentum() {
            ConstParamGen::zeros().fill(out);
            return Ok(());
        }

        let gen_spec = match (self.overrides.get(key.name()), key.role()) {
            (Some(gen_spec), _) => gen_spec,
            (None, Role::Bias) => &self.bias,
            (None, _) => &self.weight,
        };

        match *gen_spec {
            ParamGenSpec::Const { value } => ConstParamGen::new(value).fill(out),
            ParamGenSpec::Rand { distribution } => {
                let rng = StdRng::seed_from_u64(self.key_seed(key));
                with_distribution!(rng, distribution, |mut param_gen| {
                    ParamGen::fill(&mut param_gen, out)
                });
            }
        }

        Ok(())
    }

    fn key_seed(&self, key: &Key) -> u64 {
        self.seed ^ key.role().id().rotate_right(8) ^ key.index() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(name: &str) -> Key {
        Key::parse(name).unwrap()
    }

    fn policy(seed: u64) -> InitPolicy {
        InitPolicy::new(InitSpec::default(), seed).unwrap()
    }

    #[test]
    fn momentum_starts_at_zero() {
        let mut out = [1.; 8];
        policy(7).init_layer(&key("wd_0"), &mut out).unwrap();
        assert_eq!(out, [0.; 8]);
    }

    #[test]
    fn biases_use_their_own_generator() {
        let mut out = [1.; 4];
        policy(7).init_layer(&key("b1"), &mut out).unwrap();
        assert_eq!(out, [0.; 4]);
    }

    #[test]
    fn deterministic_per_key() {
        let (mut first, mut second, mut other) = ([0.; 32], [0.; 32], [0.; 32]);

        policy(11).init_layer(&key("w_3"), &mut first).unwrap();
        policy(11).init_layer(&key("w_4"), &mut other).unwrap();
        policy(11).init_layer(&key("w_3"), &mut second).unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);
    }

    #[test]
    fn overrides_take_precedence() {
        let mut spec = InitSpec::default();
        spec.overrides
            .insert("w_2".to_string(), ParamGenSpec::Const { value: 0.5 });

        let policy = InitPolicy::new(spec, 0).unwrap();
        let mut out = [0.; 3];
        policy.init_layer(&key("w_2"), &mut out).unwrap();
        assert_eq!(out, [0.5; 3]);
    }

    #[test]
    fn rejects_invalid_distributions() {
        let spec = InitSpec {
            weight: ParamGenSpec::Rand {
                distribution: DistributionSpec::Uniform { low: 1., high: 0. },
            },
            ..Default::default()
        };

        assert!(matches!(InitPolicy::new(spec, 0), Err(InitErr::Rand(_))));
    }

    #[test]
    fn rejects_overrides_that_never_apply() {
        let mut spec = InitSpec::default();
        spec.overrides
            .insert("x_0".to_string(), ParamGenSpec::Const { value: 1. });

        let err = InitPolicy::new(spec, 0).unwrap_err();
        assert!(matches!(err, InitErr::Override(_)));
        assert!(err.to_string().contains("x_0"));

        let mut spec = InitSpec::default();
        spec.overrides
            .insert("bd_1".to_string(), ParamGenSpec::Const { value: 1. });

        assert!(matches!(
            InitPolicy::new(spec, 0),
            Err(InitErr::MomentumOverride { key }) if key == "bd_1"
        ));
    }
}
