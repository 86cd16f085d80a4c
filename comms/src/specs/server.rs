use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The specification for the distributions a `RandParamGen` can sample from.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionSpec {
    Uniform { low: f32, high: f32 },
    UniformInclusive { low: f32, high: f32 },
    XavierUniform { fan_in: usize, fan_out: usize },
    LecunUniform { fan_in: usize },
    Normal { mean: f32, std_dev: f32 },
    Kaiming { fan_in: usize },
    Xavier { fan_in: usize, fan_out: usize },
    Lecun { fan_in: usize },
}

/// The specification for the `ParamGen` trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamGenSpec {
    Const { value: f32 },
    Rand { distribution: DistributionSpec },
}

/// How each parameter is materialized on its first touch.
///
/// Momentum accumulators (`wd`, `bd`) always start at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitSpec {
    #[serde(default = "default_weight_gen")]
    pub weight: ParamGenSpec,
    #[serde(default = "default_bias_gen")]
    pub bias: ParamGenSpec,
    /// Per key generators, these take precedence over the role defaults.
    #[serde(default)]
    pub overrides: HashMap<String, ParamGenSpec>,
}

impl Default for InitSpec {
    fn default() -> Self {
        Self {
            weight: default_weight_gen(),
            bias: default_bias_gen(),
            overrides: HashMap::new(),
        }
    }
}

fn default_weight_gen() -> ParamGenSpec {
    ParamGenSpec::Rand {
        distribution: DistributionSpec::Normal {
            mean: 0.,
            std_dev: 0.1,
        },
    }
}

fn default_bias_gen() -> ParamGenSpec {
    ParamGenSpec::Const { value: 0. }
}

/// The update rule applied to weight and bias keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateSpec {
    /// `value += delta`, the client already scaled the delta.
    Additive,
    /// `value -= learning_rate * grad`.
    GradientDescent { learning_rate: f32 },
    /// Momentum computed server-side from a raw gradient, with a private velocity.
    GradientDescentWithMomentum { learning_rate: f32, momentum: f32 },
}

/// The specification for a parameter server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSpec {
    /// The amount of worker connections to accept before serving.
    pub workers: usize,
    pub seed: Option<u64>,
    #[serde(default)]
    pub init: InitSpec,
    pub update: UpdateSpec,
    /// The decay coefficient of the `wd` and `bd` accumulators.
    #[serde(default = "default_momentum")]
    pub momentum: f32,
}

fn default_momentum() -> f32 {
    0.75
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_defaults() {
        let raw = r#"{ "workers": 2, "seed": 7, "update": "additive" }"#;
        let spec: ServerSpec = serde_json::from_str(raw).unwrap();

        assert_eq!(spec.update, UpdateSpec::Additive);
        assert_eq!(spec.momentum, 0.75);
        assert_eq!(spec.init, InitSpec::default());
    }

    #[test]
    fn parses_overrides() {
        let raw = r#"{
            "workers": 1,
            "seed": null,
            "update": { "gradient_descent": { "learning_rate": 0.01 } },
            "init": {
                "weight": { "rand": { "distribution": { "xavier": { "fan_in": 784, "fan_out": 256 } } } },
                "overrides": { "w2": { "const": { "value": 0.5 } } }
            }
        }"#;

        let spec: ServerSpec = serde_json::from_str(raw).unwrap();
        assert_eq!(spec.init.bias, ParamGenSpec::Const { value: 0. });
        assert_eq!(
            spec.init.overrides["w2"],
            ParamGenSpec::Const { value: 0.5 }
        );
    }
}
