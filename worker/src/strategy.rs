use comms::{Key, Role, Transport, specs::worker::ConventionSpec};
use ndarray::ArrayD;

use crate::{client::SyncClient, error::Result};

/// What a worker pushes for a weight or bias, must agree with the server's update rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UpdateConvention {
    /// Pushes the gradient into the weight key, scaled by `-learning_rate` when given.
    ///
    /// Unscaled gradients are meant for servers that scale them themselves, scaled ones
    /// for servers that only add what they receive.
    Direct { learning_rate: Option<f32> },
    /// Momentum computed on the client side through the paired `wd`/`bd` key.
    ///
    /// Pushes `lr * (grad + weight_decay * weight)` into the momentum key, whose
    /// server applies `m * v - delta`, and then pushes the returned velocity into
    /// the weight key, whose server adds it. Biases are not decayed.
    ClientMomentum { learning_rate: f32, weight_decay: f32 },
}

impl From<ConventionSpec> for UpdateConvention {
    fn from(spec: ConventionSpec) -> Self {
        match spec {
            ConventionSpec::Direct { learning_rate } => Self::Direct { learning_rate },
            ConventionSpec::ClientMomentum {
                learning_rate,
                weight_decay,
            } => Self::ClientMomentum {
                learning_rate,
                weight_decay,
            },
        }
    }
}

impl UpdateConvention {
    /// Synchronizes one parameter after a step.
    ///
    /// # Args
    /// * `client` - The sync client.
    /// * `key` - The weight or bias key.
    /// * `grad` - The reduced, possibly accumulated, gradient.
    /// * `weight` - The local copy of the parameter.
    ///
    /// # Returns
    /// The new value of the parameter.
    ///
    /// # Errors
    /// Returns `WorkerErr::Io` if the transport failed.
    pub async fn sync<T: Transport>(
        &self,
        client: &mut SyncClient<T>,
        key: &Key,
        grad: &ArrayD<f32>,
        weight: &ArrayD<f32>,
    ) -> Result<ArrayD<f32>> {
        match *self {
            Self::Direct {
                learning_rate: None,
            } => client.push_and_pull(key, grad).await,
            Self::Direct {
                learning_rate: Some(lr),
            } => {
                let delta = grad * -lr;
                client.push_and_pull(key, &delta).await
            }
            Self::ClientMomentum {
                learning_rate,
                weight_decay,
            } => {
                let mut delta = grad * learning_rate;
                if key.role() != Role::Bias {
                    delta.scaled_add(learning_rate * weight_decay, weight);
                }

                let velocity = client.push_and_pull(&key.paired(), &delta).await?;
                client.push_and_pull(key, &velocity).await
            }
        }
    }
}
