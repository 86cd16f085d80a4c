use std::{mem, num::NonZeroUsize};

use comms::{
    Identity, Key, Transport,
    specs::worker::{SyncSpec, WorkerSpec},
};
use log::{debug, info};
use ndarray::ArrayD;

use crate::{
    accumulate::{self, BulkAccumulator},
    backend::{self, Backend},
    client::SyncClient,
    error::{Result, WorkerErr},
    partition::Partitioner,
    reduce::Reducer,
    strategy::UpdateConvention,
    trainer::Trainer,
};

/// A trainable tensor of the model.
#[derive(Debug, Clone)]
struct Layer {
    key: Key,
    shape: Vec<usize>,
}

/// What happened during one epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EpochStats {
    pub epoch: usize,
    /// The data shards this worker processed, in order.
    pub shards: Vec<usize>,
    /// The amount of reduced steps.
    pub steps: usize,
    /// The amount of parameters synchronized with the servers.
    pub syncs: usize,
}

/// Worker runtime that turns the shards it owns into parameter updates.
pub struct Worker<T: Transport, Tr: Trainer> {
    identity: Identity,
    partitioner: Partitioner,
    layers: Vec<Layer>,
    params: Vec<ArrayD<f32>>,
    client: SyncClient<T>,
    trainer: Tr,
    backend: Box<dyn Backend>,
    devices: NonZeroUsize,
    sync: SyncSpec,
    convention: UpdateConvention,
    accumulator: BulkAccumulator,
    global_step: usize,
    pending: usize,
    epoch: usize,
}

impl<T: Transport, Tr: Trainer> Worker<T, Tr> {
    /// Creates a new worker.
    ///
    /// # Args
    /// * `identity` - The identity of this process.
    /// * `spec` - The worker specification.
    /// * `transport` - The transport to the parameter servers.
    /// * `trainer` - The model's trainer.
    ///
    /// # Returns
    /// A new worker instance.
    ///
    /// # Errors
    /// Returns `WorkerErr::Key` for malformed layer keys and `WorkerErr::InvalidLayer`
    /// if a layer is a momentum accumulator.
    pub fn new(identity: Identity, spec: &WorkerSpec, transport: T, trainer: Tr) -> Result<Self> {
        let layers = spec
            .layers
            .iter()
            .map(|layer| {
                let key = Key::parse(&layer.key)?;
                if key.role().is_momentum() {
                    return Err(WorkerErr::InvalidLayer { key: layer.key.clone() });
                }

                Ok(Layer {
                    key,
                    shape: layer.shape.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let backend = backend::select(spec.backend);
        info!(backend = backend.name(), devices = spec.devices.get(); "worker ready, {identity}");

        Ok(Self {
            partitioner: Partitioner::new(&identity),
            identity,
            layers,
            params: Vec::new(),
            client: SyncClient::new(transport),
            trainer,
            backend,
            devices: spec.devices,
            sync: spec.sync,
            convention: spec.convention.into(),
            accumulator: BulkAccumulator::new(),
            global_step: 0,
            pending: 0,
            epoch: 0,
        })
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The local copy of every layer, in layout order.
    pub fn params(&self) -> &[ArrayD<f32>] {
        &self.params
    }

    /// Pulls every layer once, before training.
    ///
    /// # Errors
    /// Returns `WorkerErr::Io` if the transport failed.
    pub async fn init(&mut self) -> Result<()> {
        let mut params = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            params.push(self.client.pull(&layer.key, &layer.shape).await?);
        }

        self.params = params;
        info!(layers = self.layers.len(); "pulled the initial parameters");
        Ok(())
    }

    /// Runs an epoch over the shards of `[0, total_shards)` this worker owns.
    ///
    /// Shards are handed to the local devices in turns, once every device produced its
    /// gradients they are reduced into a single step. A last, smaller, group is reduced
    /// at the end of the epoch, and bulk sums are flushed.
    ///
    /// # Errors
    /// Returns `WorkerErr` on transport failures or configuration errors.
    pub async fn run_epoch(&mut self, total_shards: usize) -> Result<EpochStats> {
        let mut stats = EpochStats {
            epoch: self.epoch,
            ..Default::default()
        };

        let mut group = Vec::with_capacity(self.devices.get());

        for shard in self.partitioner.owned(total_shards) {
            let device = group.len();
            let grads = self.trainer.gradients(device, shard, &self.params)?;
            self.check_gradients(shard, &grads)?;

            debug!(shard = shard, device = device; "computed gradients");
            group.push(grads);
            stats.shards.push(shard);

            if group.len() == self.devices.get() {
                stats.syncs += self.step(mem::take(&mut group)).await?;
                stats.steps += 1;
            }
        }

        if !group.is_empty() {
            stats.syncs += self.step(group).await?;
            stats.steps += 1;
        }

        if matches!(self.sync, SyncSpec::Bulk { .. }) {
            stats.syncs += self.flush().await?;
        }

        info!(
            epoch = stats.epoch,
            shards = stats.shards.len(),
            steps = stats.steps,
            syncs = stats.syncs;
            "epoch finished"
        );

        self.epoch += 1;
        Ok(stats)
    }

    /// Disconnects from the servers.
    ///
    /// # Errors
    /// Returns `WorkerErr::Io` if the transport failed.
    pub async fn shutdown(mut self) -> Result<()> {
        self.client.disconnect().await?;
        info!("worker finished, {}", self.identity);
        Ok(())
    }

    fn check_gradients(&self, shard: usize, grads: &[ArrayD<f32>]) -> Result<()> {
        if grads.len() != self.layers.len() {
            return Err(WorkerErr::MissingGradients {
                shard,
                expected: self.layers.len(),
                got: grads.len(),
            });
        }

        for (layer, grad) in self.layers.iter().zip(grads) {
            if grad.shape() != layer.shape {
                return Err(WorkerErr::ShapeMismatch {
                    key: layer.key.to_string(),
                    expected: layer.shape.clone(),
                    got: grad.shape().to_vec(),
                });
            }
        }

        Ok(())
    }

    /// Reduces the gradients of a group of devices and syncs or accumulates them.
    ///
    /// # Returns
    /// The amount of parameters synchronized.
    async fn step(&mut self, group: Vec<Vec<ArrayD<f32>>>) -> Result<usize> {
        let mut per_layer: Vec<_> = self
            .layers
            .iter()
            .map(|_| Vec::with_capacity(group.len()))
            .collect();

        for grads in group {
            for (layer, grad) in per_layer.iter_mut().zip(grads) {
                layer.push(grad);
            }
        }

        let reduced = {
            let reducer = Reducer::new(self.backend.as_ref());
            per_layer
                .into_iter()
                .map(|grads| reducer.reduce(grads))
                .collect::<Result<Vec<_>>>()?
        };

        self.global_step += 1;

        match self.sync {
            SyncSpec::Dense => {
                for (i, grad) in reduced.iter().enumerate() {
                    self.sync_layer(i, grad).await?;
                }

                Ok(reduced.len())
            }
            SyncSpec::Bulk { cycle } => {
                for (layer, grad) in self.layers.iter().zip(&reduced) {
                    self.accumulator.accumulate(&layer.key, grad)?;
                }

                self.pending += 1;

                if accumulate::should_flush(self.global_step, cycle) {
                    self.flush().await
                } else {
                    Ok(0)
                }
            }
        }
    }

    /// Pushes every accumulated sum, if any step is pending.
    async fn flush(&mut self) -> Result<usize> {
        if self.pending == 0 {
            return Ok(0);
        }

        let mut synced = 0;
        for i in 0..self.layers.len() {
            if let Some(sum) = self.accumulator.flush(&self.layers[i].key) {
                self.sync_layer(i, &sum).await?;
                synced += 1;
            }
        }

        debug!(steps = self.pending; "flushed bulk gradients");
        self.pending = 0;
        Ok(synced)
    }

    async fn sync_layer(&mut self, i: usize, grad: &ArrayD<f32>) -> Result<()> {
        let key = &self.layers[i].key;
        let params = self
            .convention
            .sync(&mut self.client, key, grad, &self.params[i])
            .await?;

        self.params[i] = params;
        Ok(())
    }
}
