use std::num::NonZeroUsize;

use comms::{
    Identity,
    specs::{
        server::{InitSpec, ParamGenSpec, ServerSpec, UpdateSpec},
        worker::{BackendSpec, ConventionSpec, LayerSpec, SyncSpec, WorkerSpec},
    },
};
use parameter_server::{LocalTransport, ParameterHandle, ServerBuilder};
use worker::{EpochStats, Worker, WorkerErr, trainer::MockTrainer};

fn handle() -> ParameterHandle {
    let spec = ServerSpec {
        workers: 1,
        seed: Some(0),
        init: InitSpec {
            weight: ParamGenSpec::Const { value: 1. },
            ..Default::default()
        },
        update: UpdateSpec::Additive,
        momentum: 0.75,
    };

    ParameterHandle::new(ServerBuilder::new().build_store(&spec).unwrap())
}

fn spec(devices: usize, sync: SyncSpec, learning_rate: f32) -> WorkerSpec {
    WorkerSpec {
        servers: Vec::new(),
        layers: vec![LayerSpec {
            key: "w_0".to_string(),
            shape: vec![1],
        }],
        devices: NonZeroUsize::new(devices).unwrap(),
        backend: BackendSpec::Cpu,
        sync,
        convention: ConventionSpec::Direct {
            learning_rate: Some(learning_rate),
        },
        epochs: 1,
        shards: 4,
        min_slice_size: 1000,
    }
}

fn solo() -> Identity {
    Identity::new("worker-0", 0, NonZeroUsize::new(1).unwrap()).unwrap()
}

fn weight(worker: &Worker<LocalTransport, MockTrainer>) -> f32 {
    worker.params()[0][[0]]
}

#[tokio::test(flavor = "multi_thread")]
async fn dense_sync_updates_after_every_step() {
    let spec = spec(1, SyncSpec::Dense, 0.25);
    let transport = LocalTransport::new(handle());
    let mut worker = Worker::new(solo(), &spec, transport, MockTrainer).unwrap();

    worker.init().await.unwrap();
    assert_eq!(weight(&worker), 1.);

    // w <- w - 0.25 * 2w, four times
    let stats = worker.run_epoch(4).await.unwrap();
    assert_eq!(
        stats,
        EpochStats {
            epoch: 0,
            shards: vec![0, 1, 2, 3],
            steps: 4,
            syncs: 4,
        }
    );
    assert_eq!(weight(&worker), 0.0625);

    worker.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn devices_are_reduced_into_one_step() {
    let spec = spec(2, SyncSpec::Dense, 0.125);
    let transport = LocalTransport::new(handle());
    let mut worker = Worker::new(solo(), &spec, transport, MockTrainer).unwrap();

    worker.init().await.unwrap();
    let stats = worker.run_epoch(4).await.unwrap();

    assert_eq!(stats.steps, 2);
    assert_eq!(stats.syncs, 2);
    assert_eq!(weight(&worker), 0.25);
}

#[tokio::test(flavor = "multi_thread")]
async fn bulk_sync_flushes_every_cycle_and_at_epoch_end() {
    let cycle = NonZeroUsize::new(2).unwrap();
    let spec = spec(1, SyncSpec::Bulk { cycle }, 0.125);
    let transport = LocalTransport::new(handle());
    let mut worker = Worker::new(solo(), &spec, transport, MockTrainer).unwrap();

    worker.init().await.unwrap();

    // Two accumulated steps of 2, then a lone step on w = 0.5 flushed at the end.
    let stats = worker.run_epoch(3).await.unwrap();
    assert_eq!(stats.steps, 3);
    assert_eq!(stats.syncs, 2);
    assert_eq!(weight(&worker), 0.375);

    let stats = worker.run_epoch(0).await.unwrap();
    assert_eq!(stats.epoch, 1);
    assert_eq!(stats.syncs, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn workers_only_train_their_shards() {
    let spec = spec(1, SyncSpec::Dense, 0.25);
    let identity = Identity::new("worker-1", 1, NonZeroUsize::new(3).unwrap()).unwrap();
    let mut worker = Worker::new(identity, &spec, LocalTransport::new(handle()), MockTrainer).unwrap();

    worker.init().await.unwrap();
    let stats = worker.run_epoch(8).await.unwrap();
    assert_eq!(stats.shards, [1, 4, 7]);
}

#[tokio::test(flavor = "multi_thread")]
async fn unavailable_backend_fails_the_step() {
    let mut spec = spec(2, SyncSpec::Dense, 0.25);
    spec.backend = BackendSpec::Unavailable;
    let mut worker = Worker::new(solo(), &spec, LocalTransport::new(handle()), MockTrainer).unwrap();

    worker.init().await.unwrap();
    let err = worker.run_epoch(2).await.unwrap_err();
    assert!(matches!(err, WorkerErr::BackendUnavailable));
}

#[test]
fn momentum_layers_are_rejected() {
    let mut spec = spec(1, SyncSpec::Dense, 0.25);
    spec.layers[0].key = "wd_0".to_string();

    let Err(err) = Worker::new(solo(), &spec, LocalTransport::new(handle()), MockTrainer) else {
        panic!("a momentum layer was accepted");
    };
    assert!(matches!(err, WorkerErr::InvalidLayer { key } if key == "wd_0"));
}

#[test]
fn malformed_layers_are_rejected() {
    let mut spec = spec(1, SyncSpec::Dense, 0.25);
    spec.layers[0].key = "q_0".to_string();

    let Err(err) = Worker::new(solo(), &spec, LocalTransport::new(handle()), MockTrainer) else {
        panic!("a malformed layer was accepted");
    };
    assert!(matches!(err, WorkerErr::Key(_)));
}
