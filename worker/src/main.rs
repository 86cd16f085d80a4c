use std::{env, io, process::ExitCode};

use comms::{Identity, NetTransport, specs::worker::WorkerSpec};
use log::{error, info};
use tokio::{net::TcpStream, signal};

use worker::{Worker, WorkerErr, trainer::MockTrainer};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), WorkerErr> {
    let identity = Identity::from_env()?;
    info!("starting worker, {identity}");

    let spec_path = env::var("SPEC").map_err(io::Error::other)?;
    let spec: WorkerSpec = comms::specs::load(&spec_path)?;

    let mut transport = NetTransport::new().with_min_slice_len(spec.min_slice_size);
    for addr in &spec.servers {
        let stream = TcpStream::connect(addr).await?;
        let (rx, tx) = stream.into_split();
        let (rx, tx) = comms::channel(rx, tx);
        transport.spawn(rx, tx);
        info!("connected to parameter server at {addr}");
    }

    transport.connect(&identity).await?;

    let mut worker = Worker::new(identity, &spec, transport, MockTrainer)?;
    worker.init().await?;

    let train = async {
        for _ in 0..spec.epochs {
            worker.run_epoch(spec.shards).await?;
        }

        Ok::<_, WorkerErr>(())
    };

    tokio::select! {
        ret = train => {
            ret?;
            info!("wrapping up, disconnecting...");
        }
        _ = signal::ctrl_c() => {
            info!("received SIGTERM");
        }
    }

    worker.shutdown().await
}
