use std::{env, error::Error, io, process::ExitCode};

use comms::{Identity, specs::server::ServerSpec};
use log::{error, info};
use parameter_server::ServerBuilder;
use tokio::{net::TcpListener, signal};

const DEFAULT_HOST: &str = "127.0.0.1";

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

async fn run() -> Result<(), Box<dyn Error>> {
    let identity = Identity::from_env()?;
    info!("starting parameter server, {identity}");

    let spec_path = env::var("SPEC").map_err(io::Error::other)?;
    let spec: ServerSpec = comms::specs::load(&spec_path)?;

    let addr = format!(
        "{}:{}",
        env::var("HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
        env::var("PORT").map_err(io::Error::other)?,
    );

    let mut pserver = ServerBuilder::new()
        .with_rank(identity.rank())
        .build(&spec)?;
    let list = TcpListener::bind(&addr).await?;
    info!("listening at {addr}, waiting for {} workers", spec.workers);

    for _ in 0..spec.workers {
        let (stream, addr) = list.accept().await?;
        info!("accepted connection from {addr}");

        let (rx, tx) = stream.into_split();
        let (rx, tx) = comms::channel(rx, tx);
        pserver.spawn(rx, tx);
    }

    tokio::select! {
        ret = pserver.run() => {
            ret?;
            info!("every worker disconnected, shutting down");
        }
        _ = signal::ctrl_c() => {
            info!("received SIGTERM");
        }
    }

    Ok(())
}
