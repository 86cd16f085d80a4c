use std::{
    num::NonZeroUsize,
    sync::{Arc, OnceLock},
};

use comms::{
    MAX_FRAME_LEN, OnoReceiver, OnoSender,
    msg::{Command, Msg, Payload},
};
use log::{debug, error, info, warn};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    task::JoinSet,
};

use super::{ServerErr, error::Result};
use crate::storage::ParameterHandle;

/// The central server structure, it handles task management and io between workers.
///
/// Every connection is served by its own task, requests are answered in the order
/// they arrive on that connection and there is no barrier between workers.
pub struct ParameterServer {
    tasks: JoinSet<Result<()>>,
    handle: ParameterHandle,
    rank_size: Arc<OnceLock<NonZeroUsize>>,
}

impl ParameterServer {
    /// Creates a new `ParameterServer`.
    ///
    /// # Arguments
    /// * `handle` - The handle to the parameter store.
    ///
    /// # Returns
    /// A new `ParameterServer` instance.
    pub fn new(handle: ParameterHandle) -> Self {
        Self {
            tasks: JoinSet::new(),
            handle,
            rank_size: Arc::default(),
        }
    }

    /// The handle to the parameters this server holds.
    pub fn handle(&self) -> &ParameterHandle {
        &self.handle
    }

    /// Serves the spawned workers until all of them disconnect.
    ///
    /// # Returns
    /// The first error of any connection, the rest of them are aborted.
    pub async fn run(&mut self) -> Result<()> {
        while let Some(res) = self.tasks.join_next().await {
            if let Err(e) = res? {
                error!("aborting: {e}");
                self.tasks.abort_all();
                return Err(e);
            }
        }

        Ok(())
    }

    /// Binds a new worker to this server and spawns it's own serving task.
    ///
    /// # Arguments
    /// * `rx` - The receiving end of the communication.
    /// * `tx` - The sending end of the communication.
    pub fn spawn<R, W>(&mut self, rx: OnoReceiver<R>, tx: OnoSender<W>)
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let conn = Connection {
            rx,
            tx,
            handle: self.handle.clone(),
            rank_size: Arc::clone(&self.rank_size),
        };

        self.tasks.spawn(conn.serve());
    }
}

/// The state of a single worker connection.
struct Connection<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    rx: OnoReceiver<R>,
    tx: OnoSender<W>,
    handle: ParameterHandle,
    rank_size: Arc<OnceLock<NonZeroUsize>>,
}

impl<R, W> Connection<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn serve(mut self) -> Result<()> {
        let mut rx_buf: Vec<u32> = Vec::new();
        let mut params = Vec::new();
        let mut worker = String::from("unknown");

        loop {
            let msg: Msg = self.rx.recv_into(&mut rx_buf).await?;

            let res = match msg {
                Msg::Control(Command::Hello(identity)) => {
                    info!("worker connected, {identity}");
                    worker = identity.node_id().to_string();

                    let rank_size = identity.rank_size();
                    let expected = *self.rank_size.get_or_init(|| rank_size);

                    if expected != rank_size {
                        let err = ServerErr::RankSizeChanged {
                            expected: expected.get(),
                            got: rank_size.get(),
                        };

                        return self.fail(err).await;
                    }

                    continue;
                }
                Msg::Control(Command::Connect) => {
                    warn!(worker = worker.as_str(); "ignoring a connect on an open connection");
                    continue;
                }
                Msg::Control(Command::Disconnect) => {
                    info!(worker = worker.as_str(); "worker disconnected");
                    self.tx.send(&Msg::Control(Command::Disconnect)).await?;
                    return Ok(());
                }
                Msg::Data(Payload::Pull { key, len }) => {
                    debug!(worker = worker.as_str(), key = key, len = len; "pull");
                    if !fits_in_frame(key, len) {
                        let err = ServerErr::PullTooLarge {
                            key: key.to_string(),
                            len,
                        };

                        return self.fail(err).await;
                    }

                    params.resize(len, 0.);
                    self.handle.pull(key, &mut params).await.map(|_| key)
                }
                Msg::Data(Payload::Push { key, grad }) => {
                    debug!(worker = worker.as_str(), key = key; "push");
                    params.resize(grad.len(), 0.);
                    self.handle.push(key, grad, &mut params).await.map(|_| key)
                }
                msg => {
                    let err = ServerErr::UnexpectedMessage { got: msg.kind() };
                    return self.fail(err).await;
                }
            };

            match res {
                Ok(key) => {
                    let msg = Msg::Data(Payload::Params {
                        key,
                        params: &params,
                    });

                    self.tx.send(&msg).await?;
                }
                Err(e) => return self.fail(e.into()).await,
            }
        }
    }

    /// Notifies the worker about a fatal error before aborting.
    async fn fail(&mut self, err: ServerErr) -> Result<()> {
        let text = err.to_string();
        if let Err(e) = self.tx.send(&Msg::Err(text.into())).await {
            warn!("couldn't notify the worker about the failure: {e}");
        }

        Err(err)
    }
}

/// Whether the `Params` reply of `len` elements for `key` fits in a single frame.
fn fits_in_frame(key: &str, len: usize) -> bool {
    // kind header, key length and the padded key
    let head = 2 * size_of::<u32>() + key.len().next_multiple_of(size_of::<u32>());

    len.checked_mul(size_of::<f32>())
        .and_then(|bytes| bytes.checked_add(head))
        .is_some_and(|bytes| bytes <= MAX_FRAME_LEN)
}
