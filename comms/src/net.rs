use std::{io, ops::Range};

use futures::future;
use log::{debug, info};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    OnoReceiver, OnoSender,
    identity::Identity,
    key::Key,
    msg::{Command, Msg, Payload},
    transport::Transport,
};

/// The connection to a single parameter server.
struct ServerConn<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    rx: OnoReceiver<R>,
    tx: OnoSender<W>,
    rx_buf: Vec<u32>,
}

/// The default amount of elements from which a tensor is sliced across every server.
pub const DEFAULT_MIN_SLICE_LEN: usize = 1000;

/// A `Transport` that talks to one or more parameter servers over framed streams.
///
/// Tensors shorter than `min_slice_len` go whole to the server `key.index() mod servers`,
/// which keeps the tensors of a small layer (`w`, `b`, `wd`, `bd`) together. Longer ones
/// are divided in even contiguous ranges, range `i` living on server `i`. A `w` key and
/// its `wd` pair have the same length, so their slices line up on every server.
pub struct NetTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    servers: Vec<ServerConn<R, W>>,
    min_slice_len: usize,
}

impl<R, W> Default for NetTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<R, W> NetTransport<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a new `NetTransport` without any server.
    ///
    /// # Returns
    /// A new `NetTransport` instance.
    pub fn new() -> Self {
        Self {
            servers: Vec::new(),
            min_slice_len: DEFAULT_MIN_SLICE_LEN,
        }
    }

    /// Sets the amount of elements from which tensors are sliced across servers.
    pub fn with_min_slice_len(mut self, min_slice_len: usize) -> Self {
        self.min_slice_len = min_slice_len.max(1);
        self
    }

    /// Adds a new server connection, its position defines which keys it owns.
    ///
    /// # Arguments
    /// * `rx` - The worker's receiving end of the communication.
    /// * `tx` - The worker's sending end of the communication.
    pub fn spawn(&mut self, rx: OnoReceiver<R>, tx: OnoSender<W>) {
        self.servers.push(ServerConn {
            rx,
            tx,
            rx_buf: Vec::new(),
        });
    }

    /// The amount of servers connected.
    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Resolves which servers hold `key` and the range of elements each one of them holds.
    ///
    /// # Arguments
    /// * `key` - The parameter to locate.
    /// * `len` - The amount of elements of the parameter.
    ///
    /// # Returns
    /// The non empty `(server, range)` pairs in server order, empty if there are no servers.
    pub fn route(&self, key: &Key, len: usize) -> Vec<(usize, Range<usize>)> {
        let n = self.servers.len();

        match n {
            0 => Vec::new(),
            _ if len < self.min_slice_len => vec![(key.index() % n, 0..len)],
            _ => (0..n)
                .map(|i| (i, len * i / n..len * (i + 1) / n))
                .filter(|(_, range)| !range.is_empty())
                .collect(),
        }
    }

    /// Announces this worker to every server.
    ///
    /// # Arguments
    /// * `identity` - The identity of this worker.
    ///
    /// # Returns
    /// An io error if occurred.
    pub async fn connect(&mut self, identity: &Identity) -> io::Result<()> {
        if self.servers.is_empty() {
            return Err(Self::no_servers());
        }

        let msg = Msg::Control(Command::Hello(identity.clone()));
        for server in &mut self.servers {
            server.tx.send(&msg).await?;
        }

        info!(servers = self.servers.len(); "connected as {identity}");
        Ok(())
    }

    fn no_servers() -> io::Error {
        io::Error::new(io::ErrorKind::NotConnected, "there are no parameter servers")
    }

    /// Sends one request per slice of `key`, then stitches every reply back into `buffer`.
    ///
    /// All the requests are sent before waiting for the first reply, so the servers
    /// work on their slices at the same time.
    async fn request(
        &mut self,
        key: &Key,
        grad: Option<&[f32]>,
        buffer: &mut [f32],
    ) -> io::Result<()> {
        let route = self.route(key, buffer.len());
        if route.is_empty() {
            return Err(Self::no_servers());
        }

        for (owner, range) in &route {
            let payload = match grad {
                Some(grad) => Payload::Push {
                    key: key.name(),
                    grad: &grad[range.clone()],
                },
                None => Payload::Pull {
                    key: key.name(),
                    len: range.len(),
                },
            };

            let msg = Msg::Data(payload);
            debug!(server = *owner, key = key.name(), len = range.len(); "sending {}", msg.kind());
            self.servers[*owner].tx.send(&msg).await?;
        }

        for (owner, range) in route {
            let ServerConn { rx, rx_buf, .. } = &mut self.servers[owner];
            let out = &mut buffer[range];

            match rx.recv_into(rx_buf).await? {
                Msg::Data(Payload::Params { key: got, .. }) if got != key.name() => {
                    let text = format!("server {owner} replied for key {got}, expected {key}");
                    return Err(io::Error::new(io::ErrorKind::InvalidData, text));
                }
                Msg::Data(Payload::Params { params, .. }) if params.len() != out.len() => {
                    let (expected, got) = (out.len(), params.len());
                    let text = format!(
                        "the length of the received params for {key} from server {owner} is invalid, expected {expected}, got {got}"
                    );
                    return Err(io::Error::new(io::ErrorKind::InvalidData, text));
                }
                Msg::Data(Payload::Params { params, .. }) => out.copy_from_slice(params),
                Msg::Err(detail) => {
                    let text = format!("server {owner} rejected {key}: {detail}");
                    return Err(io::Error::new(io::ErrorKind::InvalidData, text));
                }
                msg => {
                    let text = format!("expected params from server {owner}, got: {msg:?}");
                    return Err(io::Error::new(io::ErrorKind::InvalidData, text));
                }
            }
        }

        Ok(())
    }
}

impl<R, W> Transport for NetTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn pull_weight(&mut self, buffer: &mut [f32], key: &Key) -> io::Result<()> {
        self.request(key, None, buffer).await
    }

    async fn push_grad_and_pull_weight(
        &mut self,
        grad: &[f32],
        buffer: &mut [f32],
        key: &Key,
    ) -> io::Result<()> {
        if grad.len() != buffer.len() {
            let text = format!(
                "the gradient for {key} has {} elements, the buffer {}",
                grad.len(),
                buffer.len()
            );
            return Err(io::Error::new(io::ErrorKind::InvalidInput, text));
        }

        self.request(key, Some(grad), buffer).await
    }
    async fn disconnect(&mut self) -> io::Result<()> {
        let futs = self.servers.iter_mut().map(|server| async move {
            let msg = Msg::Control(Command::Disconnect);
            server.tx.send(&msg).await?;

            while !matches!(
                server.rx.recv_into(&mut server.rx_buf).await?,
                Msg::Control(Command::Disconnect)
            ) {}

            Ok::<_, io::Error>(())
        });

        future::try_join_all(futs).await?;
        Ok(())
    }
}
