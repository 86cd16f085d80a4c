use std::io;

use log::trace;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{LEN_SIZE, Serialize};

/// Writes length prefixed frames into `W`.
///
/// The owned part of every body is assembled in a reused buffer, right after a
/// placeholder for the length, and the borrowed tail is written straight from the caller.
pub struct OnoSender<W: AsyncWrite + Unpin> {
    tx: W,
    head: Vec<u8>,
}

impl<W: AsyncWrite + Unpin> OnoSender<W> {
    pub(super) fn new(tx: W) -> Self {
        Self {
            tx,
            head: Vec::new(),
        }
    }

    /// Frames and writes `msg`, flushing the writer afterwards.
    ///
    /// # Arguments
    /// * `msg` - The message to send.
    ///
    /// # Returns
    /// An io error if occurred.
    pub async fn send<'a, T: Serialize<'a>>(&mut self, msg: &'a T) -> io::Result<()> {
        self.head.clear();
        self.head.extend_from_slice(&[0; LEN_SIZE]);

        let tail = msg.serialize(&mut self.head).unwrap_or_default();
        let body_len = (self.head.len() - LEN_SIZE + tail.len()) as u64;
        self.head[..LEN_SIZE].copy_from_slice(&body_len.to_be_bytes());

        trace!(len = body_len; "sending frame");
        self.tx.write_all(&self.head).await?;
        if !tail.is_empty() {
            self.tx.write_all(tail).await?;
        }

        self.tx.flush().await
    }
}
