use std::io;

use log::trace;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::{Align4, Deserialize, MAX_FRAME_LEN};

/// Reads length prefixed frames out of `R`.
pub struct OnoReceiver<R: AsyncRead + Unpin> {
    rx: R,
}

impl<R: AsyncRead + Unpin> OnoReceiver<R> {
    pub(super) fn new(rx: R) -> Self {
        Self { rx }
    }

    /// Waits for the next frame and parses it.
    ///
    /// The body is read into `buf`, whose element type keeps it 4 bytes aligned, and the
    /// returned message borrows from it.
    ///
    /// # Arguments
    /// * `buf` - The reusable storage for the body.
    ///
    /// # Returns
    /// The parsed message, or an io error. Bodies over `MAX_FRAME_LEN` bytes are
    /// rejected as `InvalidData` before anything is allocated.
    pub async fn recv_into<'buf, T, B>(&mut self, buf: &'buf mut Vec<B>) -> io::Result<T>
    where
        T: Deserialize<'buf>,
        B: Align4,
    {
        let len = self.rx.read_u64().await?;
        let len = usize::try_from(len)
            .ok()
            .filter(|&len| len <= MAX_FRAME_LEN)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidData,
                    format!("frame of {len} bytes exceeds the limit of {MAX_FRAME_LEN}"),
                )
            })?;

        buf.clear();
        buf.resize(len.div_ceil(size_of::<B>()), B::zeroed());

        let body = &mut bytemuck::cast_slice_mut::<B, u8>(buf)[..len];
        self.rx.read_exact(body).await?;

        trace!(len = len; "received frame");
        T::deserialize(body)
    }
}
