mod align;
mod deserialize;
pub mod identity;
pub mod key;
pub mod msg;
pub mod net;
mod receiver;
mod sender;
mod serialize;
pub mod specs;
pub mod transport;

use tokio::io::{AsyncRead, AsyncWrite};

pub use align::Align4;
pub use deserialize::Deserialize;
pub use identity::{Identity, IdentityErr};
pub use key::{Key, KeyErr, Role};
pub use net::{DEFAULT_MIN_SLICE_LEN, NetTransport};
pub use receiver::OnoReceiver;
pub use sender::OnoSender;
pub use serialize::Serialize;
pub use transport::Transport;

/// Every frame starts with the length of its body as a big endian `u64`.
const LEN_SIZE: usize = size_of::<u64>();

/// The largest body a receiver accepts, in bytes.
pub const MAX_FRAME_LEN: usize = 1 << 30;

/// Wraps the halves of a stream into a framed receiver and sender.
pub fn channel<R, W>(rx: R, tx: W) -> (OnoReceiver<R>, OnoSender<W>)
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    (OnoReceiver::new(rx), OnoSender::new(tx))
}
