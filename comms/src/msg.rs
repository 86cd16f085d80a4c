use std::{borrow::Cow, io};

use crate::{Deserialize, Serialize, identity::Identity};

type Header = u32;
const HEADER_SIZE: usize = size_of::<Header>();
const WORD: usize = size_of::<u32>();

const ERR: Header = 0;
const CONTROL: Header = 1;
const PULL: Header = 2;
const PUSH: Header = 3;
const PARAMS: Header = 4;

/// The payload data for the `Data` variant of the `Msg` enum.
#[derive(Debug)]
pub enum Payload<'a> {
    /// Requests the current value of `key`, `len` is the amount of elements the caller expects.
    Pull { key: &'a str, len: usize },
    /// Submits a gradient for `key`.
    Push { key: &'a str, grad: &'a [f32] },
    /// The value of `key` after the request has been served.
    Params { key: &'a str, params: &'a [f32] },
}

/// The command for the `Control` variant of the `Msg` enum.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Connect,
    Hello(Identity),
    Disconnect,
}

/// The application layer message for the entire system.
#[derive(Debug)]
pub enum Msg<'a> {
    Control(Command),
    Data(Payload<'a>),
    Err(Cow<'a, str>),
}

impl Msg<'_> {
    /// A short name of the message kind, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Msg::Control(_) => "control",
            Msg::Err(_) => "err",
            Msg::Data(Payload::Pull { .. }) => "data/pull",
            Msg::Data(Payload::Push { .. }) => "data/push",
            Msg::Data(Payload::Params { .. }) => "data/params",
        }
    }

    fn invalid_data<T>(text: String) -> io::Result<T> {
        Err(io::Error::new(io::ErrorKind::InvalidData, text))
    }

    fn buf_is_too_small<T>(size: usize, needed: usize) -> io::Result<T> {
        Self::invalid_data(format!(
            "The given buffer is too small {size}, must at least be {needed} bytes"
        ))
    }
}

/// Writes the key length followed by the key bytes padded to a 4 bytes boundary.
fn put_key(buf: &mut Vec<u8>, key: &str) {
    buf.extend_from_slice(&(key.len() as u32).to_be_bytes());
    buf.extend_from_slice(key.as_bytes());
    buf.resize(buf.len().next_multiple_of(WORD), 0);
}

/// Reads a key written by `put_key`.
///
/// # Returns
/// The key and the rest of the buffer, starting at a 4 bytes boundary.
fn take_key(buf: &[u8]) -> io::Result<(&str, &[u8])> {
    let Some((len, rest)) = buf.split_first_chunk::<WORD>() else {
        return Msg::buf_is_too_small(buf.len(), WORD);
    };

    let len = u32::from_be_bytes(*len) as usize;
    let padded = len.next_multiple_of(WORD);

    if rest.len() < padded {
        return Msg::buf_is_too_small(rest.len(), padded);
    }

    let key = std::str::from_utf8(&rest[..len])
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

    Ok((key, &rest[padded..]))
}

fn cast_nums(buf: &[u8]) -> io::Result<&[f32]> {
    bytemuck::try_cast_slice(buf).map_err(|err| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Received a malformed parameter payload: {err}"),
        )
    })
}

impl<'a> Serialize<'a> for Msg<'a> {
    fn serialize(&'a self, buf: &mut Vec<u8>) -> Option<&'a [u8]> {
        match self {
            Msg::Err(e) => {
                buf.extend_from_slice(&ERR.to_be_bytes());
                Some(e.as_bytes())
            }
            Msg::Control(cmd) => {
                buf.extend_from_slice(&CONTROL.to_be_bytes());

                // SAFETY: Serialize impl for `Command` is derived and not implemented
                //         by hand. Nor has a non string-key map inside.
                serde_json::to_writer(buf, &cmd).unwrap();
                None
            }
            Msg::Data(Payload::Pull { key, len }) => {
                buf.extend_from_slice(&PULL.to_be_bytes());
                buf.extend_from_slice(&(*len as u64).to_be_bytes());
                put_key(buf, key);
                None
            }
            Msg::Data(Payload::Push { key, grad: nums })
            | Msg::Data(Payload::Params { key, params: nums }) => {
                let kind = match self {
                    Msg::Data(Payload::Push { .. }) => PUSH,
                    _ => PARAMS,
                };

                buf.extend_from_slice(&kind.to_be_bytes());
                put_key(buf, key);
                Some(bytemuck::cast_slice(nums))
            }
        }
    }
}

impl<'a> Deserialize<'a> for Msg<'a> {
    fn deserialize(buf: &'a [u8]) -> io::Result<Self> {
        let Some((kind, rest)) = buf.split_first_chunk::<HEADER_SIZE>() else {
            return Self::buf_is_too_small(buf.len(), HEADER_SIZE);
        };

        match Header::from_be_bytes(*kind) {
            ERR => {
                let string = std::str::from_utf8(rest)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

                Ok(Self::Err(Cow::Borrowed(string)))
            }
            CONTROL => {
                let cmd = serde_json::from_slice(rest)?;
                Ok(Self::Control(cmd))
            }
            PULL => {
                let Some((len, rest)) = rest.split_first_chunk::<8>() else {
                    return Self::buf_is_too_small(rest.len(), 8);
                };

                let len = u64::from_be_bytes(*len) as usize;
                let (key, _) = take_key(rest)?;
                Ok(Self::Data(Payload::Pull { key, len }))
            }
            PUSH => {
                let (key, rest) = take_key(rest)?;
                let grad = cast_nums(rest)?;
                Ok(Self::Data(Payload::Push { key, grad }))
            }
            PARAMS => {
                let (key, rest) = take_key(rest)?;
                let params = cast_nums(rest)?;
                Ok(Self::Data(Payload::Params { key, params }))
            }
            kind => Self::invalid_data(format!("Received an invalid kind header {kind}")),
        }
    }
}
