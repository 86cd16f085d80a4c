use std::io;

/// A type that can be read from the body of a frame, borrowing from it.
pub trait Deserialize<'a>: Sized {
    /// Should parse a full frame body.
    ///
    /// # Arguments
    /// * `buf` - The body of the frame, 4 bytes aligned.
    ///
    /// # Returns
    /// The parsed value or an `io::Error` of kind `InvalidData`.
    fn deserialize(buf: &'a [u8]) -> io::Result<Self>;
}
