/// A type that can be written into the body of a frame.
pub trait Serialize<'a> {
    /// Should write the owned part of the body into `buf`.
    ///
    /// # Arguments
    /// * `buf` - The buffer holding the beginning of the body.
    ///
    /// # Returns
    /// An optional trailing slice sent right after `buf` without being copied.
    fn serialize(&'a self, buf: &mut Vec<u8>) -> Option<&'a [u8]>;
}
