pub mod server;
pub mod worker;

use std::{fs, io, path::Path};

use serde::de::DeserializeOwned;

/// Loads a JSON specification from `path`.
///
/// # Arguments
/// * `path` - The location of the JSON document.
///
/// # Returns
/// The parsed specification or an io error if the file can't be read or parsed.
pub fn load<T: DeserializeOwned>(path: impl AsRef<Path>) -> io::Result<T> {
    let raw = fs::read(path)?;
    let spec = serde_json::from_slice(&raw)?;
    Ok(spec)
}
