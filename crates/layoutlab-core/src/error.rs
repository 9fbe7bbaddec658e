use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the toolkit crates. Runners wrap these in `anyhow`.
#[derive(Error, Debug)]
pub enum UiError {
    /// No image is registered (or shipped) under this name.
    #[error("image resource '{name}' not found")]
    ResourceNotFound { name: String },

    /// Bytes could not be decoded into RGBA pixels.
    #[error("failed to decode image '{name}': {reason}")]
    ImageDecode { name: String, reason: String },

    #[error("I/O error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The layout engine rejected the tree.
    #[error("layout failed: {0}")]
    Layout(String),
}
