//! Error types for ROOT file reading.

use thiserror::Error;

/// ROOT reader error type
#[derive(Error, Debug)]
pub enum RootError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File does not start with the `root` magic bytes
    #[error("not a ROOT file (bad magic)")]
    BadMagic,

    /// Read past the end of a buffer
    #[error("buffer underflow at offset {offset}: need {need} bytes, have {have}")]
    BufferUnderflow {
        /// Read position.
        offset: usize,
        /// Bytes requested.
        need: usize,
        /// Bytes available.
        have: usize,
    },

    /// Compressed block could not be decoded
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Object layout did not match what the streamer expects
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// No key with this name
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Object class has no reader
    #[error("unsupported class: {0}")]
    UnsupportedClass(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, RootError>;
