//! Error types for purity subtraction

use std::path::PathBuf;

use thiserror::Error;

/// psub-core error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed histogram or axis definition
    #[error("Validation error: {0}")]
    Validation(String),

    /// Purity or purity uncertainty outside the accepted domain
    #[error("invalid purity: {0}")]
    InvalidPurity(String),

    /// Named histogram absent from a container
    #[error("histogram not found: {0}")]
    HistogramNotFound(String),

    /// Signal and background binning differ
    #[error("incompatible histograms '{signal}' and '{background}': {reason}")]
    IncompatibleHistograms {
        /// Signal histogram name.
        signal: String,
        /// Background histogram name.
        background: String,
        /// First mismatch found.
        reason: String,
    },

    /// Create-only output refused to replace an existing file
    #[error("output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Container document with an unknown format tag or version
    #[error("unsupported container format: {0}")]
    Format(String),

    /// Input file that could not be decoded
    #[error("malformed input: {0}")]
    Decode(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
