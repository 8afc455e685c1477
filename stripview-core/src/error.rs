//! Error types for stripview-core.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for stripview operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for stripview operations.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested record source is not known to the reader.
    #[error("record source not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed JSON in a configuration or record payload.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error while loading configuration.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
