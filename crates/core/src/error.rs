//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no file provided")]
    MissingFile,

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("image too large: {size} bytes (max: {max})")]
    ImageTooLarge { size: usize, max: usize },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
