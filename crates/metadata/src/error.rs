//! Metadata store error types.

use thiserror::Error;

/// Fault raised by a key-value store backend.
///
/// Backends report what went wrong at the primitive level; the facade
/// translates these into per-operation [`MetadataError`] kinds.
#[derive(Debug, Error)]
pub enum KvError {
    #[error("{0}")]
    Transport(String),

    #[error("invalid continuation token: {0}")]
    InvalidContinuationToken(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for key-value store backends.
pub type KvResult<T> = std::result::Result<T, KvError>;

/// Metadata store operation errors.
///
/// Each operation kind wraps the underlying store fault's message verbatim
/// and the attempted id where one applies. Not-found is never an error for
/// point lookups; it maps to `Option::None`.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("metadata put failed for {id}: {message}")]
    PutFailed { id: String, message: String },

    #[error("metadata get failed for {id}: {message}")]
    GetFailed { id: String, message: String },

    #[error("metadata scan failed: {message}")]
    ScanFailed { message: String },

    #[error("metadata query failed: {message}")]
    QueryFailed { message: String },

    #[error("metadata update failed for {id}: {message}")]
    UpdateFailed { id: String, message: String },

    #[error("metadata delete failed for {id}: {message}")]
    DeleteFailed { id: String, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type for metadata operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;
