//! Error types for stride-store.

use std::path::PathBuf;

use stride_types::ParseError;

/// Result type for stride-store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in stride-store.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Database error from SQLite.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Failed to create database directory.
    #[error("Failed to create database directory {path}: {source}")]
    CreateDirectory {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Timestamp outside the storable range.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Device id rejected before touching the database.
    #[error(transparent)]
    InvalidDeviceId(#[from] ParseError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
