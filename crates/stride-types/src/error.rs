//! Error types for data validation in stride-types.

use thiserror::Error;

/// Errors that can occur when validating Stride data.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum ParseError {
    /// The data is malformed or out of range.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// The device identifier is empty or too long.
    #[error("Invalid device id: {0}")]
    InvalidDeviceId(String),
}

/// Result type alias using stride-types' ParseError type.
pub type ParseResult<T> = std::result::Result<T, ParseError>;
