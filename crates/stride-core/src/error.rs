//! Error types for stride-core.
//!
//! The step detector and the analytics engine are pure computations: the
//! only runtime failures they report are configuration errors at
//! construction time. "No data" is never an error; every analytics function
//! has a defined zero result for an empty timeline.
//!
//! | Error Type | When | Recovery |
//! |------------|------|----------|
//! | [`Error::InvalidConfig`] | Detector or session built with bad parameters | Fix configuration and rebuild |
//! | [`Error::InvalidData`] | A packet or identifier fails validation | Do not retry, report to caller |

use thiserror::Error;

use stride_types::ParseError;

/// Errors that can occur in stride-core.
///
/// This enum is marked `#[non_exhaustive]` to allow adding new error variants
/// in future versions without breaking downstream code.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum Error {
    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Data failed validation.
    #[error(transparent)]
    InvalidData(#[from] ParseError),
}

/// Result type alias using stride-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;
