//! Error types for librelog operations.

use common::StorageError;

/// Errors returned by librelog operations.
///
/// The variants line up with how a caller must react: `Unauthorized`,
/// `InvalidInput`, `TooLarge` and `NotFound` are the caller's problem; `Storage`,
/// `Encoding` and `Internal` are ours.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Missing, malformed or unknown credential. Carries no detail about
    /// which of those it was.
    #[error("unauthorized")]
    Unauthorized,

    /// The request was well-formed transport-wise but its content was not.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A message exceeded the configured size limit.
    #[error("too large: {0}")]
    TooLarge(String),

    /// The logset (or token) does not exist or belongs to another owner.
    #[error("not found: {0}")]
    NotFound(String),

    /// The underlying storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Stored bytes could not be decoded.
    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<common::serde::DeserializeError> for Error {
    fn from(err: common::serde::DeserializeError) -> Self {
        Error::Encoding(err.message)
    }
}

/// Result type alias for librelog operations.
pub type Result<T> = std::result::Result<T, Error>;
