//! Error types for the taskmerge engine.

use thiserror::Error;

/// All possible errors from the taskmerge engine.
///
/// Malformed content is never an error: the codec skips bad lines and
/// reports them alongside the parsed collection. Merging cannot fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// The underlying stream could not be read.
    #[error("failed to read record stream: {0}")]
    Read(String),

    /// The destination could not be written.
    #[error("failed to write record stream: {0}")]
    Write(String),
}

impl Error {
    pub(crate) fn read(err: std::io::Error) -> Self {
        Error::Read(err.to_string())
    }

    pub(crate) fn write(err: std::io::Error) -> Self {
        Error::Write(err.to_string())
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
