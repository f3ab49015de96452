//! Error types for the message model.

use thiserror::Error;

/// Convenience type alias for Results using [`MessageError`].
pub type Result<T, E = MessageError> = std::result::Result<T, E>;

/// Errors raised by character-addressable message operations.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum MessageError {
    /// A character index fell outside `[0, char_len)`.
    #[error("character index {index} out of range (length {len})")]
    IndexOutOfRange {
        /// The requested index.
        index: usize,
        /// The message's character length at the time of the call.
        len: usize,
    },
}
