//! Framing and decoding failures.

use thiserror::Error;

/// Per-connection protocol violations.
///
/// Any of these is fatal to the connection that produced the bytes: the framing layer
/// cannot resynchronize a corrupt length-prefixed stream, so the reactor drains pending
/// output and closes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Outer frame length is zero or exceeds [`crate::MAX_LEN`].
    #[error("invalid frame length {0}")]
    InvalidLength(u32),

    /// Declared string count exceeds [`crate::MAX_LEN`].
    #[error("string count {0} exceeds limit")]
    OversizedCount(u32),

    /// A declared string extends past the end of the frame body.
    #[error("frame body is shorter than its declared contents")]
    ShortPayload,

    /// Bytes remain in the frame body after all declared strings were read.
    #[error("{0} trailing bytes after frame contents")]
    TrailingBytes(usize),

    /// A tagged value was cut short.
    #[error("truncated value")]
    Truncated,

    /// Unknown value tag byte.
    #[error("unknown value tag {0}")]
    UnknownTag(u8),

    /// Unknown error code inside an `ERR` value.
    #[error("unknown error code {0}")]
    UnknownErrCode(u32),
}
