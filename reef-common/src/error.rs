//! Shared error model for cross-crate APIs.

use thiserror::Error;

/// Unified result type used by all public interfaces in `reef`.
pub type ReefResult<T> = Result<T, ReefError>;

/// High-level error categories surfaced by runtime components.
///
/// Protocol-level framing failures are deliberately not represented here; they are
/// per-connection conditions carried by `reef-wire` and never escalate past the reactor.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReefError {
    /// Configuration is invalid for the requested operation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    /// Runtime state does not allow this operation.
    #[error("invalid runtime state: {0}")]
    InvalidState(&'static str),

    /// Socket or filesystem I/O failed.
    #[error("io error: {0}")]
    Io(String),
}
