//! Error types for hook registration and dispatch.

use crate::event::EventKind;
use thiserror::Error;

/// Result type for hook operations.
pub type HookResult<T> = Result<T, HookError>;

/// Hook-specific errors.
#[derive(Debug, Error)]
pub enum HookError {
    /// The lifecycle source refused to attach a listener. Fatal at
    /// registration time; the registration that triggered installation
    /// is aborted.
    #[error("listener installation rejected for {entity_type}/{kind}: {reason}")]
    InstallRejected {
        /// Entity type the listener was being attached for
        entity_type: String,
        /// Event kind the listener was being attached for
        kind: EventKind,
        /// Reason reported by the lifecycle source
        reason: String,
    },

    /// A guard names a predicate the receiver does not recognize
    #[error("unknown guard predicate: {0}")]
    UnknownGuard(String),

    /// A target method name does not resolve on the receiver
    #[error("unknown target method: {0}")]
    UnknownTarget(String),

    /// The dispatch bridge rejected the hand-off
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    /// Serialization error (options or receiver reference)
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
}
