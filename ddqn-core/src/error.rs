//! Errors in the library.
use thiserror::Error;

/// Errors raised by the learning core.
///
/// Public functions of this crate return [`anyhow::Result`]; a caller that needs
/// to branch on the kind of failure can recover this type with
/// [`anyhow::Error::downcast_ref`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DdqnError {
    /// More transitions were requested than the replay memory holds.
    #[error("Insufficient memory: requested {requested} transitions, but only {available} are stored")]
    InsufficientMemory {
        /// Requested batch size.
        requested: usize,
        /// Number of stored transitions.
        available: usize,
    },

    /// Fields of a batch are malformed or inconsistent with each other.
    #[error("Batch shape error: {0}")]
    BatchShape(String),

    /// An action index is outside of the action space.
    #[error("Invalid action {action}: the action space has {n_actions} actions")]
    InvalidAction {
        /// The offending action index.
        action: usize,
        /// Size of the action space.
        n_actions: usize,
    },

    /// A configuration violates a precondition of the training loop.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A record has no value with the given key.
    #[error("Record key error: {0}")]
    RecordKey(String),

    /// A record value is not of the requested type.
    #[error("Record value type error: expected {0}")]
    RecordValueType(String),
}
