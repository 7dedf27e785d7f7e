//! Error types for the migration driver.

use thiserror::Error;

use galena_types::AclId;

use crate::state::DriverState;

/// Errors surfaced by the Keeper migration client.
///
/// The split matters to the event loop: transient errors are retried on
/// the next poll with state unchanged, authentication failures go to the
/// fault handler while the worker keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeeperClientError {
    /// Retryable store failure: connection loss, session expiry, or a
    /// conditional write rejected because the epoch node moved.
    #[error("keeper error: {0}")]
    Transient(String),

    /// The client could not authenticate against the Keeper.
    #[error("keeper authentication failure: {0}")]
    Auth(String),
}

/// Errors raised inside driver event handlers.
///
/// Every variant is `Clone` so a cause can reach both the event's
/// completion callback and the shared exception classifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    #[error(transparent)]
    Client(#[from] KeeperClientError),

    /// A log commit future did not resolve before its deadline.
    #[error("timed out waiting for the log to commit during {op}")]
    CommitTimeout { op: String },

    /// A log commit future was dropped without resolving.
    #[error("log commit future abandoned during {op}")]
    CommitAbandoned { op: String },

    /// Transition outside the legal relation. A programming error.
    #[error("invalid driver state transition {from} -> {to}")]
    InvalidTransition { from: DriverState, to: DriverState },

    /// A delta deleted an ACL the previous image never contained.
    #[error("cannot delete unknown ACL {id}")]
    UnknownAclDeletion { id: AclId },

    /// The event queue is shut down.
    #[error("event queue closed")]
    QueueClosed,
}

/// Result type for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors loading or saving the driver configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
