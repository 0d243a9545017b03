//! Error types for the access-layer engine.

use shardstore_protocol::StoreStatus;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in the reconciliation and data-access engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// No usable database reference after a create-if-not-exists call.
    /// Fatal: nothing downstream can proceed.
    #[error("database '{database_id}' unavailable (status {status})")]
    DatabaseUnavailable {
        /// Database id.
        database_id: String,
        /// Status returned by the store.
        status: StoreStatus,
    },

    /// No usable container reference after a create-if-not-exists call.
    /// Fatal for the reconciliation pass.
    #[error("container '{container_id}' unavailable (status {status})")]
    ContainerUnavailable {
        /// Container id.
        container_id: String,
        /// Status returned by the store.
        status: StoreStatus,
    },

    /// A data operation was invoked before reconciliation bound the
    /// container handle. A programming error, not a remote fault.
    #[error("container '{container_id}' is not bound; run schema reconciliation first")]
    NotBound {
        /// Container id.
        container_id: String,
    },

    /// The caller violated an argument contract.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The remote store rejected or failed a call.
    #[error("remote store error (status {status}): {message}")]
    Remote {
        /// Status carried by the fault.
        status: StoreStatus,
        /// Diagnostic payload.
        message: String,
    },

    /// A document could not be serialized or deserialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The operation's cancellation flag was tripped.
    #[error("operation cancelled")]
    Cancelled,
}

impl EngineError {
    /// Creates a remote fault with the given status and diagnostics.
    pub fn remote(status: StoreStatus, message: impl Into<String>) -> Self {
        Self::Remote {
            status,
            message: message.into(),
        }
    }

    /// Creates an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns true for conditions that abort the calling sequence
    /// outright rather than degrading it.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::DatabaseUnavailable { .. }
                | EngineError::ContainerUnavailable { .. }
                | EngineError::NotBound { .. }
                | EngineError::InvalidArgument(_)
        )
    }

    /// Returns true if retrying the call may succeed.
    ///
    /// The engine itself never retries; this is advisory for callers
    /// and concrete store clients.
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::Remote { status, .. } => status.is_retryable(),
            _ => false,
        }
    }

    /// Returns the remote status if this error carries one.
    pub fn status(&self) -> Option<StoreStatus> {
        match self {
            EngineError::Remote { status, .. } => Some(*status),
            EngineError::DatabaseUnavailable { status, .. } => Some(*status),
            EngineError::ContainerUnavailable { status, .. } => Some(*status),
            _ => None,
        }
    }
}
