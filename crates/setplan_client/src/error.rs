//! Error types for the client.

use setplan_core::{CoreError, ErrorClass};
use thiserror::Error;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that can occur in a client session.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Network or transport error.
    #[error("transport error: {message}")]
    Transport {
        /// Error message.
        message: String,
        /// Whether the operation can be retried.
        retryable: bool,
    },

    /// The service rejected the change.
    #[error("rejected: {0}")]
    Rejected(#[from] CoreError),

    /// The request cannot be sent as is.
    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    /// The dispatcher task is gone.
    #[error("dispatcher stopped")]
    DispatcherStopped,

    /// The dispatcher queue is full.
    #[error("dispatcher queue full")]
    QueueFull,
}

impl ClientError {
    /// Creates a retryable transport error.
    pub fn transport_retryable(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: true,
        }
    }

    /// Creates a non-retryable transport error.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns true if sending the same request again could succeed.
    ///
    /// Sessions never retry on their own; this only informs the caller.
    pub fn is_retryable(&self) -> bool {
        match self {
            ClientError::Transport { retryable, .. } => *retryable,
            ClientError::QueueFull => true,
            ClientError::Rejected(e) => matches!(e.class(), ErrorClass::Structural),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setplan_core::{LocationId, PracticeId, SetId};

    #[test]
    fn retryable_errors() {
        assert!(ClientError::transport_retryable("connection lost").is_retryable());
        assert!(!ClientError::transport_fatal("bad request").is_retryable());
        assert!(ClientError::QueueFull.is_retryable());
        assert!(!ClientError::DispatcherStopped.is_retryable());
    }

    #[test]
    fn lost_race_is_retryable() {
        let err = ClientError::from(CoreError::DuplicateSetIndex {
            practice_id: PracticeId::new(),
            location_id: LocationId::new(),
            index: 2,
        });
        assert!(err.is_retryable());

        let err = ClientError::from(CoreError::SetNotFound {
            set_id: SetId::new(),
        });
        assert!(!err.is_retryable());
    }
}
