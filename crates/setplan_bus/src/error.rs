//! Error types for the event bus.

use setplan_core::{ErrorClass, PracticeId};
use thiserror::Error;

/// Result type for bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Errors that can occur when subscribing.
#[derive(Error, Debug)]
pub enum BusError {
    /// The subscriber may not see the requested scope.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// The practice does not exist.
    #[error("practice not found: {0}")]
    UnknownPractice(PracticeId),

    /// The subscription limit is reached.
    #[error("too many subscriptions (limit {limit})")]
    TooManySubscriptions {
        /// Configured limit.
        limit: usize,
    },

    /// The bus is shut down.
    #[error("bus closed")]
    Closed,

    /// Wire encoding failed.
    #[error("wire encoding error: {0}")]
    Wire(#[from] serde_json::Error),
}

impl BusError {
    /// Returns the taxonomy class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            BusError::NotAuthorized(_) => ErrorClass::Authorization,
            BusError::UnknownPractice(_) => ErrorClass::NotFound,
            BusError::TooManySubscriptions { .. } => ErrorClass::BusinessRule,
            BusError::Closed | BusError::Wire(_) => ErrorClass::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_classification() {
        assert_eq!(
            BusError::NotAuthorized("private".into()).class(),
            ErrorClass::Authorization
        );
        assert_eq!(
            BusError::UnknownPractice(PracticeId::new()).class(),
            ErrorClass::NotFound
        );
        assert_eq!(BusError::Closed.class(), ErrorClass::Internal);
    }

    #[test]
    fn error_display() {
        let msg = BusError::TooManySubscriptions { limit: 10 }.to_string();
        assert!(msg.contains("10"));
    }
}
