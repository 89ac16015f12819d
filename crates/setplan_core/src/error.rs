//! Error types for SetPlan core.

use crate::model::Lane;
use crate::types::{LocationId, PracticeId, SetId};
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Broad class of a [`CoreError`], used to map errors onto transport codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// A referenced set, practice or location does not exist.
    NotFound,
    /// The staged state breaks a structural invariant.
    Structural,
    /// The caller may not touch the practice.
    Authorization,
    /// A business rule rejected the request before any write.
    BusinessRule,
    /// The request itself is malformed.
    InvalidRequest,
    /// Storage or encoding failure.
    Internal,
}

/// Errors that can occur in SetPlan core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Set not found.
    #[error("set not found: {set_id}")]
    SetNotFound {
        /// The set ID that was not found.
        set_id: SetId,
    },

    /// Practice not found.
    #[error("practice not found: {practice_id}")]
    PracticeNotFound {
        /// The practice ID that was not found.
        practice_id: PracticeId,
    },

    /// Location not found (or not owned by the practice's club).
    #[error("location not found: {location_id}")]
    LocationNotFound {
        /// The location ID that was not found.
        location_id: LocationId,
    },

    /// A roster entry at a double-lane location has no lane.
    #[error(
        "location '{location_name}' ({location_id}) is double-lane but set {set_id} has a dog without a lane"
    )]
    MissingLane {
        /// The double-lane location.
        location_id: LocationId,
        /// Display name of the location.
        location_name: String,
        /// The set holding the incomplete entry.
        set_id: SetId,
    },

    /// Two roster entries share a position within one lane of a set.
    #[error("duplicate roster position {index} in set {set_id}, lane {}", lane_label(.lane))]
    DuplicateRosterIndex {
        /// The set holding the duplicate.
        set_id: SetId,
        /// The lane (none for single-lane locations).
        lane: Option<Lane>,
        /// The duplicated position.
        index: u32,
    },

    /// Two sets share a round index at one location.
    #[error("duplicate round {index} at location {location_id} in practice {practice_id}")]
    DuplicateSetIndex {
        /// The practice.
        practice_id: PracticeId,
        /// The location holding the duplicate.
        location_id: LocationId,
        /// The duplicated round index.
        index: u32,
    },

    /// A batch touched more than one practice.
    #[error("batch spans {} practices; all changes must target a single practice", .practices.len())]
    CrossPracticeBatch {
        /// Every practice the batch resolved to.
        practices: Vec<PracticeId>,
    },

    /// The caller may not modify or observe the practice.
    #[error("not authorized: {reason}")]
    NotAuthorized {
        /// Why access was denied.
        reason: String,
    },

    /// The default-location set of a round cannot be removed while other
    /// locations still run that round.
    #[error(
        "cannot delete set {set_id}: round {index} is still used at another location ({sibling})"
    )]
    AnchorRoundInUse {
        /// The default-location set.
        set_id: SetId,
        /// The round index.
        index: u32,
        /// A sibling set keeping the round alive.
        sibling: SetId,
    },

    /// The request is malformed.
    #[error("invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },

    /// Operation not permitted in current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why operation is invalid.
        message: String,
    },

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON encoding error.
    #[error("encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

fn lane_label(lane: &Option<Lane>) -> String {
    match lane {
        Some(lane) => lane.to_string(),
        None => "none".into(),
    }
}

impl CoreError {
    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Creates a not-authorized error.
    pub fn not_authorized(reason: impl Into<String>) -> Self {
        Self::NotAuthorized {
            reason: reason.into(),
        }
    }

    /// Returns the taxonomy class of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            CoreError::SetNotFound { .. }
            | CoreError::PracticeNotFound { .. }
            | CoreError::LocationNotFound { .. } => ErrorClass::NotFound,
            CoreError::MissingLane { .. }
            | CoreError::DuplicateRosterIndex { .. }
            | CoreError::DuplicateSetIndex { .. }
            | CoreError::CrossPracticeBatch { .. } => ErrorClass::Structural,
            CoreError::NotAuthorized { .. } => ErrorClass::Authorization,
            CoreError::AnchorRoundInUse { .. } => ErrorClass::BusinessRule,
            CoreError::InvalidRequest { .. } => ErrorClass::InvalidRequest,
            CoreError::InvalidOperation { .. } | CoreError::Io(_) | CoreError::Json(_) => {
                ErrorClass::Internal
            }
        }
    }
}

/// Failure to hand an event to the propagation layer.
///
/// Publishing is fire-and-forget: these errors are logged by the publisher
/// and never roll back a committed change.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The sink is shut down.
    #[error("event sink closed")]
    Closed,

    /// The sink refused the event.
    #[error("event rejected: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offending_key() {
        let location_id = LocationId::from_u128(9);
        let err = CoreError::MissingLane {
            location_id,
            location_name: "Ring 2".into(),
            set_id: SetId::from_u128(1),
        };
        let msg = err.to_string();
        assert!(msg.contains("Ring 2"));
        assert!(msg.contains(&location_id.to_string()));

        let err = CoreError::DuplicateRosterIndex {
            set_id: SetId::from_u128(1),
            lane: Some(Lane::Left),
            index: 3,
        };
        assert!(err.to_string().contains("lane left"));

        let err = CoreError::DuplicateRosterIndex {
            set_id: SetId::from_u128(1),
            lane: None,
            index: 3,
        };
        assert!(err.to_string().contains("lane none"));
    }

    #[test]
    fn error_classification() {
        assert_eq!(
            CoreError::SetNotFound {
                set_id: SetId::new()
            }
            .class(),
            ErrorClass::NotFound
        );
        assert_eq!(
            CoreError::CrossPracticeBatch { practices: vec![] }.class(),
            ErrorClass::Structural
        );
        assert_eq!(
            CoreError::not_authorized("private").class(),
            ErrorClass::Authorization
        );
        assert_eq!(
            CoreError::AnchorRoundInUse {
                set_id: SetId::new(),
                index: 1,
                sibling: SetId::new(),
            }
            .class(),
            ErrorClass::BusinessRule
        );
        assert_eq!(
            CoreError::invalid_request("empty").class(),
            ErrorClass::InvalidRequest
        );
    }
}
