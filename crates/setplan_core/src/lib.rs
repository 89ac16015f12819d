//! # SetPlan Core
//!
//! Set scheduling store for SetPlan.
//!
//! This crate provides:
//! - The practice data model (practices, locations, sets, roster entries)
//! - An in-memory store with single-writer transactions
//! - Structural invariant checks over a practice snapshot
//! - Round compaction after deletes
//! - The batch applier that stages, validates and commits set changes
//! - The change feed interface committed changes are published through
//!
//! ## Key Invariants
//!
//! - Within a (practice, location) pair no two sets share an index
//! - Every roster entry of a double-lane location carries a lane
//! - Within a (set, lane) pair no two roster entries share an index
//! - Round indices are compacted only when no location keeps a set there

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
pub mod batch;
pub mod change_feed;
pub mod compaction;
mod config;
mod error;
pub mod invariants;
pub mod model;
mod store;
mod types;

pub use access::Caller;
pub use batch::{BatchApplier, RosterEntry, SetDelta};
pub use change_feed::{
    Audience, ChangeEvent, ChangeFeed, ChangePayload, EntityKind, EventSink, Lifecycle,
};
pub use config::Config;
pub use error::{CoreError, CoreResult, ErrorClass, PublishError};
pub use model::{
    merge_attendance, Attendance, AttendanceStatus, ClubSettings, Dog, DogStatus, Handler, Lane,
    Location, Practice, PracticeSet, PracticeStatus, PracticeSummary, SetDog, SetType,
};
pub use store::{PendingWrite, SetStore, StoreSnapshot, TransactionState, WriteTransaction};
pub use types::{
    ClubId, DogId, HandlerId, LocationId, PracticeId, SequenceNumber, SetDogId, SetId,
    TransactionId, UserId,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
