//! Change feed for observing committed set changes.
//!
//! The batch applier publishes events through an injected [`EventSink`]
//! after every commit. Events are never emitted for rolled back batches.
//!
//! [`ChangeFeed`] is the in-memory sink: it keeps a bounded history for
//! polling and fans events out to local channel subscribers. The live,
//! authorization-aware fan-out lives in the bus crate.
//!
//! # Usage
//!
//! ```rust,ignore
//! use setplan_core::{BatchApplier, ChangeFeed, SetStore};
//!
//! let feed = Arc::new(ChangeFeed::new());
//! let applier = BatchApplier::new(store, feed.clone());
//! let receiver = feed.subscribe();
//!
//! applier.apply_batch(&caller, deltas)?;
//! while let Ok(event) = receiver.try_recv() {
//!     println!("Change: {:?}", event);
//! }
//! ```

use crate::error::PublishError;
use crate::model::{Practice, PracticeSet, PracticeSummary};
use crate::types::{ClubId, PracticeId, SequenceNumber, SetId, UserId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, Sender};
use uuid::Uuid;

/// Kind of entity an event is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKind {
    /// A set and its roster.
    Set,
    /// A set's rating.
    SetRating,
    /// The practice summary counts.
    PracticeSummary,
}

/// Lifecycle stage of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Lifecycle {
    /// Entity was created or changed.
    Updated,
    /// Entity was deleted.
    Deleted,
}

/// Who may receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Audience {
    /// Club owning the practice.
    pub club_id: ClubId,
    /// The practice.
    pub practice_id: PracticeId,
    /// Set when the practice is private to its planner.
    pub private_to: Option<UserId>,
}

impl Audience {
    /// Builds the audience of a practice.
    pub fn for_practice(practice: &Practice) -> Self {
        Self {
            club_id: practice.club_id,
            practice_id: practice.id,
            private_to: practice.is_private.then_some(practice.planner_id),
        }
    }
}

/// Payload of a change event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ChangePayload {
    /// A set was created or changed; carries the committed row.
    SetUpdated(PracticeSet),
    /// A set was deleted.
    #[serde(rename_all = "camelCase")]
    SetDeleted {
        /// The deleted set.
        set_id: SetId,
    },
    /// A set's rating changed.
    #[serde(rename_all = "camelCase")]
    RatingChanged {
        /// The set.
        set_id: SetId,
        /// Rating before the change.
        previous: Option<u8>,
        /// Rating after the change.
        rating: Option<u8>,
    },
    /// Recomputed practice counts.
    Summary(PracticeSummary),
}

/// A single change event.
///
/// Change events are emitted only after a transaction commits. All events
/// of one commit share its sequence number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Sequence number of the commit.
    pub sequence: SequenceNumber,
    /// Who may receive the event.
    pub audience: Audience,
    /// What changed.
    pub payload: ChangePayload,
}

impl ChangeEvent {
    /// Creates a set-updated event.
    pub fn set_updated(sequence: SequenceNumber, audience: Audience, set: PracticeSet) -> Self {
        Self {
            sequence,
            audience,
            payload: ChangePayload::SetUpdated(set),
        }
    }

    /// Creates a set-deleted event.
    pub fn set_deleted(sequence: SequenceNumber, audience: Audience, set_id: SetId) -> Self {
        Self {
            sequence,
            audience,
            payload: ChangePayload::SetDeleted { set_id },
        }
    }

    /// Creates a rating-changed event.
    pub fn rating_changed(
        sequence: SequenceNumber,
        audience: Audience,
        set_id: SetId,
        previous: Option<u8>,
        rating: Option<u8>,
    ) -> Self {
        Self {
            sequence,
            audience,
            payload: ChangePayload::RatingChanged {
                set_id,
                previous,
                rating,
            },
        }
    }

    /// Creates a summary event.
    pub fn summary(sequence: SequenceNumber, audience: Audience, summary: PracticeSummary) -> Self {
        Self {
            sequence,
            audience,
            payload: ChangePayload::Summary(summary),
        }
    }

    /// Kind of entity the event is about.
    pub fn kind(&self) -> EntityKind {
        match self.payload {
            ChangePayload::SetUpdated(_) | ChangePayload::SetDeleted { .. } => EntityKind::Set,
            ChangePayload::RatingChanged { .. } => EntityKind::SetRating,
            ChangePayload::Summary(_) => EntityKind::PracticeSummary,
        }
    }

    /// Lifecycle stage of the event.
    pub fn lifecycle(&self) -> Lifecycle {
        match self.payload {
            ChangePayload::SetDeleted { .. } => Lifecycle::Deleted,
            _ => Lifecycle::Updated,
        }
    }

    /// ID of the entity the event is about.
    ///
    /// Set events use the set ID, summaries the practice ID.
    pub fn entity_id(&self) -> Uuid {
        match &self.payload {
            ChangePayload::SetUpdated(set) => *set.id.as_uuid(),
            ChangePayload::SetDeleted { set_id } | ChangePayload::RatingChanged { set_id, .. } => {
                *set_id.as_uuid()
            }
            ChangePayload::Summary(summary) => *summary.practice_id.as_uuid(),
        }
    }
}

/// Destination for committed change events.
pub trait EventSink: Send + Sync {
    /// Publishes one event. Errors are reported but never undo the commit.
    fn publish(&self, event: ChangeEvent) -> Result<(), PublishError>;
}

/// In-memory [`EventSink`] recording committed set changes.
///
/// Events keep publish order. The oldest events fall out of the history
/// once it exceeds its limit.
pub struct ChangeFeed {
    /// Local channel subscribers.
    subscribers: RwLock<Vec<Sender<ChangeEvent>>>,
    /// Most recent events, oldest first.
    history: RwLock<Vec<ChangeEvent>>,
    /// Maximum history size.
    max_history: usize,
}

impl ChangeFeed {
    /// Creates a new change feed.
    pub fn new() -> Self {
        Self::with_max_history(10_000)
    }

    /// Creates a change feed with a specific history limit.
    pub fn with_max_history(max_history: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            history: RwLock::new(Vec::new()),
            max_history,
        }
    }

    /// Returns a receiver for every event emitted from now on.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Records an event and forwards it to live subscribers.
    pub fn emit(&self, event: ChangeEvent) {
        {
            let mut history = self.history.write();
            history.push(event.clone());
            if history.len() > self.max_history {
                let to_remove = history.len() - self.max_history;
                history.drain(0..to_remove);
            }
        }

        // Dropped receivers are pruned here.
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Polls events from a sequence cursor.
    ///
    /// Returns events with sequence > cursor, up to limit.
    pub fn poll(&self, cursor: SequenceNumber, limit: usize) -> Vec<ChangeEvent> {
        let history = self.history.read();
        history
            .iter()
            .filter(|e| e.sequence > cursor)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Returns every event still in history.
    pub fn events(&self) -> Vec<ChangeEvent> {
        self.history.read().clone()
    }

    /// Returns the latest sequence number in history.
    pub fn latest_sequence(&self) -> SequenceNumber {
        self.history
            .read()
            .last()
            .map(|e| e.sequence)
            .unwrap_or_default()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Returns the number of events in history.
    pub fn history_len(&self) -> usize {
        self.history.read().len()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ChangeFeed {
    fn publish(&self, event: ChangeEvent) -> Result<(), PublishError> {
        self.emit(event);
        Ok(())
    }
}
