//! Topics and subscription scopes.

use serde::{Deserialize, Serialize};
use setplan_core::{ChangeEvent, ClubId, EntityKind, Lifecycle, PracticeId};
use std::fmt;

/// A topic: entity kind by lifecycle stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    /// Entity kind.
    pub entity: EntityKind,
    /// Lifecycle stage.
    pub lifecycle: Lifecycle,
}

impl Topic {
    /// Set created or changed.
    pub const SET_UPDATED: Topic = Topic::new(EntityKind::Set, Lifecycle::Updated);
    /// Set deleted.
    pub const SET_DELETED: Topic = Topic::new(EntityKind::Set, Lifecycle::Deleted);
    /// Set rating changed.
    pub const RATING_UPDATED: Topic = Topic::new(EntityKind::SetRating, Lifecycle::Updated);
    /// Practice summary recomputed.
    pub const SUMMARY_UPDATED: Topic = Topic::new(EntityKind::PracticeSummary, Lifecycle::Updated);

    /// Creates a topic.
    pub const fn new(entity: EntityKind, lifecycle: Lifecycle) -> Self {
        Self { entity, lifecycle }
    }

    /// Every topic the core publishes on.
    pub fn all() -> [Topic; 4] {
        [
            Self::SET_UPDATED,
            Self::SET_DELETED,
            Self::RATING_UPDATED,
            Self::SUMMARY_UPDATED,
        ]
    }

    /// The topic an event is published on.
    pub fn of(event: &ChangeEvent) -> Self {
        Self::new(event.kind(), event.lifecycle())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}.{:?}", self.entity, self.lifecycle)
    }
}

/// What a subscription is parameterized by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Events of one practice.
    Practice(PracticeId),
    /// Events of every practice of a club.
    Club(ClubId),
}

impl Scope {
    /// Returns true if the event falls in this scope.
    pub fn contains(&self, event: &ChangeEvent) -> bool {
        match self {
            Scope::Practice(id) => event.audience.practice_id == *id,
            Scope::Club(id) => event.audience.club_id == *id,
        }
    }
}
