//! Practices, locations and practice summaries.

use crate::model::PracticeSet;
use crate::types::{ClubId, LocationId, PracticeId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Planning status of a practice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PracticeStatus {
    /// Still being planned.
    #[default]
    Draft,
    /// Published as ready.
    Ready,
}

/// A practice session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Practice {
    /// Practice ID.
    pub id: PracticeId,
    /// Owning club.
    pub club_id: ClubId,
    /// The user planning the practice.
    pub planner_id: UserId,
    /// Scheduled start.
    pub scheduled_at: DateTime<Utc>,
    /// Planning status.
    #[serde(default)]
    pub status: PracticeStatus,
    /// Private practices are visible to their planner only.
    #[serde(default)]
    pub is_private: bool,
}

impl Practice {
    /// Creates a draft practice.
    pub fn new(club_id: ClubId, planner_id: UserId, scheduled_at: DateTime<Utc>) -> Self {
        Self {
            id: PracticeId::new(),
            club_id,
            planner_id,
            scheduled_at,
            status: PracticeStatus::Draft,
            is_private: false,
        }
    }

    /// Marks the practice private.
    #[must_use]
    pub fn private(mut self) -> Self {
        self.is_private = true;
        self
    }
}

/// A training location of a club.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    /// Location ID.
    pub id: LocationId,
    /// Owning club.
    pub club_id: ClubId,
    /// Display name.
    pub name: String,
    /// The club's default location; its sets anchor each round.
    #[serde(default)]
    pub is_default: bool,
    /// Runs two dogs in parallel; roster entries need a lane.
    #[serde(default)]
    pub is_double_lane: bool,
}

impl Location {
    /// Creates a single-lane, non-default location.
    pub fn new(club_id: ClubId, name: impl Into<String>) -> Self {
        Self {
            id: LocationId::new(),
            club_id,
            name: name.into(),
            is_default: false,
            is_double_lane: false,
        }
    }

    /// Marks the location as the club default.
    #[must_use]
    pub fn default_location(mut self) -> Self {
        self.is_default = true;
        self
    }

    /// Marks the location as double-lane.
    #[must_use]
    pub fn double_lane(mut self) -> Self {
        self.is_double_lane = true;
        self
    }
}

/// Counts describing a practice's current schedule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSummary {
    /// The practice.
    pub practice_id: PracticeId,
    /// Number of sets across all locations.
    pub set_count: usize,
    /// Number of distinct rounds.
    pub round_count: usize,
    /// Number of warmup sets.
    pub warmup_count: usize,
    /// Number of roster entries across all sets.
    pub roster_entries: usize,
    /// Number of distinct dogs on any roster.
    pub dog_count: usize,
}

impl PracticeSummary {
    /// Computes the summary for a practice's sets.
    pub fn from_sets(practice_id: PracticeId, sets: &[PracticeSet]) -> Self {
        let rounds: BTreeSet<u32> = sets.iter().map(|s| s.index).collect();
        let dogs: BTreeSet<_> = sets.iter().flat_map(|s| s.dog_ids()).collect();

        Self {
            practice_id,
            set_count: sets.len(),
            round_count: rounds.len(),
            warmup_count: sets.iter().filter(|s| s.is_warmup).count(),
            roster_entries: sets.iter().map(|s| s.dogs.len()).sum(),
            dog_count: dogs.len(),
        }
    }
}
