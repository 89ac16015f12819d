//! Sets (rounds) and their rosters.

use crate::types::{DogId, LocationId, PracticeId, SetDogId, SetId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lane of a double-lane location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Lane {
    /// Left lane.
    Left,
    /// Right lane.
    Right,
}

impl fmt::Display for Lane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lane::Left => write!(f, "left"),
            Lane::Right => write!(f, "right"),
        }
    }
}

/// Kind of exercise run in a set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SetType {
    /// Full run through the course.
    FullRun,
    /// Passing practice.
    Passing,
    /// Box work only.
    BoxWork,
    /// Recall practice.
    Recall,
    /// Jumps only.
    Jumps,
    /// Custom exercise, described by `type_custom`.
    Custom,
}

/// One roster entry: a dog's position within a lane of a set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDog {
    /// Entry ID.
    pub id: SetDogId,
    /// The dog.
    pub dog_id: DogId,
    /// Position within its lane.
    pub index: u32,
    /// Lane, required at double-lane locations.
    #[serde(default)]
    pub lane: Option<Lane>,
}

/// A set (round) of a practice at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSet {
    /// Set ID.
    pub id: SetId,
    /// Owning practice.
    pub practice_id: PracticeId,
    /// Location the set runs at.
    pub location_id: LocationId,
    /// Round number, shared across locations.
    pub index: u32,
    /// Exercise type.
    #[serde(rename = "type", default)]
    pub set_type: Option<SetType>,
    /// Free-form type name for custom exercises.
    #[serde(default)]
    pub type_custom: Option<String>,
    /// Whether this is a warmup set.
    #[serde(default)]
    pub is_warmup: bool,
    /// Rating given after the set ran.
    #[serde(default)]
    pub rating: Option<u8>,
    /// Notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// The roster.
    #[serde(default)]
    pub dogs: Vec<SetDog>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl PracticeSet {
    /// Creates an empty set.
    pub fn new(practice_id: PracticeId, location_id: LocationId, index: u32) -> Self {
        Self {
            id: SetId::new(),
            practice_id,
            location_id,
            index,
            set_type: None,
            type_custom: None,
            is_warmup: false,
            rating: None,
            notes: None,
            dogs: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Returns true if the dog is on the roster.
    pub fn has_dog(&self, dog_id: DogId) -> bool {
        self.dogs.iter().any(|d| d.dog_id == dog_id)
    }

    /// Iterates over the dogs on the roster.
    pub fn dog_ids(&self) -> impl Iterator<Item = DogId> + '_ {
        self.dogs.iter().map(|d| d.dog_id)
    }

    /// Ordering key used wherever sets are listed.
    pub fn sort_key(&self) -> (u32, LocationId, SetId) {
        (self.index, self.location_id, self.id)
    }
}
