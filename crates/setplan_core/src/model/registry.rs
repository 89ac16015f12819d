//! Records consumed from the external dog, handler and club registries.

use crate::types::{ClubId, DogId, HandlerId};
use serde::{Deserialize, Serialize};

/// Membership status of a dog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DogStatus {
    /// Currently training with the club.
    #[default]
    Active,
    /// Retired or away.
    Inactive,
}

/// A dog from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dog {
    /// Dog ID.
    pub id: DogId,
    /// Call name.
    pub name: String,
    /// The handler who owns and runs the dog.
    pub owner_id: HandlerId,
    /// Free-form training level.
    #[serde(default)]
    pub training_level: Option<String>,
    /// Membership status.
    #[serde(default)]
    pub status: DogStatus,
}

impl Dog {
    /// Creates an active dog.
    pub fn new(name: impl Into<String>, owner_id: HandlerId) -> Self {
        Self {
            id: DogId::new(),
            name: name.into(),
            owner_id,
            training_level: None,
            status: DogStatus::Active,
        }
    }

    /// Returns true if the dog is active.
    pub fn is_active(&self) -> bool {
        self.status == DogStatus::Active
    }
}

/// A handler from the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handler {
    /// Handler ID.
    pub id: HandlerId,
    /// Given name.
    pub given_name: String,
    /// Family name.
    #[serde(default)]
    pub family_name: String,
}

impl Handler {
    /// Creates a handler.
    pub fn new(given_name: impl Into<String>, family_name: impl Into<String>) -> Self {
        Self {
            id: HandlerId::new(),
            given_name: given_name.into(),
            family_name: family_name.into(),
        }
    }

    /// Full display name.
    pub fn display_name(&self) -> String {
        if self.family_name.is_empty() {
            self.given_name.clone()
        } else {
            format!("{} {}", self.given_name, self.family_name)
        }
    }
}

/// Club-level scheduling settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClubSettings {
    /// The club.
    pub club_id: ClubId,
    /// How many sets each attending dog should ideally run.
    pub ideal_sets_per_dog: u32,
}
