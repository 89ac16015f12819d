//! Validation input.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use setplan_core::{Attendance, ClubSettings, Dog, Handler, Practice, PracticeSet};

/// Everything known about one practice at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeSnapshot {
    /// The practice.
    pub practice: Practice,
    /// Its sets, in any order.
    #[serde(default)]
    pub sets: Vec<PracticeSet>,
    /// Explicit attendance records.
    #[serde(default)]
    pub attendance: Vec<Attendance>,
    /// The club's dogs.
    #[serde(default)]
    pub dogs: Vec<Dog>,
    /// The club's handlers.
    #[serde(default)]
    pub handlers: Vec<Handler>,
}

impl PracticeSnapshot {
    /// Creates a snapshot with no sets, attendance or registry records.
    pub fn new(practice: Practice) -> Self {
        Self {
            practice,
            sets: Vec::new(),
            attendance: Vec::new(),
            dogs: Vec::new(),
            handlers: Vec::new(),
        }
    }

    /// Parses a snapshot from JSON.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Serializes the snapshot to pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Evaluation context.
///
/// Rules that need a missing piece of context produce nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationContext {
    /// Evaluation instant.
    pub now: Option<DateTime<Utc>>,
    /// Settings of the practice's club.
    pub club_settings: Option<ClubSettings>,
}

impl ValidationContext {
    /// Creates a context evaluated at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Some(now),
            club_settings: None,
        }
    }

    /// Sets the club settings.
    #[must_use]
    pub fn with_settings(mut self, settings: ClubSettings) -> Self {
        self.club_settings = Some(settings);
        self
    }
}
