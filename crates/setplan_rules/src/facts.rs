//! Lookups shared by every rule.

use crate::config::RuleConfig;
use crate::diagnostic::DogRef;
use crate::snapshot::{PracticeSnapshot, ValidationContext};
use chrono::{DateTime, Utc};
use setplan_core::{
    merge_attendance, AttendanceStatus, ClubSettings, Dog, DogId, Handler, HandlerId, Practice,
    PracticeSet,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Indexed view of a [`PracticeSnapshot`].
///
/// Built once per validation run. Every list it hands out is in a stable
/// order so rules stay deterministic.
pub struct Facts<'a> {
    snapshot: &'a PracticeSnapshot,
    context: &'a ValidationContext,
    config: &'a RuleConfig,
    sets: Vec<&'a PracticeSet>,
    attendance: BTreeMap<DogId, AttendanceStatus>,
    dogs: HashMap<DogId, &'a Dog>,
    handlers: HashMap<HandlerId, &'a Handler>,
    appearances: BTreeMap<DogId, u32>,
}

impl<'a> Facts<'a> {
    /// Indexes a snapshot.
    pub fn new(
        snapshot: &'a PracticeSnapshot,
        context: &'a ValidationContext,
        config: &'a RuleConfig,
    ) -> Self {
        let practice_id = snapshot.practice.id;

        let mut sets: Vec<&PracticeSet> = snapshot
            .sets
            .iter()
            .filter(|s| s.practice_id == practice_id)
            .collect();
        sets.sort_by_key(|s| s.sort_key());

        // Later records for the same dog win.
        let attendance = merge_attendance(practice_id, &snapshot.attendance, &snapshot.dogs)
            .into_iter()
            .map(|record| (record.dog_id, record.status))
            .collect();

        let mut appearances = BTreeMap::new();
        for set in &sets {
            let distinct: BTreeSet<DogId> = set.dog_ids().collect();
            for dog_id in distinct {
                *appearances.entry(dog_id).or_insert(0) += 1;
            }
        }

        Self {
            snapshot,
            context,
            config,
            sets,
            attendance,
            dogs: snapshot.dogs.iter().map(|d| (d.id, d)).collect(),
            handlers: snapshot.handlers.iter().map(|h| (h.id, h)).collect(),
            appearances,
        }
    }

    /// The practice being validated.
    pub fn practice(&self) -> &'a Practice {
        &self.snapshot.practice
    }

    /// The practice's sets in display order.
    pub fn sets(&self) -> &[&'a PracticeSet] {
        &self.sets
    }

    /// Rule thresholds.
    pub fn config(&self) -> &RuleConfig {
        self.config
    }

    /// Evaluation instant, if known.
    pub fn now(&self) -> Option<DateTime<Utc>> {
        self.context.now
    }

    /// Club settings, if known.
    pub fn club_settings(&self) -> Option<&ClubSettings> {
        self.context.club_settings.as_ref()
    }

    /// Effective attendance status of a dog. `None` if the dog has no
    /// record and is not an active registry dog.
    pub fn status(&self, dog_id: DogId) -> Option<AttendanceStatus> {
        self.attendance.get(&dog_id).copied()
    }

    /// Dogs with the given effective status, in id order.
    pub fn dogs_with_status(&self, status: AttendanceStatus) -> Vec<DogId> {
        self.attendance
            .iter()
            .filter(|(_, s)| **s == status)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Dogs confirmed attending.
    pub fn confirmed_dogs(&self) -> Vec<DogId> {
        self.dogs_with_status(AttendanceStatus::Attending)
    }

    /// Confirmed dogs that are not marked inactive in the registry.
    pub fn confirmed_active_dogs(&self) -> Vec<DogId> {
        self.confirmed_dogs()
            .into_iter()
            .filter(|id| self.dogs.get(id).is_none_or(|d| d.is_active()))
            .collect()
    }

    /// Every dog on any roster, in id order.
    pub fn rostered_dogs(&self) -> Vec<DogId> {
        self.appearances.keys().copied().collect()
    }

    /// Number of sets the dog appears in.
    pub fn appearances(&self, dog_id: DogId) -> u32 {
        self.appearances.get(&dog_id).copied().unwrap_or(0)
    }

    /// Registry record of a dog.
    pub fn dog(&self, dog_id: DogId) -> Option<&'a Dog> {
        self.dogs.get(&dog_id).copied()
    }

    /// Handler who runs the dog.
    pub fn handler_of(&self, dog_id: DogId) -> Option<HandlerId> {
        self.dog(dog_id).map(|d| d.owner_id)
    }

    /// Display name of a handler, or its id when unknown.
    pub fn handler_name(&self, handler_id: HandlerId) -> String {
        self.handlers
            .get(&handler_id)
            .map_or_else(|| handler_id.to_string(), |h| h.display_name())
    }

    /// Reference to a dog for payloads.
    pub fn dog_ref(&self, dog_id: DogId) -> DogRef {
        DogRef {
            dog_id,
            name: self
                .dog(dog_id)
                .map_or_else(|| dog_id.to_string(), |d| d.name.clone()),
        }
    }

    /// References to dogs, ordered by name then id.
    pub fn dog_refs(&self, ids: impl IntoIterator<Item = DogId>) -> Vec<DogRef> {
        let mut refs: Vec<DogRef> = ids.into_iter().map(|id| self.dog_ref(id)).collect();
        refs.sort_by(|a, b| a.name.cmp(&b.name).then(a.dog_id.cmp(&b.dog_id)));
        refs
    }
}

/// `"1 dog"`, `"2 dogs"`.
pub(crate) fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setplan_core::{Attendance, ClubId, LocationId, SetDog, SetDogId, UserId};

    #[test]
    fn counts_each_set_once_per_dog() {
        let owner = HandlerId::new();
        let pip = Dog::new("Pip", owner);
        let practice = Practice::new(ClubId::new(), UserId::new(), Utc::now());
        let mut set = PracticeSet::new(practice.id, LocationId::new(), 1);
        for index in 1..=2 {
            set.dogs.push(SetDog {
                id: SetDogId::new(),
                dog_id: pip.id,
                index,
                lane: None,
            });
        }
        let mut snapshot = PracticeSnapshot::new(practice);
        snapshot.sets = vec![set];
        snapshot.dogs = vec![pip.clone()];
        let ctx = ValidationContext::default();
        let config = RuleConfig::default();

        let facts = Facts::new(&snapshot, &ctx, &config);
        assert_eq!(facts.appearances(pip.id), 1);
        assert_eq!(facts.status(pip.id), Some(AttendanceStatus::Unknown));
    }

    #[test]
    fn explicit_records_override_virtual_ones() {
        let owner = HandlerId::new();
        let pip = Dog::new("Pip", owner);
        let mut snapshot =
            PracticeSnapshot::new(Practice::new(ClubId::new(), UserId::new(), Utc::now()));
        snapshot.attendance = vec![Attendance::new(
            snapshot.practice.id,
            pip.id,
            AttendanceStatus::Attending,
        )];
        snapshot.dogs = vec![pip.clone()];
        let ctx = ValidationContext::default();
        let config = RuleConfig::default();

        let facts = Facts::new(&snapshot, &ctx, &config);
        assert_eq!(facts.confirmed_dogs(), vec![pip.id]);
        assert!(facts.dogs_with_status(AttendanceStatus::Unknown).is_empty());
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "dog"), "1 dog");
        assert_eq!(plural(3, "dog"), "3 dogs");
    }
}
