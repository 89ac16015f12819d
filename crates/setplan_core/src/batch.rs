//! Batched set changes.
//!
//! [`BatchApplier`] is the only way sets and rosters change. Each call runs
//! in one write transaction:
//!
//! 1. resolve every delta to its practice (one practice per batch)
//! 2. check the caller's scope before staging anything
//! 3. stage all rows
//! 4. re-validate the entire practice (see [`crate::invariants`])
//! 5. commit, then publish events
//!
//! Any failure before the commit drops the transaction, so nothing of the
//! batch becomes visible.

use crate::access::Caller;
use crate::change_feed::{Audience, ChangeEvent, EventSink};
use crate::compaction;
use crate::config::Config;
use crate::error::{CoreError, CoreResult};
use crate::invariants;
use crate::model::{Lane, Practice, PracticeSet, PracticeSummary, SetDog, SetType};
use crate::store::{SetStore, WriteTransaction};
use crate::types::{DogId, LocationId, PracticeId, SequenceNumber, SetDogId, SetId};
use chrono::Utc;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Deserializes a present field (including `null`) as `Some(value)`.
///
/// Together with `#[serde(default)]` this tells "absent" (`None`) apart
/// from "explicitly cleared" (`Some(None)`).
fn present<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// One dog assignment in a roster replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterEntry {
    /// The dog.
    pub dog_id: DogId,
    /// Position within its lane.
    pub index: u32,
    /// Lane, required at double-lane locations.
    #[serde(default)]
    pub lane: Option<Lane>,
}

impl RosterEntry {
    /// Creates an entry without a lane.
    pub fn new(dog_id: DogId, index: u32) -> Self {
        Self {
            dog_id,
            index,
            lane: None,
        }
    }

    /// Places the entry in a lane.
    #[must_use]
    pub fn in_lane(mut self, lane: Lane) -> Self {
        self.lane = Some(lane);
        self
    }
}

/// A change to one set.
///
/// Without an `id` the delta creates a set; with one it updates that set.
/// Fields left `None` are unchanged. Nullable fields use `Some(None)` to
/// clear the value. A provided `dogs` list replaces the whole roster; the
/// previous roster is discarded, not diffed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetDelta {
    /// Set to update; `None` creates a new set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<SetId>,
    /// Practice (required on create).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice_id: Option<PracticeId>,
    /// Location (required on create).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<LocationId>,
    /// Round index (required on create).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<u32>,
    /// Exercise type.
    #[serde(
        rename = "type",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub set_type: Option<Option<SetType>>,
    /// Custom type name.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub type_custom: Option<Option<String>>,
    /// Notes.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<Option<String>>,
    /// Warmup flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_warmup: Option<bool>,
    /// Rating.
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<Option<u8>>,
    /// Full roster replacement.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dogs: Option<Vec<RosterEntry>>,
}

impl SetDelta {
    /// Starts a delta creating a set.
    pub fn create(practice_id: PracticeId, location_id: LocationId, index: u32) -> Self {
        Self {
            practice_id: Some(practice_id),
            location_id: Some(location_id),
            index: Some(index),
            ..Self::default()
        }
    }

    /// Starts a delta updating a set.
    pub fn update(id: SetId) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Moves the set to another round.
    #[must_use]
    pub fn with_index(mut self, index: u32) -> Self {
        self.index = Some(index);
        self
    }

    /// Moves the set to another location.
    #[must_use]
    pub fn with_location(mut self, location_id: LocationId) -> Self {
        self.location_id = Some(location_id);
        self
    }

    /// Sets or clears the exercise type.
    #[must_use]
    pub fn with_type(mut self, set_type: Option<SetType>, custom: Option<String>) -> Self {
        self.set_type = Some(set_type);
        self.type_custom = Some(custom);
        self
    }

    /// Sets or clears the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = Some(notes);
        self
    }

    /// Sets the warmup flag.
    #[must_use]
    pub fn with_warmup(mut self, is_warmup: bool) -> Self {
        self.is_warmup = Some(is_warmup);
        self
    }

    /// Sets or clears the rating.
    #[must_use]
    pub fn with_rating(mut self, rating: Option<u8>) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Replaces the roster.
    #[must_use]
    pub fn with_dogs(mut self, dogs: Vec<RosterEntry>) -> Self {
        self.dogs = Some(dogs);
        self
    }

    /// Combines two deltas of the same set. Fields provided by `later` win;
    /// the rest come from `self`.
    #[must_use]
    pub fn overlay(self, later: SetDelta) -> Self {
        Self {
            id: later.id.or(self.id),
            practice_id: later.practice_id.or(self.practice_id),
            location_id: later.location_id.or(self.location_id),
            index: later.index.or(self.index),
            set_type: later.set_type.or(self.set_type),
            type_custom: later.type_custom.or(self.type_custom),
            notes: later.notes.or(self.notes),
            is_warmup: later.is_warmup.or(self.is_warmup),
            rating: later.rating.or(self.rating),
            dogs: later.dogs.or(self.dogs),
        }
    }

    /// Merges the provided fields into a row without touching its
    /// modification time.
    ///
    /// A provided roster replaces the old one with fresh roster rows.
    pub fn merge_fields(&self, set: &mut PracticeSet) {
        if let Some(location_id) = self.location_id {
            set.location_id = location_id;
        }
        if let Some(index) = self.index {
            set.index = index;
        }
        if let Some(set_type) = self.set_type {
            set.set_type = set_type;
        }
        if let Some(custom) = &self.type_custom {
            set.type_custom = custom.clone();
        }
        if let Some(notes) = &self.notes {
            set.notes = notes.clone();
        }
        if let Some(is_warmup) = self.is_warmup {
            set.is_warmup = is_warmup;
        }
        if let Some(rating) = self.rating {
            set.rating = rating;
        }
        if let Some(dogs) = &self.dogs {
            set.dogs = dogs
                .iter()
                .map(|entry| SetDog {
                    id: SetDogId::new(),
                    dog_id: entry.dog_id,
                    index: entry.index,
                    lane: entry.lane,
                })
                .collect();
        }
    }

    /// Merges the fields and stamps the modification time.
    fn apply_to(&self, set: &mut PracticeSet) {
        self.merge_fields(set);
        set.updated_at = Utc::now();
    }
}

/// Applies and deletes batches of sets while enforcing the structural
/// invariants.
pub struct BatchApplier {
    store: Arc<SetStore>,
    sink: Arc<dyn EventSink>,
    config: Config,
}

impl BatchApplier {
    /// Creates an applier with the default configuration.
    pub fn new(store: Arc<SetStore>, sink: Arc<dyn EventSink>) -> Self {
        Self::with_config(store, sink, Config::default())
    }

    /// Creates an applier with a custom configuration.
    pub fn with_config(store: Arc<SetStore>, sink: Arc<dyn EventSink>, config: Config) -> Self {
        Self {
            store,
            sink,
            config,
        }
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &Arc<SetStore> {
        &self.store
    }

    /// Creates or updates sets atomically.
    ///
    /// Returns the committed rows in delta order. On error nothing is
    /// committed and no event is published.
    pub fn apply_batch(
        &self,
        caller: &Caller,
        deltas: Vec<SetDelta>,
    ) -> CoreResult<Vec<PracticeSet>> {
        if deltas.is_empty() {
            return Ok(Vec::new());
        }
        self.check_batch_size(deltas.len())?;

        let mut txn = self.store.begin_write();
        let practice = self.resolve_apply_practice(&txn, &deltas)?;
        caller.authorize(&practice)?;
        let club_locations = txn.club_locations(practice.club_id);

        // Several deltas may target one set; it is reported once, in the
        // order it was first staged.
        let mut staged_ids = Vec::with_capacity(deltas.len());
        let mut seen = HashSet::new();
        let mut rated: HashMap<SetId, Option<u8>> = HashMap::new();
        for delta in &deltas {
            let mut row = match delta.id {
                Some(id) => txn.set(id).ok_or(CoreError::SetNotFound { set_id: id })?,
                None => new_row(practice.id, delta)?,
            };
            if delta.rating.is_some() {
                let before = if delta.id.is_some() { row.rating } else { None };
                rated.entry(row.id).or_insert(before);
            }
            delta.apply_to(&mut row);

            if !club_locations.contains_key(&row.location_id) {
                return Err(CoreError::LocationNotFound {
                    location_id: row.location_id,
                });
            }
            if seen.insert(row.id) {
                staged_ids.push(row.id);
            }
            txn.put(row)?;
        }
        debug!(practice = %practice.id, staged = staged_ids.len(), "batch staged");

        let sets = txn.sets_in_practice(practice.id);
        if let Err(violation) = invariants::check_practice(practice.id, &sets, &club_locations) {
            warn!(practice = %practice.id, error = %violation, "batch rolled back");
            return Err(violation);
        }

        let committed: Vec<PracticeSet> = staged_ids
            .iter()
            .filter_map(|id| txn.set(*id))
            .collect();
        let sequence = self.store.commit(&mut txn)?;
        drop(txn);
        info!(practice = %practice.id, %sequence, sets = committed.len(), "batch applied");

        let audience = Audience::for_practice(&practice);
        let mut events: Vec<ChangeEvent> = committed
            .iter()
            .map(|set| ChangeEvent::set_updated(sequence, audience, set.clone()))
            .collect();
        events.extend(committed.iter().filter_map(|set| {
            let previous = *rated.get(&set.id)?;
            (previous != set.rating).then(|| {
                ChangeEvent::rating_changed(sequence, audience, set.id, previous, set.rating)
            })
        }));
        events.push(self.summary_event(sequence, audience, &sets));
        self.publish_all(events);

        Ok(committed)
    }

    /// Deletes sets atomically and closes the rounds they vacate.
    ///
    /// Returns `true` once the delete is committed.
    pub fn delete_batch(&self, caller: &Caller, ids: &[SetId]) -> CoreResult<bool> {
        if ids.is_empty() {
            return Ok(true);
        }
        self.check_batch_size(ids.len())?;

        let mut txn = self.store.begin_write();
        let mut targets = Vec::with_capacity(ids.len());
        let mut seen = HashSet::new();
        for id in ids {
            let set = txn.set(*id).ok_or(CoreError::SetNotFound { set_id: *id })?;
            if seen.insert(set.id) {
                targets.push(set);
            }
        }

        let practice_ids: BTreeSet<PracticeId> = targets.iter().map(|s| s.practice_id).collect();
        let practice = single_practice(&txn, practice_ids)?;
        caller.authorize(&practice)?;
        let club_locations = txn.club_locations(practice.club_id);

        let before = txn.sets_in_practice(practice.id);
        check_anchor_rounds(&targets, &before, &seen, &club_locations)?;

        for set in &targets {
            txn.delete(set.id)?;
        }
        let remaining = txn.sets_in_practice(practice.id);
        let vacated = compaction::vacated_rounds(&before, &remaining);
        let plan = compaction::plan_compaction(&remaining, &vacated);

        let now = Utc::now();
        let mut shifted = Vec::with_capacity(plan.len());
        for mut set in remaining.into_iter().filter(|s| plan.contains_key(&s.id)) {
            set.index = plan[&set.id];
            set.updated_at = now;
            shifted.push(set.clone());
            txn.put(set)?;
        }

        let sets = txn.sets_in_practice(practice.id);
        if let Err(violation) = invariants::check_practice(practice.id, &sets, &club_locations) {
            warn!(practice = %practice.id, error = %violation, "delete rolled back");
            return Err(violation);
        }

        let sequence = self.store.commit(&mut txn)?;
        drop(txn);
        info!(
            practice = %practice.id,
            %sequence,
            deleted = targets.len(),
            vacated = ?vacated,
            shifted = shifted.len(),
            "batch deleted"
        );

        let audience = Audience::for_practice(&practice);
        let mut events: Vec<ChangeEvent> = targets
            .iter()
            .map(|set| ChangeEvent::set_deleted(sequence, audience, set.id))
            .collect();
        events.extend(
            shifted
                .into_iter()
                .map(|set| ChangeEvent::set_updated(sequence, audience, set)),
        );
        events.push(self.summary_event(sequence, audience, &sets));
        self.publish_all(events);

        Ok(true)
    }

    fn check_batch_size(&self, len: usize) -> CoreResult<()> {
        if len > self.config.max_batch_size {
            return Err(CoreError::invalid_request(format!(
                "batch too large: {} > {}",
                len, self.config.max_batch_size
            )));
        }
        Ok(())
    }

    fn resolve_apply_practice(
        &self,
        txn: &WriteTransaction<'_>,
        deltas: &[SetDelta],
    ) -> CoreResult<Practice> {
        let mut practice_ids = BTreeSet::new();
        for delta in deltas {
            match delta.id {
                Some(id) => {
                    let existing = txn.set(id).ok_or(CoreError::SetNotFound { set_id: id })?;
                    practice_ids.insert(existing.practice_id);
                    if let Some(requested) = delta.practice_id {
                        practice_ids.insert(requested);
                    }
                }
                None => {
                    let practice_id = delta
                        .practice_id
                        .ok_or_else(|| CoreError::invalid_request("new set requires practiceId"))?;
                    practice_ids.insert(practice_id);
                }
            }
        }
        single_practice(txn, practice_ids)
    }

    fn summary_event(
        &self,
        sequence: SequenceNumber,
        audience: Audience,
        sets: &[PracticeSet],
    ) -> ChangeEvent {
        let summary = PracticeSummary::from_sets(audience.practice_id, sets);
        ChangeEvent::summary(sequence, audience, summary)
    }

    /// Publishes events after commit. Failures are logged and dropped.
    fn publish_all(&self, events: Vec<ChangeEvent>) {
        for event in events {
            let kind = event.kind();
            let sequence = event.sequence;
            if let Err(e) = self.sink.publish(event) {
                warn!(?kind, %sequence, error = %e, "event publish failed");
            }
        }
    }
}

fn new_row(practice_id: PracticeId, delta: &SetDelta) -> CoreResult<PracticeSet> {
    let location_id = delta
        .location_id
        .ok_or_else(|| CoreError::invalid_request("new set requires locationId"))?;
    let index = delta
        .index
        .ok_or_else(|| CoreError::invalid_request("new set requires index"))?;
    Ok(PracticeSet::new(practice_id, location_id, index))
}

fn single_practice(
    txn: &WriteTransaction<'_>,
    practice_ids: BTreeSet<PracticeId>,
) -> CoreResult<Practice> {
    let mut ids = practice_ids.into_iter();
    match (ids.next(), ids.next()) {
        (Some(practice_id), None) => txn
            .practice(practice_id)
            .ok_or(CoreError::PracticeNotFound { practice_id }),
        (Some(first), Some(second)) => {
            let mut practices = vec![first, second];
            practices.extend(ids);
            Err(CoreError::CrossPracticeBatch { practices })
        }
        (None, _) => Err(CoreError::invalid_request("batch has no practice")),
    }
}

/// Rejects deleting a default-location set while another location still
/// runs the same round and that sibling is not deleted too.
fn check_anchor_rounds(
    targets: &[PracticeSet],
    current: &[PracticeSet],
    deleting: &HashSet<SetId>,
    locations: &HashMap<LocationId, crate::model::Location>,
) -> CoreResult<()> {
    for target in targets {
        let is_default = locations
            .get(&target.location_id)
            .is_some_and(|l| l.is_default);
        if !is_default {
            continue;
        }
        let sibling = current.iter().find(|s| {
            s.index == target.index
                && s.location_id != target.location_id
                && !deleting.contains(&s.id)
        });
        if let Some(sibling) = sibling {
            return Err(CoreError::AnchorRoundInUse {
                set_id: target.id,
                index: target.index,
                sibling: sibling.id,
            });
        }
    }
    Ok(())
}
