//! Pure reducer over a practice's set list.
//!
//! Every action produces a new state sorted by `(index, location, id)`.
//! The reducer is deterministic: the same state and action always produce
//! the same result, and actions on disjoint sets commute.

use chrono::{DateTime, Utc};
use setplan_core::{
    ChangeEvent, ChangePayload, PracticeId, PracticeSet, PracticeSummary, SetDelta, SetId,
};

/// Ordered set list of one practice.
#[derive(Debug, Clone, PartialEq)]
pub struct SetListState {
    /// The practice.
    pub practice_id: PracticeId,
    /// Sets sorted by round, then location, then id.
    pub sets: Vec<PracticeSet>,
    /// Last pushed practice summary.
    pub summary: Option<PracticeSummary>,
    /// Bumped by every applied action.
    pub version: u64,
}

impl SetListState {
    /// Creates an empty state.
    pub fn new(practice_id: PracticeId) -> Self {
        Self {
            practice_id,
            sets: Vec::new(),
            summary: None,
            version: 0,
        }
    }

    /// Finds a set.
    pub fn get(&self, id: SetId) -> Option<&PracticeSet> {
        self.sets.iter().find(|s| s.id == id)
    }

    /// Returns the number of sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns true if there are no sets.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Round indices in list order.
    pub fn indices(&self) -> Vec<u32> {
        self.sets.iter().map(|s| s.index).collect()
    }

    fn upsert(&mut self, set: PracticeSet) {
        match self.sets.iter_mut().find(|s| s.id == set.id) {
            Some(existing) => *existing = set,
            None => self.sets.push(set),
        }
    }

    fn remove(&mut self, id: SetId) {
        self.sets.retain(|s| s.id != id);
    }
}

/// A state transition.
#[derive(Debug, Clone)]
pub enum Action {
    /// Full load; replaces the list.
    ReplaceAll(Vec<PracticeSet>),
    /// Inserts a confirmed row, replacing a row with the same id.
    Add(PracticeSet),
    /// Merges fields into a known set and re-stamps it. Unknown ids are
    /// ignored.
    Update {
        /// The set.
        id: SetId,
        /// Fields to merge.
        fields: SetDelta,
        /// New modification time.
        at: DateTime<Utc>,
    },
    /// Removes a set. Unknown ids are ignored.
    Remove(SetId),
    /// A pushed change event.
    Remote(ChangeEvent),
}

/// Applies one action.
///
/// Rows and events belonging to other practices are ignored.
pub fn reduce(mut state: SetListState, action: Action) -> SetListState {
    let practice_id = state.practice_id;
    match action {
        Action::ReplaceAll(sets) => {
            state.sets = sets
                .into_iter()
                .filter(|s| s.practice_id == practice_id)
                .collect();
        }
        Action::Add(set) => {
            if set.practice_id == practice_id {
                state.upsert(set);
            }
        }
        Action::Update { id, fields, at } => {
            if let Some(set) = state.sets.iter_mut().find(|s| s.id == id) {
                fields.merge_fields(set);
                set.updated_at = at;
            }
        }
        Action::Remove(id) => state.remove(id),
        Action::Remote(event) => {
            if event.audience.practice_id == practice_id {
                apply_remote(&mut state, event.payload);
            }
        }
    }
    state.sets.sort_by_key(|s| s.sort_key());
    state.version += 1;
    state
}

fn apply_remote(state: &mut SetListState, payload: ChangePayload) {
    match payload {
        ChangePayload::SetUpdated(set) => {
            if set.practice_id == state.practice_id {
                state.upsert(set);
            }
        }
        ChangePayload::SetDeleted { set_id } => state.remove(set_id),
        ChangePayload::RatingChanged { set_id, rating, .. } => {
            if let Some(set) = state.sets.iter_mut().find(|s| s.id == set_id) {
                set.rating = rating;
            }
        }
        ChangePayload::Summary(summary) => state.summary = Some(summary),
    }
}
