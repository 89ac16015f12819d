//! Write transaction state.

use crate::error::{CoreError, CoreResult};
use crate::model::{Location, Practice, PracticeSet};
use crate::store::manager::SetStore;
use crate::types::{ClubId, LocationId, PracticeId, SetId, TransactionId};
use parking_lot::MutexGuard;
use std::collections::{BTreeMap, HashMap};

/// State of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    /// Transaction is active and can stage writes.
    Active,
    /// Transaction has been committed.
    Committed,
}

/// A staged write.
#[derive(Debug, Clone)]
pub enum PendingWrite {
    /// Insert or replace a set row.
    Put(PracticeSet),
    /// Delete a set row.
    Delete,
}

/// An active write transaction.
///
/// Holds the store's writer lock for its whole lifetime. Reads go through
/// the staged writes first, then the committed tables. Dropping the
/// transaction without committing discards every staged write.
pub struct WriteTransaction<'a> {
    id: TransactionId,
    store: &'a SetStore,
    state: TransactionState,
    writes: BTreeMap<SetId, PendingWrite>,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> WriteTransaction<'a> {
    pub(crate) fn new(id: TransactionId, store: &'a SetStore, guard: MutexGuard<'a, ()>) -> Self {
        Self {
            id,
            store,
            state: TransactionState::Active,
            writes: BTreeMap::new(),
            _guard: guard,
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> TransactionId {
        self.id
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> TransactionState {
        self.state
    }

    /// Checks if the transaction is still active.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == TransactionState::Active
    }

    /// Reads a practice.
    pub fn practice(&self, id: PracticeId) -> Option<Practice> {
        self.store.tables().practices.get(&id).cloned()
    }

    /// Reads every location of a club, keyed by ID.
    pub fn club_locations(&self, club_id: ClubId) -> HashMap<LocationId, Location> {
        self.store
            .tables()
            .locations
            .values()
            .filter(|l| l.club_id == club_id)
            .map(|l| (l.id, l.clone()))
            .collect()
    }

    /// Reads a set, seeing staged writes.
    pub fn set(&self, id: SetId) -> Option<PracticeSet> {
        match self.writes.get(&id) {
            Some(PendingWrite::Put(set)) => Some(set.clone()),
            Some(PendingWrite::Delete) => None,
            None => self.store.tables().sets.get(&id).cloned(),
        }
    }

    /// Reads every set of a practice, seeing staged writes.
    ///
    /// Sets are ordered by round, then location, then ID.
    pub fn sets_in_practice(&self, practice_id: PracticeId) -> Vec<PracticeSet> {
        let mut sets: Vec<PracticeSet> = self
            .store
            .tables()
            .sets_for_practice(practice_id)
            .into_iter()
            .filter(|s| !self.writes.contains_key(&s.id))
            .collect();

        sets.extend(self.writes.values().filter_map(|write| match write {
            PendingWrite::Put(set) if set.practice_id == practice_id => Some(set.clone()),
            _ => None,
        }));
        sets.sort_by_key(PracticeSet::sort_key);
        sets
    }

    /// Stages a set insert or replacement.
    pub fn put(&mut self, set: PracticeSet) -> CoreResult<()> {
        self.ensure_active()?;
        self.writes.insert(set.id, PendingWrite::Put(set));
        Ok(())
    }

    /// Stages a set deletion.
    pub fn delete(&mut self, id: SetId) -> CoreResult<()> {
        self.ensure_active()?;
        self.writes.insert(id, PendingWrite::Delete);
        Ok(())
    }

    /// Returns the number of pending writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }

    pub(crate) fn take_writes(&mut self) -> BTreeMap<SetId, PendingWrite> {
        std::mem::take(&mut self.writes)
    }

    pub(crate) fn mark_committed(&mut self) {
        self.state = TransactionState::Committed;
    }

    fn ensure_active(&self) -> CoreResult<()> {
        match self.state {
            TransactionState::Active => Ok(()),
            TransactionState::Committed => Err(CoreError::invalid_operation(
                "transaction already committed",
            )),
        }
    }
}
