//! Set store.

use crate::error::{CoreError, CoreResult};
use crate::model::{Location, Practice, PracticeSet, PracticeSummary};
use crate::store::snapshot::StoreSnapshot;
use crate::store::state::{PendingWrite, WriteTransaction};
use crate::store::Tables;
use crate::types::{LocationId, PracticeId, SequenceNumber, SetId, TransactionId};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Holds practices, locations and sets.
///
/// ## Single-Writer Guarantee
///
/// Only one write transaction can be active at a time. `begin_write()`
/// acquires an exclusive lock that is held for the transaction's lifetime,
/// so invariant checks run against a state no other writer can change
/// before commit.
pub struct SetStore {
    /// Committed rows.
    tables: RwLock<Tables>,
    /// Write lock - only one writer at a time.
    write_lock: Mutex<()>,
    /// Next transaction ID.
    next_txid: AtomicU64,
    /// Last committed sequence.
    committed_seq: AtomicU64,
}

impl SetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::with_tables(Tables::default(), 0)
    }

    fn with_tables(tables: Tables, committed_seq: u64) -> Self {
        Self {
            tables: RwLock::new(tables),
            write_lock: Mutex::new(()),
            next_txid: AtomicU64::new(1),
            committed_seq: AtomicU64::new(committed_seq),
        }
    }

    /// Restores a store from a snapshot.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let tables = Tables {
            practices: snapshot.practices.into_iter().map(|p| (p.id, p)).collect(),
            locations: snapshot.locations.into_iter().map(|l| (l.id, l)).collect(),
            sets: snapshot.sets.into_iter().map(|s| (s.id, s)).collect(),
        };
        Self::with_tables(tables, snapshot.sequence.as_u64())
    }

    /// Exports the committed state.
    pub fn to_snapshot(&self) -> StoreSnapshot {
        let tables = self.tables.read();
        StoreSnapshot {
            sequence: self.committed_sequence(),
            practices: tables.practices.values().cloned().collect(),
            locations: tables.locations.values().cloned().collect(),
            sets: tables.sets.values().cloned().collect(),
        }
    }

    pub(crate) fn tables(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read()
    }

    /// Inserts or replaces a practice.
    ///
    /// Practice CRUD is owned by an external service; this only seeds the
    /// rows the batch operations resolve against.
    pub fn insert_practice(&self, practice: Practice) {
        self.tables.write().practices.insert(practice.id, practice);
    }

    /// Inserts or replaces a location.
    pub fn insert_location(&self, location: Location) {
        self.tables.write().locations.insert(location.id, location);
    }

    /// Reads a practice.
    pub fn practice(&self, id: PracticeId) -> Option<Practice> {
        self.tables.read().practices.get(&id).cloned()
    }

    /// Lists all practices.
    pub fn practices(&self) -> Vec<Practice> {
        self.tables.read().practices.values().cloned().collect()
    }

    /// Reads a location.
    pub fn location(&self, id: LocationId) -> Option<Location> {
        self.tables.read().locations.get(&id).cloned()
    }

    /// Reads a set.
    pub fn set(&self, id: SetId) -> Option<PracticeSet> {
        self.tables.read().sets.get(&id).cloned()
    }

    /// Reads every set of a practice, ordered by round then location.
    ///
    /// This is what clients use for a full refetch.
    pub fn sets_for_practice(&self, practice_id: PracticeId) -> Vec<PracticeSet> {
        self.tables.read().sets_for_practice(practice_id)
    }

    /// Computes the summary counts of a practice.
    pub fn practice_summary(&self, practice_id: PracticeId) -> CoreResult<PracticeSummary> {
        let tables = self.tables.read();
        if !tables.practices.contains_key(&practice_id) {
            return Err(CoreError::PracticeNotFound { practice_id });
        }
        Ok(PracticeSummary::from_sets(
            practice_id,
            &tables.sets_for_practice(practice_id),
        ))
    }

    /// Returns the last committed sequence number.
    pub fn committed_sequence(&self) -> SequenceNumber {
        SequenceNumber::new(self.committed_seq.load(Ordering::SeqCst))
    }

    /// Begins a write transaction.
    ///
    /// Blocks while another write transaction is alive.
    pub fn begin_write(&self) -> WriteTransaction<'_> {
        let guard = self.write_lock.lock();
        let txid = TransactionId::new(self.next_txid.fetch_add(1, Ordering::SeqCst));
        WriteTransaction::new(txid, self, guard)
    }

    /// Commits a write transaction.
    ///
    /// All staged writes become visible at once.
    pub fn commit(&self, txn: &mut WriteTransaction<'_>) -> CoreResult<SequenceNumber> {
        if !txn.is_active() {
            return Err(CoreError::invalid_operation("transaction not active"));
        }

        let writes = txn.take_writes();
        let write_count = writes.len();
        let sequence = {
            let mut tables = self.tables.write();
            for (id, write) in writes {
                match write {
                    PendingWrite::Put(set) => {
                        tables.sets.insert(id, set);
                    }
                    PendingWrite::Delete => {
                        tables.sets.remove(&id);
                    }
                }
            }
            SequenceNumber::new(self.committed_seq.fetch_add(1, Ordering::SeqCst) + 1)
        };

        txn.mark_committed();
        debug!(txn = %txn.id(), %sequence, writes = write_count, "committed");
        Ok(sequence)
    }
}

impl Default for SetStore {
    fn default() -> Self {
        Self::new()
    }
}
