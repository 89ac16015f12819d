//! In-memory set store with single-writer transactions.
//!
//! The store provides:
//! - **Atomicity**: staged writes are applied all at once on commit, or
//!   discarded when the transaction is dropped
//! - **Isolation**: readers never see staged rows
//! - **Serialized writers**: one write transaction at a time, so a batch
//!   racing another on the same round fails validation after the first
//!   commits

mod manager;
mod snapshot;
mod state;

pub use manager::SetStore;
pub use snapshot::StoreSnapshot;
pub use state::{PendingWrite, TransactionState, WriteTransaction};

use crate::model::{Location, Practice, PracticeSet};
use crate::types::{LocationId, PracticeId, SetId};
use std::collections::BTreeMap;

/// Committed rows.
#[derive(Debug, Default, Clone)]
pub(crate) struct Tables {
    pub(crate) practices: BTreeMap<PracticeId, Practice>,
    pub(crate) locations: BTreeMap<LocationId, Location>,
    pub(crate) sets: BTreeMap<SetId, PracticeSet>,
}

impl Tables {
    pub(crate) fn sets_for_practice(&self, practice_id: PracticeId) -> Vec<PracticeSet> {
        let mut sets: Vec<PracticeSet> = self
            .sets
            .values()
            .filter(|s| s.practice_id == practice_id)
            .cloned()
            .collect();
        sets.sort_by_key(PracticeSet::sort_key);
        sets
    }
}
