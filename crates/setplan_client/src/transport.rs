//! Service abstraction for sending batches.

use crate::error::{ClientError, ClientResult};
use parking_lot::Mutex;
use setplan_core::{BatchApplier, Caller, PracticeId, PracticeSet, SetDelta, SetId};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Sends batches to the set service and fetches practice state.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-process loopback, mock for testing).
pub trait SetService: Send + Sync {
    /// Applies a batch; returns the committed rows.
    fn apply(&self, deltas: Vec<SetDelta>) -> ClientResult<Vec<PracticeSet>>;

    /// Deletes sets.
    fn delete(&self, ids: &[SetId]) -> ClientResult<bool>;

    /// Fetches every set of a practice.
    fn fetch(&self, practice_id: PracticeId) -> ClientResult<Vec<PracticeSet>>;
}

/// In-process service calling a [`BatchApplier`] directly as one caller.
pub struct LocalService {
    applier: Arc<BatchApplier>,
    caller: Caller,
}

impl LocalService {
    /// Creates a loopback service acting as `caller`.
    pub fn new(applier: Arc<BatchApplier>, caller: Caller) -> Self {
        Self { applier, caller }
    }
}

impl SetService for LocalService {
    fn apply(&self, deltas: Vec<SetDelta>) -> ClientResult<Vec<PracticeSet>> {
        Ok(self.applier.apply_batch(&self.caller, deltas)?)
    }

    fn delete(&self, ids: &[SetId]) -> ClientResult<bool> {
        Ok(self.applier.delete_batch(&self.caller, ids)?)
    }

    fn fetch(&self, practice_id: PracticeId) -> ClientResult<Vec<PracticeSet>> {
        let practice = self
            .applier
            .store()
            .practice(practice_id)
            .ok_or(setplan_core::CoreError::PracticeNotFound { practice_id })?;
        self.caller.authorize(&practice)?;
        Ok(self.applier.store().sets_for_practice(practice_id))
    }
}

/// A mock service for testing.
///
/// Applied deltas are recorded. Updates echo back the mock's rows with the
/// delta merged; creates get fresh rows.
#[derive(Default)]
pub struct MockService {
    connected: AtomicBool,
    rows: Mutex<Vec<PracticeSet>>,
    applied: Mutex<Vec<Vec<SetDelta>>>,
    deleted: Mutex<Vec<SetId>>,
}

impl MockService {
    /// Creates a connected mock with no rows.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            ..Self::default()
        }
    }

    /// Creates a connected mock serving `rows`.
    pub fn with_rows(rows: Vec<PracticeSet>) -> Self {
        let mock = Self::new();
        *mock.rows.lock() = rows;
        mock
    }

    /// Sets the connected state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Returns every applied batch, in order.
    pub fn applied(&self) -> Vec<Vec<SetDelta>> {
        self.applied.lock().clone()
    }

    /// Returns every deleted id, in order.
    pub fn deleted(&self) -> Vec<SetId> {
        self.deleted.lock().clone()
    }

    /// Returns the mock's current rows.
    pub fn rows(&self) -> Vec<PracticeSet> {
        self.rows.lock().clone()
    }

    fn check_connected(&self) -> ClientResult<()> {
        if self.connected.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ClientError::transport_retryable("not connected"))
        }
    }
}

impl SetService for MockService {
    fn apply(&self, deltas: Vec<SetDelta>) -> ClientResult<Vec<PracticeSet>> {
        self.check_connected()?;
        self.applied.lock().push(deltas.clone());

        let mut rows = self.rows.lock();
        let mut committed = Vec::with_capacity(deltas.len());
        for delta in deltas {
            let row = match delta.id {
                Some(id) => {
                    let row = rows
                        .iter_mut()
                        .find(|r| r.id == id)
                        .ok_or(setplan_core::CoreError::SetNotFound { set_id: id })?;
                    delta.merge_fields(row);
                    row.clone()
                }
                None => {
                    let (Some(practice_id), Some(location_id), Some(index)) =
                        (delta.practice_id, delta.location_id, delta.index)
                    else {
                        return Err(ClientError::InvalidEdit(
                            "create needs practice, location and index".into(),
                        ));
                    };
                    let mut row = PracticeSet::new(practice_id, location_id, index);
                    delta.merge_fields(&mut row);
                    rows.push(row.clone());
                    row
                }
            };
            committed.push(row);
        }
        Ok(committed)
    }

    fn delete(&self, ids: &[SetId]) -> ClientResult<bool> {
        self.check_connected()?;
        self.deleted.lock().extend_from_slice(ids);
        self.rows.lock().retain(|r| !ids.contains(&r.id));
        Ok(true)
    }

    fn fetch(&self, practice_id: PracticeId) -> ClientResult<Vec<PracticeSet>> {
        self.check_connected()?;
        Ok(self
            .rows
            .lock()
            .iter()
            .filter(|r| r.practice_id == practice_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use setplan_core::{ClubId, ErrorClass, Location, Practice, SetStore, UserId};

    #[test]
    fn mock_records_and_merges() {
        let practice = PracticeId::new();
        let row = PracticeSet::new(practice, setplan_core::LocationId::new(), 1);
        let mock = MockService::with_rows(vec![row.clone()]);

        let out = mock
            .apply(vec![SetDelta::update(row.id).with_notes(Some("n".into()))])
            .unwrap();
        assert_eq!(out[0].notes.as_deref(), Some("n"));
        assert_eq!(mock.applied().len(), 1);
        assert_eq!(mock.fetch(practice).unwrap()[0].notes.as_deref(), Some("n"));
    }

    #[test]
    fn mock_not_connected_error() {
        let mock = MockService::new();
        mock.set_connected(false);
        let err = mock.fetch(PracticeId::new()).unwrap_err();
        assert!(err.is_retryable());
    }

    #[test]
    fn local_service_round_trip() {
        let store = Arc::new(SetStore::new());
        let club = ClubId::new();
        let caller = Caller::new(UserId::new(), [club]);
        let practice = Practice::new(club, caller.user_id, Utc::now());
        let ring = Location::new(club, "Ring").default_location();
        store.insert_practice(practice.clone());
        store.insert_location(ring.clone());
        let applier = Arc::new(BatchApplier::new(
            store,
            Arc::new(setplan_core::ChangeFeed::new()),
        ));

        let service = LocalService::new(applier.clone(), caller);
        let created = service
            .apply(vec![SetDelta::create(practice.id, ring.id, 1)])
            .unwrap();
        assert_eq!(service.fetch(practice.id).unwrap(), created);
        assert!(service.delete(&[created[0].id]).unwrap());

        let outsider = LocalService::new(applier, Caller::new(UserId::new(), [ClubId::new()]));
        match outsider.fetch(practice.id) {
            Err(ClientError::Rejected(e)) => assert_eq!(e.class(), ErrorClass::Authorization),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
