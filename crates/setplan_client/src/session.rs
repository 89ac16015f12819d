//! Practice editing session.

use crate::config::ClientConfig;
use crate::debounce::Debouncer;
use crate::dispatcher::Dispatcher;
use crate::error::{ClientError, ClientResult};
use crate::reducer::{Action, SetListState};
use crate::transport::SetService;
use parking_lot::Mutex;
use setplan_bus::Subscription;
use setplan_core::{ChangeEvent, PracticeId, PracticeSet, SetDelta, SetId};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Outcome of a debounced edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// The edit was confirmed and applied to the state.
    Sent {
        /// The edited set.
        set_id: SetId,
    },
    /// The edit failed. It is not retried.
    SendFailed {
        /// The edited set.
        set_id: SetId,
        /// Error message.
        message: String,
        /// Whether sending again could succeed.
        retryable: bool,
    },
}

/// Client-side view of one practice.
///
/// Edits are sent to the [`SetService`] and only the confirmed rows reach
/// the state. Pushed events and confirmed rows share one dispatch point.
pub struct PracticeSession {
    practice_id: PracticeId,
    dispatcher: Dispatcher,
    service: Arc<dyn SetService>,
    debouncer: Debouncer<SetId>,
    /// Edits waiting for their quiet period, merged per set.
    queued: Arc<Mutex<HashMap<SetId, SetDelta>>>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl PracticeSession {
    /// Starts a session. Returns the session and its event stream.
    ///
    /// Must be called within a Tokio runtime.
    pub fn start(
        practice_id: PracticeId,
        service: Arc<dyn SetService>,
        config: ClientConfig,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let session = Self {
            practice_id,
            dispatcher: Dispatcher::spawn(practice_id, config.queue_capacity),
            service,
            debouncer: Debouncer::new(config.debounce),
            queued: Arc::new(Mutex::new(HashMap::new())),
            events,
        };
        debug!(practice = %practice_id, "session started");
        (session, receiver)
    }

    /// Returns the practice.
    pub fn practice_id(&self) -> PracticeId {
        self.practice_id
    }

    /// Returns the latest state.
    pub fn snapshot(&self) -> Arc<SetListState> {
        self.dispatcher.snapshot()
    }

    /// Returns a receiver notified on every state change.
    pub fn watch(&self) -> watch::Receiver<Arc<SetListState>> {
        self.dispatcher.watch()
    }

    /// Returns the number of edits waiting for their quiet period.
    pub fn pending_edits(&self) -> usize {
        self.debouncer.pending_count()
    }

    /// Queues an edit of an existing set.
    ///
    /// Edits of the same set within the debounce window are merged into one
    /// delta and the window restarts. For each field only the last value is
    /// sent. The outcome is reported on the session event stream.
    pub fn edit(&self, delta: SetDelta) -> ClientResult<()> {
        let set_id = delta
            .id
            .ok_or_else(|| ClientError::InvalidEdit("edits need a set id".into()))?;
        if delta.practice_id.is_some_and(|p| p != self.practice_id) {
            return Err(ClientError::InvalidEdit(format!(
                "set {} edited outside practice {}",
                set_id, self.practice_id
            )));
        }

        {
            let mut queued = self.queued.lock();
            let merged = match queued.remove(&set_id) {
                Some(earlier) => earlier.overlay(delta),
                None => delta,
            };
            queued.insert(set_id, merged);
        }

        let queued = Arc::clone(&self.queued);
        let service = Arc::clone(&self.service);
        let dispatcher = self.dispatcher.clone();
        let events = self.events.clone();
        self.debouncer.schedule(set_id, async move {
            // Taken by an earlier task that started after this edit merged.
            let taken = queued.lock().remove(&set_id);
            let Some(delta) = taken else {
                return;
            };
            let event = match send(&*service, &dispatcher, vec![delta]).await {
                Ok(_) => SessionEvent::Sent { set_id },
                Err(e) => {
                    warn!(set = %set_id, error = %e, "debounced edit failed");
                    SessionEvent::SendFailed {
                        set_id,
                        message: e.to_string(),
                        retryable: e.is_retryable(),
                    }
                }
            };
            let _ = events.send(event);
        });
        Ok(())
    }

    /// Drops the queued edit of a set. Returns false if none was waiting.
    pub fn cancel_edit(&self, set_id: SetId) -> bool {
        self.queued.lock().remove(&set_id);
        self.debouncer.cancel(&set_id)
    }

    /// Sends a batch right away and applies the confirmed rows.
    pub async fn apply_now(&self, deltas: Vec<SetDelta>) -> ClientResult<Vec<PracticeSet>> {
        send(&*self.service, &self.dispatcher, deltas).await
    }

    /// Deletes sets, then reloads the practice.
    ///
    /// Deletes can shift the rounds of other sets, so the list is refetched
    /// instead of patched. Pending edits of the deleted sets are dropped.
    pub async fn delete(&self, ids: &[SetId]) -> ClientResult<()> {
        for id in ids {
            self.cancel_edit(*id);
        }
        self.service.delete(ids)?;
        for id in ids {
            self.dispatcher.dispatch(Action::Remove(*id)).await?;
        }
        self.reload().await?;
        Ok(())
    }

    /// Refetches every set of the practice and replaces the list.
    pub async fn reload(&self) -> ClientResult<usize> {
        let sets = self.service.fetch(self.practice_id)?;
        let count = sets.len();
        self.dispatcher.dispatch(Action::ReplaceAll(sets)).await?;
        info!(practice = %self.practice_id, sets = count, "reloaded");
        Ok(count)
    }

    /// Applies a pushed change event.
    pub async fn ingest(&self, event: ChangeEvent) -> ClientResult<u64> {
        self.dispatcher.dispatch(Action::Remote(event)).await
    }

    /// Feeds a bus subscription into the session until it ends.
    pub fn follow(&self, mut subscription: Subscription) -> JoinHandle<()> {
        let dispatcher = self.dispatcher.clone();
        let practice_id = self.practice_id;
        tokio::spawn(async move {
            while let Some(event) = subscription.recv().await {
                if dispatcher.dispatch(Action::Remote(event)).await.is_err() {
                    break;
                }
            }
            debug!(practice = %practice_id, subscription = %subscription.id(), "stopped following");
        })
    }
}

async fn send(
    service: &dyn SetService,
    dispatcher: &Dispatcher,
    deltas: Vec<SetDelta>,
) -> ClientResult<Vec<PracticeSet>> {
    let rows = service.apply(deltas)?;
    for row in &rows {
        dispatcher.dispatch(Action::Add(row.clone())).await?;
    }
    Ok(rows)
}
