//! Single-writer dispatch point for reducer actions.
//!
//! One task owns the [`SetListState`] and applies actions in arrival order.
//! Readers never touch the state directly: they get immutable snapshots
//! from a watch channel.

use crate::error::{ClientError, ClientResult};
use crate::reducer::{reduce, Action, SetListState};
use setplan_core::PracticeId;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, trace};

struct Command {
    action: Action,
    applied: Option<oneshot::Sender<u64>>,
}

/// Handle to the dispatcher task.
///
/// Cloning the handle shares the same task. The task stops once every
/// handle is dropped.
#[derive(Clone)]
pub struct Dispatcher {
    sender: mpsc::Sender<Command>,
    state: watch::Receiver<Arc<SetListState>>,
}

impl Dispatcher {
    /// Spawns the dispatcher task for a practice.
    ///
    /// Must be called within a Tokio runtime.
    pub fn spawn(practice_id: PracticeId, queue_capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<Command>(queue_capacity.max(1));
        let (publisher, state) = watch::channel(Arc::new(SetListState::new(practice_id)));

        tokio::spawn(async move {
            let mut current = SetListState::new(practice_id);
            while let Some(command) = receiver.recv().await {
                current = reduce(current, command.action);
                trace!(practice = %practice_id, version = current.version, "action applied");
                publisher.send_replace(Arc::new(current.clone()));
                if let Some(applied) = command.applied {
                    let _ = applied.send(current.version);
                }
            }
            debug!(practice = %practice_id, "dispatcher stopped");
        });

        Self { sender, state }
    }

    /// Queues an action and waits until it is applied.
    ///
    /// Returns the state version produced by the action.
    pub async fn dispatch(&self, action: Action) -> ClientResult<u64> {
        let (applied, done) = oneshot::channel();
        self.sender
            .send(Command {
                action,
                applied: Some(applied),
            })
            .await
            .map_err(|_| ClientError::DispatcherStopped)?;
        done.await.map_err(|_| ClientError::DispatcherStopped)
    }

    /// Queues an action without waiting.
    pub fn try_dispatch(&self, action: Action) -> ClientResult<()> {
        self.sender
            .try_send(Command {
                action,
                applied: None,
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => ClientError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => ClientError::DispatcherStopped,
            })
    }

    /// Returns the latest state.
    pub fn snapshot(&self) -> Arc<SetListState> {
        self.state.borrow().clone()
    }

    /// Returns a receiver notified on every applied action.
    pub fn watch(&self) -> watch::Receiver<Arc<SetListState>> {
        self.state.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use setplan_core::{LocationId, PracticeSet};

    #[tokio::test]
    async fn actions_apply_in_order() {
        let practice = PracticeId::new();
        let location = LocationId::new();
        let dispatcher = Dispatcher::spawn(practice, 8);
        let first = PracticeSet::new(practice, location, 2);
        let second = PracticeSet::new(practice, location, 1);

        dispatcher.dispatch(Action::Add(first.clone())).await.unwrap();
        let version = dispatcher
            .dispatch(Action::Add(second.clone()))
            .await
            .unwrap();
        assert_eq!(version, 2);

        let state = dispatcher.snapshot();
        assert_eq!(state.indices(), vec![1, 2]);

        dispatcher.dispatch(Action::Remove(first.id)).await.unwrap();
        assert_eq!(dispatcher.snapshot().sets, vec![second]);
    }

    #[tokio::test]
    async fn concurrent_dispatchers_are_serialized() {
        let practice = PracticeId::new();
        let location = LocationId::new();
        let dispatcher = Dispatcher::spawn(practice, 4);

        let tasks: Vec<_> = (1..=20)
            .map(|i| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move {
                    dispatcher
                        .dispatch(Action::Add(PracticeSet::new(practice, location, i)))
                        .await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let state = dispatcher.snapshot();
        assert_eq!(state.len(), 20);
        assert_eq!(state.version, 20);
        assert_eq!(state.indices(), (1..=20).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn watchers_see_updates() {
        let practice = PracticeId::new();
        let dispatcher = Dispatcher::spawn(practice, 8);
        let mut watcher = dispatcher.watch();

        dispatcher
            .try_dispatch(Action::Add(PracticeSet::new(
                practice,
                LocationId::new(),
                1,
            )))
            .unwrap();
        watcher.changed().await.unwrap();
        assert_eq!(watcher.borrow().len(), 1);
    }
}
