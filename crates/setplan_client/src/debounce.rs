//! Cancellable debounced tasks.
//!
//! A [`Debouncer`] keeps at most one pending task per key. Scheduling a
//! key again cancels the pending task and restarts the delay, so only the
//! last task scheduled within the window runs. Once its quiet period is
//! over a task runs to completion; cancelling it then has no effect.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::trace;

struct Pending {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Cancels one scheduled task.
#[derive(Debug)]
pub struct DebounceHandle {
    abort: tokio::task::AbortHandle,
}

impl DebounceHandle {
    /// Cancels the task while it is still waiting out its quiet period.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// Returns true once the quiet period ended or the task was cancelled
    /// or superseded.
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Per-key debouncer.
pub struct Debouncer<K> {
    delay: Duration,
    pending: Arc<Mutex<HashMap<K, Pending>>>,
    generation: AtomicU64,
}

impl<K> Debouncer<K>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Creates a debouncer with the given quiet period.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the quiet period.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `task` to run after the delay, replacing any pending task
    /// for `key`.
    ///
    /// Must be called within a Tokio runtime.
    pub fn schedule<F>(&self, key: K, task: F) -> DebounceHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.delay;
        let pending = Arc::clone(&self.pending);
        let owned_key = key.clone();

        let mut map = self.pending.lock();
        if let Some(previous) = map.remove(&key) {
            previous.handle.abort();
            trace!(generation = previous.generation, "debounced task superseded");
        }

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut map = pending.lock();
                match map.get(&owned_key) {
                    Some(entry) if entry.generation == generation => {
                        map.remove(&owned_key);
                    }
                    _ => return,
                }
            }
            tokio::spawn(task);
        });
        let abort = handle.abort_handle();
        map.insert(key, Pending { generation, handle });

        DebounceHandle { abort }
    }

    /// Cancels the pending task for `key`. Returns false if none was
    /// pending.
    pub fn cancel(&self, key: &K) -> bool {
        match self.pending.lock().remove(key) {
            Some(entry) => {
                entry.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels every pending task.
    pub fn cancel_all(&self) {
        for (_, entry) in self.pending.lock().drain() {
            entry.handle.abort();
        }
    }

    /// Returns true if a task for `key` is still waiting.
    pub fn is_pending(&self, key: &K) -> bool {
        self.pending.lock().contains_key(key)
    }

    /// Returns the number of waiting tasks.
    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }
}

impl<K> Drop for Debouncer<K> {
    fn drop(&mut self) {
        for (_, entry) in self.pending.lock().drain() {
            entry.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    type Job = std::pin::Pin<Box<dyn Future<Output = ()> + Send>>;

    fn recorder() -> (Arc<Mutex<Vec<u32>>>, impl Fn(u32) -> Job) {
        let sent = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&sent);
        let make = move |value: u32| -> Job {
            let sink = Arc::clone(&sink);
            Box::pin(async move { sink.lock().push(value) })
        };
        (sent, make)
    }

    #[tokio::test(start_paused = true)]
    async fn only_last_value_in_window_runs() {
        let debouncer = Debouncer::new(Duration::from_secs(2));
        let (sent, make) = recorder();

        debouncer.schedule("notes", make(1));
        tokio::time::sleep(Duration::from_millis(500)).await;
        debouncer.schedule("notes", make(2));
        tokio::time::sleep(Duration::from_millis(1500)).await;
        debouncer.schedule("notes", make(3));
        assert!(sent.lock().is_empty());

        tokio::time::sleep(Duration::from_millis(2100)).await;
        assert_eq!(*sent.lock(), vec![3]);
        assert_eq!(debouncer.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn keys_are_independent() {
        let debouncer = Debouncer::new(Duration::from_secs(1));
        let (sent, make) = recorder();

        debouncer.schedule("a", make(1));
        debouncer.schedule("b", make(2));
        assert_eq!(debouncer.pending_count(), 2);

        tokio::time::sleep(Duration::from_millis(1100)).await;
        let mut values = sent.lock().clone();
        values.sort_unstable();
        assert_eq!(values, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_prevents_run() {
        let debouncer = Debouncer::new(Duration::from_secs(1));
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        let handle = debouncer.schedule(7u32, async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(debouncer.is_pending(&7));
        handle.cancel();
        assert!(debouncer.cancel(&7));
        assert!(!debouncer.cancel(&7));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_after_quiet_period_does_not_interrupt_task() {
        let debouncer = Debouncer::new(Duration::from_secs(1));
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&runs);
        let handle = debouncer.schedule("rating", async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!debouncer.is_pending(&"rating"));
        handle.cancel();
        assert!(!debouncer.cancel(&"rating"));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels_pending() {
        let runs = Arc::new(AtomicUsize::new(0));
        {
            let debouncer = Debouncer::new(Duration::from_secs(1));
            let counter = Arc::clone(&runs);
            debouncer.schedule((), async move {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
