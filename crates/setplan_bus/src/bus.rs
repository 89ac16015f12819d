//! The event bus.

use crate::config::BusConfig;
use crate::error::{BusError, BusResult};
use crate::topic::{Scope, Topic};
use parking_lot::Mutex;
use setplan_core::{
    Audience, Caller, ChangeEvent, EventSink, Practice, PracticeId, PublishError, SetStore,
};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError, error::TrySendError};
use tracing::{debug, warn};

/// Extra filter applied to events on a subscription's topics.
pub type EventPredicate = Arc<dyn Fn(&ChangeEvent) -> bool + Send + Sync>;

/// Resolves practices for subscription scope checks.
pub trait PracticeDirectory: Send + Sync {
    /// Looks up a practice.
    fn practice(&self, id: PracticeId) -> Option<Practice>;
}

impl PracticeDirectory for SetStore {
    fn practice(&self, id: PracticeId) -> Option<Practice> {
        SetStore::practice(self, id)
    }
}

/// Identifies a live subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Returns the raw value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub:{}", self.0)
    }
}

/// The receiving end of a subscription.
///
/// Dropping it ends the subscription; the bus prunes it on the next
/// publish.
#[derive(Debug)]
pub struct Subscription {
    id: SubscriptionId,
    receiver: mpsc::Receiver<ChangeEvent>,
}

impl Subscription {
    /// Returns the subscription ID.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Waits for the next event. Returns `None` once the bus is closed and
    /// the stream is drained.
    pub async fn recv(&mut self) -> Option<ChangeEvent> {
        self.receiver.recv().await
    }

    /// Takes the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<ChangeEvent> {
        match self.receiver.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Takes every buffered event.
    pub fn drain(&mut self) -> Vec<ChangeEvent> {
        std::iter::from_fn(|| self.try_recv()).collect()
    }
}

struct Entry {
    id: SubscriptionId,
    caller: Caller,
    topics: BTreeSet<Topic>,
    predicate: EventPredicate,
    sender: mpsc::Sender<ChangeEvent>,
}

#[derive(Default)]
struct Counters {
    published: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
    filtered: AtomicU64,
}

/// Bus statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Events published.
    pub published: u64,
    /// Event deliveries into subscriber streams.
    pub delivered: u64,
    /// Deliveries dropped because a stream was full.
    pub dropped: u64,
    /// Deliveries withheld from subscribers not allowed to see them.
    pub filtered: u64,
    /// Live subscriptions.
    pub live: usize,
}

/// Fans committed change events out to live subscribers.
///
/// Publishing is synchronous and never blocks: each matching subscriber
/// gets the event through a bounded channel or loses it.
pub struct EventBus {
    config: BusConfig,
    directory: Arc<dyn PracticeDirectory>,
    subscriptions: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
    counters: Counters,
    closed: AtomicBool,
}

impl EventBus {
    /// Creates a bus resolving practices through `directory`.
    pub fn new(config: BusConfig, directory: Arc<dyn PracticeDirectory>) -> Self {
        Self {
            config,
            directory,
            subscriptions: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            counters: Counters::default(),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &BusConfig {
        &self.config
    }

    /// Subscribes to every topic within a practice or club.
    ///
    /// Scopes the subscriber may not see are rejected here rather than
    /// silently filtered later.
    pub fn subscribe(&self, subscriber: &Caller, scope: Scope) -> BusResult<Subscription> {
        match scope {
            Scope::Practice(practice_id) => {
                let practice = self
                    .directory
                    .practice(practice_id)
                    .ok_or(BusError::UnknownPractice(practice_id))?;
                if !subscriber.can_view(&Audience::for_practice(&practice)) {
                    return Err(BusError::NotAuthorized(format!(
                        "practice {} is not visible to user {}",
                        practice_id, subscriber.user_id
                    )));
                }
            }
            Scope::Club(club_id) => {
                if !subscriber.is_member(club_id) {
                    return Err(BusError::NotAuthorized(format!(
                        "user {} is not a member of club {}",
                        subscriber.user_id, club_id
                    )));
                }
            }
        }
        self.subscribe_with(
            subscriber,
            Topic::all(),
            Arc::new(move |event: &ChangeEvent| scope.contains(event)),
        )
    }

    /// Subscribes to a set of topics with an arbitrary predicate.
    ///
    /// The membership and private-practice filter still applies to every
    /// event on top of the predicate.
    pub fn subscribe_with(
        &self,
        subscriber: &Caller,
        topics: impl IntoIterator<Item = Topic>,
        predicate: EventPredicate,
    ) -> BusResult<Subscription> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(BusError::Closed);
        }

        let mut subscriptions = self.subscriptions.lock();
        subscriptions.retain(|entry| !entry.sender.is_closed());
        if subscriptions.len() >= self.config.max_subscriptions {
            return Err(BusError::TooManySubscriptions {
                limit: self.config.max_subscriptions,
            });
        }

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = mpsc::channel(self.config.capacity);
        subscriptions.push(Entry {
            id,
            caller: subscriber.clone(),
            topics: topics.into_iter().collect(),
            predicate,
            sender,
        });
        debug!(subscription = %id, user = %subscriber.user_id, live = subscriptions.len(), "subscribed");

        Ok(Subscription { id, receiver })
    }

    /// Ends a subscription. Returns false if it was not live.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.lock();
        let before = subscriptions.len();
        subscriptions.retain(|entry| entry.id != id);
        before != subscriptions.len()
    }

    /// Delivers an event to every matching subscriber and returns how many
    /// received it.
    pub fn deliver(&self, event: &ChangeEvent) -> usize {
        self.counters.published.fetch_add(1, Ordering::Relaxed);
        let topic = Topic::of(event);
        let mut delivered = 0;

        let mut subscriptions = self.subscriptions.lock();
        subscriptions.retain(|entry| {
            if entry.sender.is_closed() {
                debug!(subscription = %entry.id, "pruned closed subscription");
                return false;
            }
            if !entry.topics.contains(&topic) || !(entry.predicate)(event) {
                return true;
            }
            if !entry.caller.can_view(&event.audience) {
                self.counters.filtered.fetch_add(1, Ordering::Relaxed);
                return true;
            }
            match entry.sender.try_send(event.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(TrySendError::Full(_)) => {
                    self.counters.dropped.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        subscription = %entry.id,
                        %topic,
                        sequence = %event.sequence,
                        "subscriber stream full, event dropped"
                    );
                    true
                }
                Err(TrySendError::Closed(_)) => false,
            }
        });
        drop(subscriptions);

        self.counters
            .delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        delivered
    }

    /// Shuts the bus down and ends every subscription.
    ///
    /// Subscribers still receive what is already buffered.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        let ended = std::mem::take(&mut *self.subscriptions.lock());
        debug!(ended = ended.len(), "bus closed");
    }

    /// Returns true once [`close`](Self::close) was called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Returns the number of live subscriptions.
    pub fn live_subscriptions(&self) -> usize {
        self.subscriptions
            .lock()
            .iter()
            .filter(|entry| !entry.sender.is_closed())
            .count()
    }

    /// Returns the current statistics.
    pub fn stats(&self) -> BusStats {
        BusStats {
            published: self.counters.published.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
            filtered: self.counters.filtered.load(Ordering::Relaxed),
            live: self.live_subscriptions(),
        }
    }
}

impl EventSink for EventBus {
    fn publish(&self, event: ChangeEvent) -> Result<(), PublishError> {
        if self.is_closed() {
            return Err(PublishError::Closed);
        }
        self.deliver(&event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use setplan_core::{
        BatchApplier, ChangePayload, ClubId, EntityKind, Location, SequenceNumber, SetDelta,
        SetId, UserId,
    };

    struct Club {
        store: Arc<SetStore>,
        club: ClubId,
        planner: Caller,
        member: Caller,
        open: Practice,
        private: Practice,
    }

    fn club() -> Club {
        let store = Arc::new(SetStore::new());
        let club = ClubId::new();
        let planner = Caller::new(UserId::new(), [club]);
        let member = Caller::new(UserId::new(), [club]);
        let open = Practice::new(club, planner.user_id, Utc::now());
        let private = Practice::new(club, planner.user_id, Utc::now()).private();
        store.insert_practice(open.clone());
        store.insert_practice(private.clone());
        store.insert_location(Location::new(club, "Ring").default_location());
        Club {
            store,
            club,
            planner,
            member,
            open,
            private,
        }
    }

    fn bus(club: &Club, config: BusConfig) -> EventBus {
        EventBus::new(config, club.store.clone())
    }

    fn deleted(practice: &Practice, seq: u64) -> ChangeEvent {
        ChangeEvent::set_deleted(
            SequenceNumber::new(seq),
            Audience::for_practice(practice),
            SetId::new(),
        )
    }

    #[test]
    fn practice_subscription_sees_only_its_practice() {
        let c = club();
        let bus = bus(&c, BusConfig::default());
        let other = Practice::new(c.club, c.planner.user_id, Utc::now());
        let mut sub = bus.subscribe(&c.member, Scope::Practice(c.open.id)).unwrap();

        bus.publish(deleted(&c.open, 1)).unwrap();
        bus.publish(deleted(&other, 2)).unwrap();

        let events = sub.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sequence, SequenceNumber::new(1));
    }

    #[test]
    fn private_practice_subscription_is_rejected() {
        let c = club();
        let bus = bus(&c, BusConfig::default());

        let err = bus
            .subscribe(&c.member, Scope::Practice(c.private.id))
            .unwrap_err();
        assert!(matches!(err, BusError::NotAuthorized(_)));
        assert!(bus.subscribe(&c.planner, Scope::Practice(c.private.id)).is_ok());
    }

    #[test]
    fn unknown_practice_is_rejected() {
        let c = club();
        let bus = bus(&c, BusConfig::default());
        let err = bus
            .subscribe(&c.member, Scope::Practice(PracticeId::new()))
            .unwrap_err();
        assert!(matches!(err, BusError::UnknownPractice(_)));
    }

    #[test]
    fn non_member_cannot_subscribe_to_club() {
        let c = club();
        let bus = bus(&c, BusConfig::default());
        let outsider = Caller::new(UserId::new(), [ClubId::new()]);
        assert!(bus.subscribe(&outsider, Scope::Club(c.club)).is_err());
    }

    #[test]
    fn club_subscription_filters_private_practices() {
        let c = club();
        let bus = bus(&c, BusConfig::default());
        let mut member = bus.subscribe(&c.member, Scope::Club(c.club)).unwrap();
        let mut planner = bus.subscribe(&c.planner, Scope::Club(c.club)).unwrap();

        bus.publish(deleted(&c.open, 1)).unwrap();
        bus.publish(deleted(&c.private, 2)).unwrap();

        assert_eq!(member.drain().len(), 1);
        assert_eq!(planner.drain().len(), 2);

        let stats = bus.stats();
        assert_eq!(stats.published, 2);
        assert_eq!(stats.delivered, 3);
        assert_eq!(stats.filtered, 1);
    }

    #[test]
    fn full_stream_drops_events() {
        let c = club();
        let bus = bus(&c, BusConfig::default().with_capacity(1));
        let mut sub = bus.subscribe(&c.member, Scope::Practice(c.open.id)).unwrap();

        bus.publish(deleted(&c.open, 1)).unwrap();
        bus.publish(deleted(&c.open, 2)).unwrap();

        let events = sub.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].sequence, SequenceNumber::new(1));
        assert_eq!(bus.stats().dropped, 1);

        // Room again after draining.
        bus.publish(deleted(&c.open, 3)).unwrap();
        assert_eq!(sub.drain().len(), 1);
    }

    #[test]
    fn dropped_subscription_is_pruned() {
        let c = club();
        let bus = bus(&c, BusConfig::default());
        let sub = bus.subscribe(&c.member, Scope::Club(c.club)).unwrap();
        assert_eq!(bus.live_subscriptions(), 1);

        drop(sub);
        assert_eq!(bus.deliver(&deleted(&c.open, 1)), 0);
        assert_eq!(bus.stats().live, 0);
    }

    #[test]
    fn unsubscribe_ends_delivery() {
        let c = club();
        let bus = bus(&c, BusConfig::default());
        let mut sub = bus.subscribe(&c.member, Scope::Club(c.club)).unwrap();

        assert!(bus.unsubscribe(sub.id()));
        assert!(!bus.unsubscribe(sub.id()));
        bus.publish(deleted(&c.open, 1)).unwrap();
        assert!(sub.try_recv().is_none());
    }

    #[test]
    fn subscription_limit() {
        let c = club();
        let bus = bus(&c, BusConfig::default().with_max_subscriptions(1));
        let _first = bus.subscribe(&c.member, Scope::Club(c.club)).unwrap();
        let err = bus.subscribe(&c.member, Scope::Club(c.club)).unwrap_err();
        assert!(matches!(err, BusError::TooManySubscriptions { limit: 1 }));
    }

    #[test]
    fn topic_and_predicate_filtering() {
        let c = club();
        let bus = bus(&c, BusConfig::default());
        let open_id = c.open.id;
        let mut sub = bus
            .subscribe_with(
                &c.member,
                [Topic::SET_DELETED],
                Arc::new(move |e: &ChangeEvent| e.audience.practice_id == open_id),
            )
            .unwrap();

        let audience = Audience::for_practice(&c.open);
        let summary = setplan_core::PracticeSummary::from_sets(c.open.id, &[]);
        bus.publish(ChangeEvent::summary(SequenceNumber::new(1), audience, summary))
            .unwrap();
        bus.publish(deleted(&c.open, 2)).unwrap();

        let events = sub.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind(), EntityKind::Set);
    }

    #[test]
    fn closed_bus_rejects_publish_and_subscribe() {
        let c = club();
        let bus = bus(&c, BusConfig::default());
        let mut sub = bus.subscribe(&c.member, Scope::Club(c.club)).unwrap();
        bus.publish(deleted(&c.open, 1)).unwrap();

        bus.close();
        assert!(matches!(
            bus.publish(deleted(&c.open, 2)),
            Err(PublishError::Closed)
        ));
        assert!(matches!(
            bus.subscribe(&c.member, Scope::Club(c.club)),
            Err(BusError::Closed)
        ));
        // Buffered events survive the close.
        assert_eq!(sub.drain().len(), 1);
    }

    #[tokio::test]
    async fn committed_batch_reaches_subscriber_in_order() {
        let c = club();
        let bus = Arc::new(bus(&c, BusConfig::default()));
        let applier = BatchApplier::new(c.store.clone(), bus.clone());
        let mut sub = bus.subscribe(&c.member, Scope::Practice(c.open.id)).unwrap();
        let ring = c
            .store
            .to_snapshot()
            .locations
            .into_iter()
            .next()
            .unwrap();

        let created = applier
            .apply_batch(&c.planner, vec![SetDelta::create(c.open.id, ring.id, 1)])
            .unwrap();

        let first = sub.recv().await.unwrap();
        assert!(matches!(first.payload, ChangePayload::SetUpdated(ref s) if s.id == created[0].id));
        let second = sub.recv().await.unwrap();
        assert_eq!(second.kind(), EntityKind::PracticeSummary);
        assert_eq!(first.sequence, second.sequence);
    }
}
