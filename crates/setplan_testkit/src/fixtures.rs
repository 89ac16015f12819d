//! Test fixtures and store helpers.
//!
//! Provides a seeded club and a store harness for common test
//! scenarios.

use chrono::{DateTime, Duration, TimeZone, Utc};
use setplan_bus::{BusConfig, EventBus};
use setplan_core::{
    Attendance, AttendanceStatus, BatchApplier, Caller, ChangeFeed, ClubId, ClubSettings, Dog,
    EventSink, Handler, Lane, Location, LocationId, Practice, PracticeSet, RosterEntry, SetDelta,
    SetStore, UserId,
};
use setplan_rules::PracticeSnapshot;
use std::sync::Arc;

/// Fixed instant used as "now" by fixtures. Fixture practices are a week
/// later.
pub fn fixture_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0)
        .single()
        .expect("valid fixture instant")
}

/// A club with two locations, three handlers, five dogs and one practice.
///
/// | Handler | Dogs |
/// |---------|------|
/// | Hana Berg | Ace, Bee |
/// | Ivo Lund | Cid |
/// | Jo Mak | Dot, Eli |
#[derive(Debug, Clone)]
pub struct SeededClub {
    /// The club.
    pub club_id: ClubId,
    /// Member planning the practice.
    pub planner: Caller,
    /// Another member.
    pub member: Caller,
    /// A member of a different club.
    pub outsider: Caller,
    /// Default single-lane location.
    pub ring: Location,
    /// Double-lane location.
    pub field: Location,
    /// The practice.
    pub practice: Practice,
    /// Handlers.
    pub handlers: Vec<Handler>,
    /// Dogs.
    pub dogs: Vec<Dog>,
}

impl SeededClub {
    /// Creates the club.
    pub fn new() -> Self {
        let club_id = ClubId::new();
        let planner = Caller::new(UserId::new(), [club_id]);
        let member = Caller::new(UserId::new(), [club_id]);
        let outsider = Caller::new(UserId::new(), [ClubId::new()]);

        let hana = Handler::new("Hana", "Berg");
        let ivo = Handler::new("Ivo", "Lund");
        let jo = Handler::new("Jo", "Mak");
        let dogs = vec![
            Dog::new("Ace", hana.id),
            Dog::new("Bee", hana.id),
            Dog::new("Cid", ivo.id),
            Dog::new("Dot", jo.id),
            Dog::new("Eli", jo.id),
        ];

        Self {
            club_id,
            practice: Practice::new(club_id, planner.user_id, fixture_now() + Duration::days(7)),
            planner,
            member,
            outsider,
            ring: Location::new(club_id, "Ring").default_location(),
            field: Location::new(club_id, "Field").double_lane(),
            handlers: vec![hana, ivo, jo],
            dogs,
        }
    }

    /// Returns a dog by name.
    pub fn dog(&self, name: &str) -> &Dog {
        self.dogs
            .iter()
            .find(|d| d.name == name)
            .unwrap_or_else(|| panic!("no fixture dog named {name}"))
    }

    /// Returns a handler by given name.
    pub fn handler(&self, given_name: &str) -> &Handler {
        self.handlers
            .iter()
            .find(|h| h.given_name == given_name)
            .unwrap_or_else(|| panic!("no fixture handler named {given_name}"))
    }

    /// Attendance records marking the named dogs as attending. Other dogs
    /// get no record.
    pub fn attending(&self, names: &[&str]) -> Vec<Attendance> {
        names
            .iter()
            .map(|name| {
                Attendance::new(
                    self.practice.id,
                    self.dog(name).id,
                    AttendanceStatus::Attending,
                )
            })
            .collect()
    }

    /// Club settings with the given ideal sets per dog.
    pub fn settings(&self, ideal_sets_per_dog: u32) -> ClubSettings {
        ClubSettings {
            club_id: self.club_id,
            ideal_sets_per_dog,
        }
    }

    /// Roster of the named dogs in positions 1, 2, ... without lanes.
    pub fn roster(&self, names: &[&str]) -> Vec<RosterEntry> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| RosterEntry::new(self.dog(name).id, i as u32 + 1))
            .collect()
    }

    /// Roster of the named dogs, all in one lane.
    pub fn lane_roster(&self, lane: Lane, names: &[&str]) -> Vec<RosterEntry> {
        self.roster(names)
            .into_iter()
            .map(|entry| entry.in_lane(lane))
            .collect()
    }
}

impl Default for SeededClub {
    fn default() -> Self {
        Self::new()
    }
}

/// A store holding a [`SeededClub`], with an applier acting on it.
pub struct TestStore {
    /// The seeded club.
    pub club: SeededClub,
    /// The store.
    pub store: Arc<SetStore>,
    /// Records published events when built with [`TestStore::new`].
    pub feed: Arc<ChangeFeed>,
    /// The applier.
    pub applier: Arc<BatchApplier>,
}

impl TestStore {
    /// Creates a store publishing to an in-memory change feed.
    pub fn new() -> Self {
        let feed = Arc::new(ChangeFeed::new());
        Self::build(feed.clone(), |_| feed)
    }

    /// Creates a store publishing to an event bus.
    pub fn with_bus(config: BusConfig) -> (Self, Arc<EventBus>) {
        let mut bus = None;
        let harness = Self::build(Arc::new(ChangeFeed::new()), |store| {
            let created = Arc::new(EventBus::new(config, store));
            bus = Some(created.clone());
            created
        });
        (harness, bus.expect("bus built with the store"))
    }

    fn build<S, F>(feed: Arc<ChangeFeed>, sink: F) -> Self
    where
        S: EventSink + 'static,
        F: FnOnce(Arc<SetStore>) -> Arc<S>,
    {
        let club = SeededClub::new();
        let store = Arc::new(SetStore::new());
        store.insert_practice(club.practice.clone());
        store.insert_location(club.ring.clone());
        store.insert_location(club.field.clone());
        let applier = Arc::new(BatchApplier::new(store.clone(), sink(store.clone())));
        Self {
            club,
            store,
            feed,
            applier,
        }
    }

    /// Creates an empty set as the planner.
    pub fn create(&self, location: &Location, round: u32) -> PracticeSet {
        self.create_with(SetDelta::create(self.club.practice.id, location.id, round))
    }

    /// Applies a single creating or updating delta as the planner.
    pub fn create_with(&self, delta: SetDelta) -> PracticeSet {
        self.applier
            .apply_batch(&self.club.planner, vec![delta])
            .expect("fixture batch applies")
            .remove(0)
    }

    /// The practice's sets in display order.
    pub fn sets(&self) -> Vec<PracticeSet> {
        self.store.sets_for_practice(self.club.practice.id)
    }

    /// Rounds used at a location, ascending.
    pub fn rounds(&self, location_id: LocationId) -> Vec<u32> {
        self.sets()
            .iter()
            .filter(|s| s.location_id == location_id)
            .map(|s| s.index)
            .collect()
    }

    /// Snapshot of the practice for validation.
    pub fn snapshot(&self, attendance: Vec<Attendance>) -> PracticeSnapshot {
        PracticeSnapshot {
            practice: self.club.practice.clone(),
            sets: self.sets(),
            attendance,
            dogs: self.club.dogs.clone(),
            handlers: self.club.handlers.clone(),
        }
    }
}

impl Default for TestStore {
    fn default() -> Self {
        Self::new()
    }
}
