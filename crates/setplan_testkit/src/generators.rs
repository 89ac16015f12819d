//! Property-based test generators using proptest.
//!
//! Edits are generated against slots rather than ids, so any sequence can
//! be replayed on a live [`TestStore`] whatever sets it holds.

use crate::fixtures::{fixture_now, TestStore};
use proptest::prelude::*;
use setplan_client::Action;
use setplan_core::{
    Audience, ChangeEvent, CoreResult, Lane, LocationId, Practice, PracticeSet, RosterEntry,
    SequenceNumber, SetDelta, SetId,
};

/// A structural edit of the seeded practice.
#[derive(Debug, Clone)]
pub enum PlanOp {
    /// Creates a set.
    Create {
        /// Use the double-lane field instead of the ring.
        at_field: bool,
        /// Round of the new set.
        round: u32,
        /// Dog slots for the roster.
        dogs: Vec<usize>,
        /// Whether roster entries get lanes.
        with_lanes: bool,
    },
    /// Moves an existing set to another round.
    Move {
        /// Set slot.
        slot: usize,
        /// Target round.
        round: u32,
    },
    /// Replaces an existing set's roster.
    Roster {
        /// Set slot.
        slot: usize,
        /// Dog slots for the roster.
        dogs: Vec<usize>,
        /// Whether roster entries get lanes.
        with_lanes: bool,
    },
    /// Deletes existing sets.
    Delete {
        /// Set slots.
        slots: Vec<usize>,
    },
}

impl PlanOp {
    /// Runs the edit as the planner. Slots wrap around the current sets;
    /// edits of an empty practice other than creates do nothing.
    pub fn run(&self, h: &TestStore) -> CoreResult<()> {
        let sets = h.sets();
        let pick = |slot: usize| sets.get(slot % sets.len().max(1));
        match self {
            PlanOp::Create {
                at_field,
                round,
                dogs,
                with_lanes,
            } => {
                let location = if *at_field { &h.club.field } else { &h.club.ring };
                let delta = SetDelta::create(h.club.practice.id, location.id, *round)
                    .with_dogs(roster(h, dogs, *with_lanes));
                h.applier.apply_batch(&h.club.planner, vec![delta])?;
            }
            PlanOp::Move { slot, round } => {
                if let Some(set) = pick(*slot) {
                    let delta = SetDelta::update(set.id).with_index(*round);
                    h.applier.apply_batch(&h.club.planner, vec![delta])?;
                }
            }
            PlanOp::Roster {
                slot,
                dogs,
                with_lanes,
            } => {
                if let Some(set) = pick(*slot) {
                    let delta = SetDelta::update(set.id).with_dogs(roster(h, dogs, *with_lanes));
                    h.applier.apply_batch(&h.club.planner, vec![delta])?;
                }
            }
            PlanOp::Delete { slots } => {
                let mut ids: Vec<SetId> = slots.iter().filter_map(|s| pick(*s)).map(|s| s.id).collect();
                ids.sort();
                ids.dedup();
                h.applier.delete_batch(&h.club.planner, &ids)?;
            }
        }
        Ok(())
    }
}

/// Sequential positions, alternating lanes when requested.
fn roster(h: &TestStore, dogs: &[usize], with_lanes: bool) -> Vec<RosterEntry> {
    dogs.iter()
        .enumerate()
        .map(|(position, slot)| {
            let dog = &h.club.dogs[slot % h.club.dogs.len()];
            let entry = RosterEntry::new(dog.id, position as u32 + 1);
            match (with_lanes, position % 2) {
                (false, _) => entry,
                (true, 0) => entry.in_lane(Lane::Left),
                (true, _) => entry.in_lane(Lane::Right),
            }
        })
        .collect()
}

/// Strategy for dog slot lists.
pub fn dog_slots_strategy() -> impl Strategy<Value = Vec<usize>> {
    prop::collection::vec(0usize..8, 0..4)
}

/// Strategy for single edits. Lanes are present most of the time.
pub fn plan_op_strategy() -> impl Strategy<Value = PlanOp> {
    let with_lanes = prop::bool::weighted(0.8);
    prop_oneof![
        3 => (any::<bool>(), 1u32..8, dog_slots_strategy(), with_lanes.clone()).prop_map(
            |(at_field, round, dogs, with_lanes)| PlanOp::Create {
                at_field,
                round,
                dogs,
                with_lanes,
            }
        ),
        2 => (any::<usize>(), 1u32..8).prop_map(|(slot, round)| PlanOp::Move { slot, round }),
        2 => (any::<usize>(), dog_slots_strategy(), with_lanes).prop_map(
            |(slot, dogs, with_lanes)| PlanOp::Roster {
                slot,
                dogs,
                with_lanes,
            }
        ),
        1 => prop::collection::vec(any::<usize>(), 1..3).prop_map(|slots| PlanOp::Delete { slots }),
    ]
}

/// Strategy for edit sequences.
pub fn plan_ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<PlanOp>> {
    prop::collection::vec(plan_op_strategy(), 0..max_len)
}

/// Strategy for reducer actions touching a fixed pool of set ids.
///
/// Covers local adds, updates and removes plus pushed updates, deletes and
/// rating changes.
///
/// Rows and events stamp [`fixture_now`] so replaying the same actions
/// yields identical states.
pub fn action_strategy(
    practice: &Practice,
    location_id: LocationId,
    pool: Vec<SetId>,
) -> impl Strategy<Value = Action> {
    let practice_id = practice.id;
    let audience = Audience::for_practice(practice);
    let ids = prop::sample::select(pool);
    let row = (ids.clone(), 1u32..6).prop_map(move |(id, index)| {
        let mut set = PracticeSet::new(practice_id, location_id, index);
        set.id = id;
        set.updated_at = fixture_now();
        set
    });

    prop_oneof![
        row.clone().prop_map(Action::Add),
        ids.clone().prop_map(Action::Remove),
        (ids.clone(), 1u32..6).prop_map(|(id, index)| Action::Update {
            id,
            fields: SetDelta::update(id).with_index(index),
            at: fixture_now(),
        }),
        (row, 1u64..100).prop_map(move |(set, seq)| {
            Action::Remote(ChangeEvent::set_updated(
                SequenceNumber::new(seq),
                audience,
                set,
            ))
        }),
        (ids.clone(), 1u64..100).prop_map(move |(id, seq)| {
            Action::Remote(ChangeEvent::set_deleted(
                SequenceNumber::new(seq),
                audience,
                id,
            ))
        }),
        (ids, prop::option::of(1u8..=5), 1u64..100).prop_map(move |(id, rating, seq)| {
            Action::Remote(ChangeEvent::rating_changed(
                SequenceNumber::new(seq),
                audience,
                id,
                None,
                rating,
            ))
        }),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::strategy::ValueTree;
    use proptest::test_runner::TestRunner;

    #[test]
    fn ops_on_empty_practice_do_not_fail() {
        let h = TestStore::new();
        PlanOp::Move { slot: 3, round: 2 }.run(&h).unwrap();
        PlanOp::Delete { slots: vec![1] }.run(&h).unwrap();
        assert!(h.sets().is_empty());
    }

    #[test]
    fn generated_creates_use_known_rounds() {
        let mut runner = TestRunner::default();
        for _ in 0..32 {
            let op = plan_op_strategy().new_tree(&mut runner).unwrap().current();
            if let PlanOp::Create { round, .. } = op {
                assert!((1..8).contains(&round));
            }
        }
    }
}
