//! Structural invariant checks over a practice snapshot.
//!
//! These are pure functions: they look at the full set list of one practice
//! and report violations. The batch applier runs them on the staged state
//! before every commit, always over the final state and never over deltas.
//!
//! Checks run in a fixed order:
//! 1. lane completeness (double-lane locations)
//! 2. roster position uniqueness per (set, lane)
//! 3. round uniqueness per (practice, location)

use crate::error::{CoreError, CoreResult};
use crate::model::{Lane, Location, PracticeSet};
use crate::types::{LocationId, PracticeId, SetId};
use std::collections::{BTreeMap, BTreeSet, HashMap};

fn ordered(sets: &[PracticeSet]) -> Vec<&PracticeSet> {
    let mut ordered: Vec<&PracticeSet> = sets.iter().collect();
    ordered.sort_by_key(|s| s.sort_key());
    ordered
}

/// Finds roster entries without a lane at double-lane locations.
///
/// A set whose location is unknown is reported as a missing location.
pub fn lane_violations(
    sets: &[PracticeSet],
    locations: &HashMap<LocationId, Location>,
) -> Vec<CoreError> {
    let mut violations = Vec::new();
    for set in ordered(sets) {
        let Some(location) = locations.get(&set.location_id) else {
            violations.push(CoreError::LocationNotFound {
                location_id: set.location_id,
            });
            continue;
        };
        if location.is_double_lane && set.dogs.iter().any(|d| d.lane.is_none()) {
            violations.push(CoreError::MissingLane {
                location_id: location.id,
                location_name: location.name.clone(),
                set_id: set.id,
            });
        }
    }
    violations
}

/// Finds roster positions used twice within one lane of a set.
pub fn roster_index_violations(sets: &[PracticeSet]) -> Vec<CoreError> {
    let mut violations = Vec::new();
    for set in ordered(sets) {
        let mut seen: BTreeSet<(Option<Lane>, u32)> = BTreeSet::new();
        let mut reported: BTreeSet<(Option<Lane>, u32)> = BTreeSet::new();
        for entry in &set.dogs {
            let key = (entry.lane, entry.index);
            if !seen.insert(key) && reported.insert(key) {
                violations.push(CoreError::DuplicateRosterIndex {
                    set_id: set.id,
                    lane: entry.lane,
                    index: entry.index,
                });
            }
        }
    }
    violations
}

/// Finds rounds used twice at one location of a practice.
pub fn set_index_violations(practice_id: PracticeId, sets: &[PracticeSet]) -> Vec<CoreError> {
    let mut seen: BTreeMap<(LocationId, u32), SetId> = BTreeMap::new();
    let mut reported: BTreeSet<(LocationId, u32)> = BTreeSet::new();
    let mut violations = Vec::new();

    for set in ordered(sets).into_iter().filter(|s| s.practice_id == practice_id) {
        let key = (set.location_id, set.index);
        if seen.insert(key, set.id).is_some() && reported.insert(key) {
            violations.push(CoreError::DuplicateSetIndex {
                practice_id,
                location_id: set.location_id,
                index: set.index,
            });
        }
    }
    violations
}

/// Returns every violation, in check order.
pub fn violations(
    practice_id: PracticeId,
    sets: &[PracticeSet],
    locations: &HashMap<LocationId, Location>,
) -> Vec<CoreError> {
    let mut all = lane_violations(sets, locations);
    all.extend(roster_index_violations(sets));
    all.extend(set_index_violations(practice_id, sets));
    all
}

/// Checks the whole practice, failing on the first violation.
pub fn check_practice(
    practice_id: PracticeId,
    sets: &[PracticeSet],
    locations: &HashMap<LocationId, Location>,
) -> CoreResult<()> {
    match violations(practice_id, sets, locations).into_iter().next() {
        Some(violation) => Err(violation),
        None => Ok(()),
    }
}
