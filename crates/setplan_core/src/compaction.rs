//! Round compaction after deletes.
//!
//! The round index space is shared by every location of a practice. A round
//! is only closed up when no location keeps a set at it.

use crate::model::PracticeSet;
use crate::types::SetId;
use std::collections::{BTreeMap, BTreeSet};

/// Rounds used by at least one set.
pub fn occupied_rounds(sets: &[PracticeSet]) -> BTreeSet<u32> {
    sets.iter().map(|s| s.index).collect()
}

/// Rounds occupied before a delete and empty after it, ascending.
pub fn vacated_rounds(before: &[PracticeSet], after: &[PracticeSet]) -> Vec<u32> {
    let remaining = occupied_rounds(after);
    occupied_rounds(before)
        .into_iter()
        .filter(|round| !remaining.contains(round))
        .collect()
}

/// Plans the index shifts closing every vacated round.
///
/// For each vacated round `r`, every remaining set above `r` moves down one.
/// Shifts accumulate per set, so a set above several vacated rounds is
/// listed once with its final index. Sets that do not move are omitted.
pub fn plan_compaction(remaining: &[PracticeSet], vacated: &[u32]) -> BTreeMap<SetId, u32> {
    let mut shifts: BTreeMap<SetId, u32> = BTreeMap::new();
    let mut rounds: Vec<u32> = vacated.to_vec();
    rounds.sort_unstable();
    rounds.dedup();

    for round in rounds {
        for set in remaining.iter().filter(|s| s.index > round) {
            *shifts.entry(set.id).or_insert(0) += 1;
        }
    }

    remaining
        .iter()
        .filter_map(|set| {
            shifts
                .get(&set.id)
                .map(|shift| (set.id, set.index - shift))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LocationId, PracticeId};

    fn sets(indices: &[(LocationId, u32)]) -> Vec<PracticeSet> {
        let practice = PracticeId::from_u128(1);
        indices
            .iter()
            .map(|(location, index)| PracticeSet::new(practice, *location, *index))
            .collect()
    }

    #[test]
    fn round_kept_by_another_location_is_not_vacated() {
        let (ring, field) = (LocationId::new(), LocationId::new());
        let before = sets(&[(ring, 1), (ring, 2), (field, 2), (ring, 3)]);
        let after: Vec<_> = before
            .iter()
            .filter(|s| !(s.location_id == ring && s.index == 2))
            .cloned()
            .collect();

        assert!(vacated_rounds(&before, &after).is_empty());
    }

    #[test]
    fn single_vacated_round_shifts_later_rounds() {
        let ring = LocationId::new();
        let before = sets(&[(ring, 1), (ring, 2), (ring, 3), (ring, 4)]);
        let after: Vec<_> = before.iter().filter(|s| s.index != 2).cloned().collect();

        let vacated = vacated_rounds(&before, &after);
        assert_eq!(vacated, vec![2]);

        let plan = plan_compaction(&after, &vacated);
        assert_eq!(plan.len(), 2);
        for set in &after {
            match set.index {
                1 => assert!(!plan.contains_key(&set.id)),
                3 => assert_eq!(plan[&set.id], 2),
                4 => assert_eq!(plan[&set.id], 3),
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn several_vacated_rounds_update_each_set_once() {
        let (ring, field) = (LocationId::new(), LocationId::new());
        let before = sets(&[(ring, 1), (field, 2), (ring, 3), (ring, 4), (field, 6)]);
        let after: Vec<_> = before
            .iter()
            .filter(|s| s.index != 2 && s.index != 4)
            .cloned()
            .collect();

        let vacated = vacated_rounds(&before, &after);
        assert_eq!(vacated, vec![2, 4]);

        let plan = plan_compaction(&after, &vacated);
        let finals: BTreeSet<u32> = after
            .iter()
            .map(|s| plan.get(&s.id).copied().unwrap_or(s.index))
            .collect();
        // 1, 3, 6 -> 1, 2, 4 (round 5 was already empty).
        assert_eq!(finals, BTreeSet::from([1, 2, 4]));
    }

    proptest::proptest! {
        #[test]
        fn compaction_closes_every_gap(n in 1u32..10, field_mask in 0u64..1024, removed_mask in proptest::prelude::any::<u64>()) {
            let (ring, field) = (LocationId::from_u128(1), LocationId::from_u128(2));
            let mut layout: Vec<_> = (1..=n).map(|round| (ring, round)).collect();
            layout.extend((1..=n).filter(|r| field_mask & (1u64 << *r) != 0).map(|round| (field, round)));
            let before = sets(&layout);
            let after: Vec<_> = before
                .iter()
                .enumerate()
                .filter(|(i, _)| removed_mask & (1u64 << *i) == 0)
                .map(|(_, s)| s.clone())
                .collect();

            let plan = plan_compaction(&after, &vacated_rounds(&before, &after));
            let compacted = |s: &PracticeSet| plan.get(&s.id).copied().unwrap_or(s.index);

            let finals: BTreeSet<u32> = after.iter().map(compacted).collect();
            let expected: BTreeSet<u32> = (1..=occupied_rounds(&after).len() as u32).collect();
            proptest::prop_assert_eq!(finals, expected);
            for a in &after {
                for b in &after {
                    proptest::prop_assert_eq!(a.index.cmp(&b.index), compacted(a).cmp(&compacted(b)));
                }
            }
        }
    }
}
