//! Handler workload rules.
//!
//! A dog's handler is its registry owner. Dogs missing from the registry
//! are ignored here.

use crate::diagnostic::{codes, Diagnostic, DiagnosticPayload, HandlerConflict, HandlerRun};
use crate::engine::Rule;
use crate::facts::{plural, Facts};
use setplan_core::{DogId, HandlerId};
use std::collections::{BTreeMap, BTreeSet};

/// One handler has two or more dogs in the same set.
#[derive(Debug, Clone, Copy)]
pub struct SameHandlerInSet;

impl Rule for SameHandlerInSet {
    fn name(&self) -> &'static str {
        "same-handler-in-set"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic> {
        let mut conflicts = Vec::new();
        for set in facts.sets() {
            let mut by_handler: BTreeMap<HandlerId, BTreeSet<DogId>> = BTreeMap::new();
            for dog_id in set.dog_ids() {
                if let Some(handler_id) = facts.handler_of(dog_id) {
                    by_handler.entry(handler_id).or_default().insert(dog_id);
                }
            }
            conflicts.extend(
                by_handler
                    .into_iter()
                    .filter(|(_, dogs)| dogs.len() > 1)
                    .map(|(handler_id, dogs)| HandlerConflict {
                        handler_id,
                        handler_name: facts.handler_name(handler_id),
                        set_id: set.id,
                        round: set.index,
                        dogs: facts.dog_refs(dogs),
                    }),
            );
        }

        let message = match conflicts.as_slice() {
            [] => return None,
            [only] => format!(
                "{} runs {} in round {}",
                only.handler_name,
                only.dogs
                    .iter()
                    .map(|d| d.name.as_str())
                    .collect::<Vec<_>>()
                    .join(" and "),
                only.round
            ),
            many => format!(
                "{} with several dogs in one set",
                plural(many.len(), "handler conflict")
            ),
        };
        Some(
            Diagnostic::warning(codes::SAME_HANDLER_IN_SET, message)
                .with_count(conflicts.len())
                .with_payload(DiagnosticPayload::HandlerConflicts { conflicts }),
        )
    }
}

/// A handler runs in two or more consecutive rounds.
///
/// Rounds are scanned in ascending order. A streak grows while each round
/// follows the previous one and restarts on any gap. Every streak of at
/// least two rounds is reported.
#[derive(Debug, Clone, Copy)]
pub struct BackToBackHandler;

impl Rule for BackToBackHandler {
    fn name(&self) -> &'static str {
        "back-to-back-handler"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic> {
        let mut rounds_by_handler: BTreeMap<HandlerId, BTreeSet<u32>> = BTreeMap::new();
        for set in facts.sets() {
            for dog_id in set.dog_ids() {
                if let Some(handler_id) = facts.handler_of(dog_id) {
                    rounds_by_handler
                        .entry(handler_id)
                        .or_default()
                        .insert(set.index);
                }
            }
        }

        let mut runs = Vec::new();
        for (handler_id, rounds) in rounds_by_handler {
            for streak in consecutive_runs(&rounds) {
                runs.push(HandlerRun {
                    handler_id,
                    handler_name: facts.handler_name(handler_id),
                    rounds: streak,
                });
            }
        }
        runs.sort_by(|a, b| {
            a.handler_name
                .cmp(&b.handler_name)
                .then(a.handler_id.cmp(&b.handler_id))
                .then(a.rounds.cmp(&b.rounds))
        });

        let message = match runs.as_slice() {
            [] => return None,
            [only] => format!(
                "{} runs back to back in rounds {}",
                only.handler_name,
                only.rounds
                    .iter()
                    .map(u32::to_string)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            many => format!("{} of back-to-back rounds", plural(many.len(), "run")),
        };
        Some(
            Diagnostic::info(codes::BACK_TO_BACK_HANDLER, message)
                .with_count(runs.len())
                .with_payload(DiagnosticPayload::HandlerRuns { runs }),
        )
    }
}

/// Splits ascending rounds into streaks of two or more consecutive values.
fn consecutive_runs(rounds: &BTreeSet<u32>) -> Vec<Vec<u32>> {
    let mut runs = Vec::new();
    let mut streak: Vec<u32> = Vec::new();
    for &round in rounds {
        let extends = streak
            .last()
            .is_some_and(|last| last.checked_add(1) == Some(round));
        if !extends {
            if streak.len() > 1 {
                runs.push(std::mem::take(&mut streak));
            }
            streak.clear();
        }
        streak.push(round);
    }
    if streak.len() > 1 {
        runs.push(streak);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;
    use crate::rules::testing::Plan;

    fn rounds(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    #[test]
    fn runs_split_on_gaps() {
        assert_eq!(consecutive_runs(&rounds(&[3, 4, 7])), vec![vec![3, 4]]);
        assert_eq!(
            consecutive_runs(&rounds(&[1, 2, 3, 5, 8, 9])),
            vec![vec![1, 2, 3], vec![8, 9]]
        );
        assert!(consecutive_runs(&rounds(&[1, 3, 5])).is_empty());
        assert!(consecutive_runs(&rounds(&[])).is_empty());
        assert_eq!(
            consecutive_runs(&rounds(&[u32::MAX - 1, u32::MAX])),
            vec![vec![u32::MAX - 1, u32::MAX]]
        );
    }

    proptest::proptest! {
        #[test]
        fn runs_cover_exactly_the_adjacent_pairs(values in proptest::collection::btree_set(1u32..40, 0..20)) {
            let runs = consecutive_runs(&values);
            for run in &runs {
                proptest::prop_assert!(run.len() > 1);
                proptest::prop_assert!(run.windows(2).all(|w| w[1] == w[0] + 1));
                proptest::prop_assert!(run.iter().all(|r| values.contains(r)));
            }
            let covered: usize = runs.iter().map(|r| r.len() - 1).sum();
            let adjacent = values.iter().filter(|v| values.contains(&(**v + 1))).count();
            proptest::prop_assert_eq!(covered, adjacent);
        }
    }

    #[test]
    fn two_dogs_of_one_handler_in_a_set() {
        let mut plan = Plan::new();
        let h = plan.handler("Hana");
        let a = plan.dog("Ace", h);
        let b = plan.dog("Bee", h);
        let other = plan.confirmed_dog("Cid");
        let set = plan.set(5, &[b, other, a]);
        plan.set(6, &[a]);

        let d = plan.run(&SameHandlerInSet).unwrap();
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.count, Some(1));
        assert_eq!(d.message, "Hana runs Ace and Bee in round 5");
        match d.payload {
            Some(DiagnosticPayload::HandlerConflicts { conflicts }) => {
                assert_eq!(conflicts.len(), 1);
                assert_eq!(conflicts[0].handler_id, h);
                assert_eq!(conflicts[0].set_id, set);
                assert_eq!(conflicts[0].round, 5);
                let dogs: Vec<_> = conflicts[0].dogs.iter().map(|r| r.dog_id).collect();
                assert_eq!(dogs, vec![a, b]);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn same_dog_twice_is_not_a_conflict() {
        let mut plan = Plan::new();
        let rex = plan.confirmed_dog("Rex");
        plan.set(1, &[rex, rex]);
        assert!(plan.run(&SameHandlerInSet).is_none());
    }

    #[test]
    fn consecutive_rounds_are_reported_once_per_streak() {
        let mut plan = Plan::new();
        let h = plan.handler("Hana");
        let a = plan.dog("Ace", h);
        let b = plan.dog("Bee", h);
        let other = plan.confirmed_dog("Cid");
        plan.set(3, &[a]);
        plan.set(4, &[b]);
        plan.set(5, &[other]);
        plan.set(7, &[a]);

        let d = plan.run(&BackToBackHandler).unwrap();
        assert_eq!(d.severity, Severity::Info);
        assert_eq!(d.count, Some(1));
        assert_eq!(d.message, "Hana runs back to back in rounds 3, 4");

        plan.set(8, &[b]);
        let d = plan.run(&BackToBackHandler).unwrap();
        assert_eq!(d.count, Some(2));
        match d.payload {
            Some(DiagnosticPayload::HandlerRuns { runs }) => {
                let streaks: Vec<_> = runs.iter().map(|r| r.rounds.clone()).collect();
                assert_eq!(streaks, vec![vec![3, 4], vec![7, 8]]);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn two_locations_in_one_round_count_once() {
        let mut plan = Plan::new();
        let h = plan.handler("Hana");
        let a = plan.dog("Ace", h);
        let b = plan.dog("Bee", h);
        plan.set(2, &[a]);
        plan.set(2, &[b]);
        assert!(plan.run(&BackToBackHandler).is_none());
    }
}
