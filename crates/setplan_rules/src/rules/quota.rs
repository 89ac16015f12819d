//! Per-dog set quotas against the club's ideal. Silent without club
//! settings.

use crate::diagnostic::{codes, Diagnostic, DiagnosticPayload, DogQuota};
use crate::engine::Rule;
use crate::facts::{plural, Facts};
use setplan_core::DogId;

fn quotas(facts: &Facts<'_>, dogs: Vec<DogId>, target: u32) -> Vec<DogQuota> {
    facts
        .dog_refs(dogs)
        .into_iter()
        .map(|dog| DogQuota {
            sets: facts.appearances(dog.dog_id),
            dog,
            target,
        })
        .collect()
}

/// A confirmed dog runs a single set while the club wants more.
#[derive(Debug, Clone, Copy)]
pub struct UnderQuota;

impl Rule for UnderQuota {
    fn name(&self) -> &'static str {
        "under-quota"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic> {
        let target = facts.club_settings()?.ideal_sets_per_dog;
        if target <= 1 {
            return None;
        }
        let under: Vec<_> = facts
            .confirmed_active_dogs()
            .into_iter()
            .filter(|dog| facts.appearances(*dog) == 1)
            .collect();
        if under.is_empty() {
            return None;
        }
        let count = under.len();
        Some(
            Diagnostic::warning(
                codes::UNDER_QUOTA,
                format!(
                    "{} in only one set, target is {}",
                    plural(count, "dog"),
                    target
                ),
            )
            .with_count(count)
            .with_payload(DiagnosticPayload::Quotas {
                dogs: quotas(facts, under, target),
            }),
        )
    }
}

/// A confirmed dog runs more sets than the club's ideal.
#[derive(Debug, Clone, Copy)]
pub struct OverQuota;

impl Rule for OverQuota {
    fn name(&self) -> &'static str {
        "over-quota"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic> {
        let target = facts.club_settings()?.ideal_sets_per_dog;
        if target == 0 {
            return None;
        }
        let over: Vec<_> = facts
            .confirmed_active_dogs()
            .into_iter()
            .filter(|dog| facts.appearances(*dog) > target)
            .collect();
        if over.is_empty() {
            return None;
        }
        let count = over.len();
        Some(
            Diagnostic::info(
                codes::OVER_QUOTA,
                format!(
                    "{} above the target of {}",
                    plural(count, "dog"),
                    plural(target as usize, "set")
                ),
            )
            .with_count(count)
            .with_payload(DiagnosticPayload::Quotas {
                dogs: quotas(facts, over, target),
            }),
        )
    }
}
