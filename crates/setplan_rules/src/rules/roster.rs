//! Roster size rules.

use crate::diagnostic::{codes, Diagnostic, DiagnosticPayload};
use crate::engine::Rule;
use crate::facts::{plural, Facts};

/// Fewer dogs confirmed than the practice needs.
#[derive(Debug, Clone, Copy)]
pub struct TooFewDogs;

impl Rule for TooFewDogs {
    fn name(&self) -> &'static str {
        "too-few-dogs"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic> {
        let confirmed = facts.confirmed_dogs().len();
        let min = facts.config().min_confirmed_dogs;
        (confirmed < min).then(|| {
            Diagnostic::error(
                codes::TOO_FEW_DOGS,
                format!(
                    "Only {} confirmed, at least {} needed",
                    plural(confirmed, "dog"),
                    min
                ),
            )
            .with_count(confirmed)
        })
    }
}

/// The practice has no sets.
#[derive(Debug, Clone, Copy)]
pub struct NoSetsConfigured;

impl Rule for NoSetsConfigured {
    fn name(&self) -> &'static str {
        "no-sets-configured"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic> {
        facts
            .sets()
            .is_empty()
            .then(|| Diagnostic::error(codes::NO_SETS_CONFIGURED, "No sets configured"))
    }
}

/// A confirmed, active dog appears on no roster.
///
/// Silent while the practice has no sets at all.
#[derive(Debug, Clone, Copy)]
pub struct UnscheduledDog;

impl Rule for UnscheduledDog {
    fn name(&self) -> &'static str {
        "unscheduled-dog"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic> {
        if facts.sets().is_empty() {
            return None;
        }
        let unscheduled: Vec<_> = facts
            .confirmed_active_dogs()
            .into_iter()
            .filter(|dog| facts.appearances(*dog) == 0)
            .collect();
        if unscheduled.is_empty() {
            return None;
        }
        Some(
            Diagnostic::error(
                codes::UNSCHEDULED_DOG,
                format!(
                    "{} confirmed but not in any set",
                    plural(unscheduled.len(), "dog")
                ),
            )
            .with_count(unscheduled.len())
            .with_payload(DiagnosticPayload::Dogs {
                dogs: facts.dog_refs(unscheduled),
            }),
        )
    }
}
