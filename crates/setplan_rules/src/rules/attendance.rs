//! Attendance rules.

use crate::diagnostic::{codes, Diagnostic, DiagnosticPayload};
use crate::engine::Rule;
use crate::facts::{plural, Facts};
use setplan_core::AttendanceStatus;

/// Some dogs have not answered whether they attend.
#[derive(Debug, Clone, Copy)]
pub struct UnconfirmedAttendance;

impl Rule for UnconfirmedAttendance {
    fn name(&self) -> &'static str {
        "unconfirmed-attendance"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic> {
        let unknown = facts.dogs_with_status(AttendanceStatus::Unknown);
        if unknown.is_empty() {
            return None;
        }
        Some(
            Diagnostic::info(
                codes::UNCONFIRMED_ATTENDANCE,
                format!("Attendance unconfirmed for {}", plural(unknown.len(), "dog")),
            )
            .with_count(unknown.len())
            .with_payload(DiagnosticPayload::Dogs {
                dogs: facts.dog_refs(unknown),
            }),
        )
    }
}

/// A rostered dog is not confirmed attending.
///
/// Covers dogs marked absent, dogs that never answered and dogs without
/// any record.
#[derive(Debug, Clone, Copy)]
pub struct OrphanedSetAttendance;

impl Rule for OrphanedSetAttendance {
    fn name(&self) -> &'static str {
        "orphaned-set-attendance"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic> {
        let orphaned: Vec<_> = facts
            .rostered_dogs()
            .into_iter()
            .filter(|dog| facts.status(*dog) != Some(AttendanceStatus::Attending))
            .collect();
        if orphaned.is_empty() {
            return None;
        }
        Some(
            Diagnostic::warning(
                codes::ORPHANED_SET_ATTENDANCE,
                format!(
                    "{} on a roster without confirmed attendance",
                    plural(orphaned.len(), "dog")
                ),
            )
            .with_count(orphaned.len())
            .with_payload(DiagnosticPayload::Dogs {
                dogs: facts.dog_refs(orphaned),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::Severity;
    use crate::rules::testing::Plan;
    use setplan_core::DogId;

    #[test]
    fn unknown_dogs_are_listed() {
        let mut plan = Plan::new();
        let owner = plan.handler("Ana");
        let rex = plan.dog("Rex", owner);
        let ace = plan.dog("Ace", owner);
        let zed = plan.dog("Zed", owner);
        plan.confirm(rex);

        let d = plan.run(&UnconfirmedAttendance).unwrap();
        assert_eq!(d.severity, Severity::Info);
        assert_eq!(d.count, Some(2));
        assert_eq!(d.message, "Attendance unconfirmed for 2 dogs");
        match d.payload {
            Some(DiagnosticPayload::Dogs { dogs }) => {
                let ids: Vec<_> = dogs.iter().map(|r| r.dog_id).collect();
                assert_eq!(ids, vec![ace, zed]);
            }
            other => panic!("unexpected payload: {other:?}"),
        }
    }

    #[test]
    fn all_answered_is_silent() {
        let mut plan = Plan::new();
        let owner = plan.handler("Ana");
        let rex = plan.dog("Rex", owner);
        let ace = plan.dog("Ace", owner);
        plan.confirm(rex);
        plan.mark(ace, AttendanceStatus::NotAttending);
        assert!(plan.run(&UnconfirmedAttendance).is_none());
    }

    #[test]
    fn rostered_dogs_must_be_confirmed() {
        let mut plan = Plan::new();
        let owner = plan.handler("Ana");
        let rex = plan.dog("Rex", owner);
        let ace = plan.dog("Ace", owner);
        let absent = plan.dog("Bo", owner);
        let stranger = DogId::new();
        plan.confirm(rex);
        plan.mark(absent, AttendanceStatus::NotAttending);
        plan.set(1, &[rex, ace]);
        plan.set(2, &[absent, stranger]);

        let d = plan.run(&OrphanedSetAttendance).unwrap();
        assert_eq!(d.severity, Severity::Warning);
        assert_eq!(d.count, Some(3));
        assert_eq!(d.message, "3 dogs on a roster without confirmed attendance");
    }

    #[test]
    fn confirmed_rosters_are_silent() {
        let mut plan = Plan::new();
        let rex = plan.confirmed_dog("Rex");
        plan.set(1, &[rex]);
        assert!(plan.run(&OrphanedSetAttendance).is_none());
    }
}
