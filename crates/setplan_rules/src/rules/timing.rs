//! Scheduling-time rules. Both need the evaluation instant.

use crate::diagnostic::{codes, Diagnostic};
use crate::engine::Rule;
use crate::facts::{plural, Facts};
use chrono::Months;

/// The practice starts before the evaluation instant.
#[derive(Debug, Clone, Copy)]
pub struct PracticeInPast;

impl Rule for PracticeInPast {
    fn name(&self) -> &'static str {
        "practice-in-past"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic> {
        let now = facts.now()?;
        (facts.practice().scheduled_at < now).then(|| {
            Diagnostic::error(
                codes::PRACTICE_IN_PAST,
                "Practice is scheduled in the past",
            )
        })
    }
}

/// The practice starts beyond the scheduling horizon.
#[derive(Debug, Clone, Copy)]
pub struct PracticeTooFarOut;

impl Rule for PracticeTooFarOut {
    fn name(&self) -> &'static str {
        "practice-too-far-out"
    }

    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic> {
        let months = facts.config().horizon_months;
        let limit = facts.now()?.checked_add_months(Months::new(months))?;
        (facts.practice().scheduled_at > limit).then(|| {
            Diagnostic::warning(
                codes::PRACTICE_TOO_FAR_OUT,
                format!(
                    "Practice is scheduled more than {} out",
                    plural(months as usize, "month")
                ),
            )
        })
    }
}
