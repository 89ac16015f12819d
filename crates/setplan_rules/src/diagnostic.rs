//! Diagnostics produced by validation rules.

use serde::{Deserialize, Serialize};
use setplan_core::{DogId, HandlerId, SetId};
use std::cmp::Ordering;
use std::fmt;

/// Stable diagnostic codes of the built-in rules.
pub mod codes {
    /// Some dogs have not answered attendance.
    pub const UNCONFIRMED_ATTENDANCE: &str = "UNCONFIRMED_ATTENDANCE";
    /// The practice is scheduled in the past.
    pub const PRACTICE_IN_PAST: &str = "PRACTICE_IN_PAST";
    /// The practice is scheduled beyond the horizon.
    pub const PRACTICE_TOO_FAR_OUT: &str = "PRACTICE_TOO_FAR_OUT";
    /// Fewer confirmed dogs than the minimum.
    pub const TOO_FEW_DOGS: &str = "TOO_FEW_DOGS";
    /// The practice has no sets.
    pub const NO_SETS_CONFIGURED: &str = "NO_SETS_CONFIGURED";
    /// A rostered dog is not confirmed attending.
    pub const ORPHANED_SET_ATTENDANCE: &str = "ORPHANED_SET_ATTENDANCE";
    /// One handler has several dogs in one set.
    pub const SAME_HANDLER_IN_SET: &str = "SAME_HANDLER_IN_SET";
    /// A handler runs in consecutive rounds.
    pub const BACK_TO_BACK_HANDLER: &str = "BACK_TO_BACK_HANDLER";
    /// A confirmed dog is on no roster.
    pub const UNSCHEDULED_DOG: &str = "UNSCHEDULED_DOG";
    /// A confirmed dog runs only one set.
    pub const UNDER_QUOTA: &str = "UNDER_QUOTA";
    /// A confirmed dog runs more sets than the club target.
    pub const OVER_QUOTA: &str = "OVER_QUOTA";
}

/// Diagnostic severity, most severe first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks the practice from being ready.
    Error,
    /// Worth fixing.
    Warning,
    /// For information.
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
        }
    }
}

/// A dog named in a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogRef {
    /// The dog.
    pub dog_id: DogId,
    /// Call name, or the ID when the dog is not in the registry.
    pub name: String,
}

/// Several dogs of one handler in one set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerConflict {
    /// The handler.
    pub handler_id: HandlerId,
    /// Display name.
    pub handler_name: String,
    /// The set.
    pub set_id: SetId,
    /// Round of the set.
    pub round: u32,
    /// The handler's dogs in the set.
    pub dogs: Vec<DogRef>,
}

/// A streak of consecutive rounds for one handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerRun {
    /// The handler.
    pub handler_id: HandlerId,
    /// Display name.
    pub handler_name: String,
    /// Consecutive rounds, ascending.
    pub rounds: Vec<u32>,
}

/// How many sets a dog runs against the club target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DogQuota {
    /// The dog.
    pub dog: DogRef,
    /// Sets the dog appears in.
    pub sets: u32,
    /// Club target.
    pub target: u32,
}

/// Structured details of a diagnostic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DiagnosticPayload {
    /// Affected dogs.
    Dogs {
        /// The dogs.
        dogs: Vec<DogRef>,
    },
    /// Same-handler conflicts.
    HandlerConflicts {
        /// The conflicts.
        conflicts: Vec<HandlerConflict>,
    },
    /// Back-to-back runs.
    HandlerRuns {
        /// The runs.
        runs: Vec<HandlerRun>,
    },
    /// Per-dog set counts.
    Quotas {
        /// The dogs.
        dogs: Vec<DogQuota>,
    },
}

/// One validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    /// Machine-readable code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Severity.
    pub severity: Severity,
    /// How many items the finding covers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Structured details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<DiagnosticPayload>,
}

impl Diagnostic {
    /// Creates a diagnostic.
    pub fn new(code: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            severity,
            count: None,
            payload: None,
        }
    }

    /// Creates an error.
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Error, message)
    }

    /// Creates a warning.
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Warning, message)
    }

    /// Creates an info.
    pub fn info(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, Severity::Info, message)
    }

    /// Sets the count.
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Sets the payload.
    #[must_use]
    pub fn with_payload(mut self, payload: DiagnosticPayload) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Display order: severity, then message.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        self.severity
            .cmp(&other.severity)
            .then_with(|| self.message.cmp(&other.message))
            .then_with(|| self.code.cmp(&other.code))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.severity, self.code, self.message)
    }
}

/// Diagnostic counts by severity.
///
/// Whether a practice is ready stays the caller's decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticSummary {
    /// Errors.
    pub errors: usize,
    /// Warnings.
    pub warnings: usize,
    /// Infos.
    pub infos: usize,
}

impl DiagnosticSummary {
    /// Counts a diagnostic list.
    pub fn from_diagnostics(diagnostics: &[Diagnostic]) -> Self {
        let mut summary = Self::default();
        for diagnostic in diagnostics {
            match diagnostic.severity {
                Severity::Error => summary.errors += 1,
                Severity::Warning => summary.warnings += 1,
                Severity::Info => summary.infos += 1,
            }
        }
        summary
    }

    /// Total number of diagnostics.
    pub fn total(&self) -> usize {
        self.errors + self.warnings + self.infos
    }
}
