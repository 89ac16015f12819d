//! # SetPlan Rules
//!
//! Practice validation for SetPlan.
//!
//! [`validate`] runs a pipeline of independent rules over a
//! [`PracticeSnapshot`] and returns display-ordered [`Diagnostic`]s. The
//! engine is pure: it never reads the clock, never fails and returns the
//! same output for the same input.
//!
//! # Built-in rules
//!
//! | Code | Severity |
//! |------|----------|
//! | `UNCONFIRMED_ATTENDANCE` | info |
//! | `PRACTICE_IN_PAST` | error |
//! | `PRACTICE_TOO_FAR_OUT` | warning |
//! | `TOO_FEW_DOGS` | error |
//! | `NO_SETS_CONFIGURED` | error |
//! | `ORPHANED_SET_ATTENDANCE` | warning |
//! | `SAME_HANDLER_IN_SET` | warning |
//! | `BACK_TO_BACK_HANDLER` | info |
//! | `UNSCHEDULED_DOG` | error |
//! | `UNDER_QUOTA` | warning |
//! | `OVER_QUOTA` | info |
//!
//! # Example
//!
//! ```rust,ignore
//! use setplan_rules::{validate, DiagnosticSummary, ValidationContext};
//!
//! let diagnostics = validate(&snapshot, &ValidationContext::new(Utc::now()));
//! let summary = DiagnosticSummary::from_diagnostics(&diagnostics);
//! if summary.errors > 0 {
//!     // not ready to publish
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod diagnostic;
mod engine;
mod facts;
pub mod rules;
mod snapshot;

pub use config::RuleConfig;
pub use diagnostic::{
    codes, Diagnostic, DiagnosticPayload, DiagnosticSummary, DogQuota, DogRef, HandlerConflict,
    HandlerRun, Severity,
};
pub use engine::{validate, Rule, ValidationEngine};
pub use facts::Facts;
pub use snapshot::{PracticeSnapshot, ValidationContext};
