//! Built-in validation rules.
//!
//! # Categories
//!
//! - **Attendance**: [`UnconfirmedAttendance`], [`OrphanedSetAttendance`]
//! - **Timing**: [`PracticeInPast`], [`PracticeTooFarOut`]
//! - **Roster**: [`TooFewDogs`], [`NoSetsConfigured`], [`UnscheduledDog`]
//! - **Handlers**: [`SameHandlerInSet`], [`BackToBackHandler`]
//! - **Quota**: [`UnderQuota`], [`OverQuota`]

mod attendance;
mod handlers;
mod quota;
mod roster;
mod timing;

pub use attendance::{OrphanedSetAttendance, UnconfirmedAttendance};
pub use handlers::{BackToBackHandler, SameHandlerInSet};
pub use quota::{OverQuota, UnderQuota};
pub use roster::{NoSetsConfigured, TooFewDogs, UnscheduledDog};
pub use timing::{PracticeInPast, PracticeTooFarOut};

use crate::engine::Rule;
use std::sync::Arc;

/// Every built-in rule, in evaluation order.
pub fn standard_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(UnconfirmedAttendance),
        Arc::new(PracticeInPast),
        Arc::new(PracticeTooFarOut),
        Arc::new(TooFewDogs),
        Arc::new(NoSetsConfigured),
        Arc::new(OrphanedSetAttendance),
        Arc::new(SameHandlerInSet),
        Arc::new(BackToBackHandler),
        Arc::new(UnscheduledDog),
        Arc::new(UnderQuota),
        Arc::new(OverQuota),
    ]
}
