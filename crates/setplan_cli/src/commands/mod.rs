//! CLI command implementations.

pub mod apply;
pub mod delete;
pub mod inspect;
pub mod validate;

use setplan_bus::WireEnvelope;
use setplan_core::{Caller, ChangeEvent, PracticeId, SetStore, UserId};
use std::collections::BTreeSet;

/// Builds the caller a file command acts as.
///
/// The operator belongs to every club in the state. Without an explicit
/// user it acts as the planner of the touched practice, so private
/// practices stay editable.
pub fn operator(store: &SetStore, user: Option<UserId>, practice: Option<PracticeId>) -> Caller {
    let clubs: BTreeSet<_> = store.practices().iter().map(|p| p.club_id).collect();
    let user_id = user
        .or_else(|| practice.and_then(|id| store.practice(id)).map(|p| p.planner_id))
        .unwrap_or_default();
    Caller::new(user_id, clubs)
}

/// Prints events as wire envelopes, one JSON object per line.
pub fn print_events(events: &[ChangeEvent]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", WireEnvelope::from(event).to_json()?);
    }
    Ok(())
}
