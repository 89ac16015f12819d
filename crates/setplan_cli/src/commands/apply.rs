//! Apply command implementation.

use setplan_core::{BatchApplier, ChangeFeed, SetDelta, SetStore, StoreSnapshot, UserId};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Runs the apply command.
pub fn run(
    state: &Path,
    batch: &Path,
    user: Option<UserId>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(SetStore::from_snapshot(StoreSnapshot::load(state)?));
    let deltas: Vec<SetDelta> = serde_json::from_slice(&fs::read(batch)?)?;

    let practice = deltas.iter().find_map(|delta| {
        delta
            .practice_id
            .or_else(|| delta.id.and_then(|id| store.set(id)).map(|s| s.practice_id))
    });
    let caller = super::operator(&store, user, practice);

    let feed = Arc::new(ChangeFeed::new());
    let applier = BatchApplier::new(Arc::clone(&store), feed.clone());
    let committed = applier.apply_batch(&caller, deltas)?;

    super::print_events(&feed.events())?;
    if dry_run {
        info!(sets = committed.len(), "dry run, state not written");
    } else {
        store.to_snapshot().save(state)?;
        info!(sets = committed.len(), path = %state.display(), "state written");
    }
    Ok(())
}
