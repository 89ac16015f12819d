//! Delete command implementation.

use setplan_core::{BatchApplier, ChangeFeed, SetId, SetStore, StoreSnapshot, UserId};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Runs the delete command.
pub fn run(
    state: &Path,
    ids: &[SetId],
    user: Option<UserId>,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(SetStore::from_snapshot(StoreSnapshot::load(state)?));
    let practice = ids
        .iter()
        .find_map(|id| store.set(*id))
        .map(|s| s.practice_id);
    let caller = super::operator(&store, user, practice);

    let feed = Arc::new(ChangeFeed::new());
    let applier = BatchApplier::new(Arc::clone(&store), feed.clone());
    applier.delete_batch(&caller, ids)?;

    super::print_events(&feed.events())?;
    if dry_run {
        info!(sets = ids.len(), "dry run, state not written");
    } else {
        store.to_snapshot().save(state)?;
        info!(sets = ids.len(), path = %state.display(), "state written");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::write_state;
    use tempfile::TempDir;

    #[test]
    fn deleting_a_middle_round_compacts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        let state = write_state(&path);

        run(&path, &[state.sets[1].id], None, false).unwrap();

        let saved = StoreSnapshot::load(&path).unwrap();
        let mut rounds: Vec<_> = saved.sets.iter().map(|s| (s.id, s.index)).collect();
        rounds.sort_by_key(|(_, index)| *index);
        assert_eq!(rounds, vec![(state.sets[0].id, 1), (state.sets[2].id, 2)]);
    }

    #[test]
    fn unknown_set_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        write_state(&path);
        assert!(run(&path, &[SetId::new()], None, false).is_err());
    }
}
