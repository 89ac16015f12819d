//! JSON export of the store state.

use crate::error::CoreResult;
use crate::model::{Location, Practice, PracticeSet};
use crate::types::SequenceNumber;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Serializable copy of the committed store state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    /// Last committed sequence.
    #[serde(default)]
    pub sequence: SequenceNumber,
    /// Practices.
    #[serde(default)]
    pub practices: Vec<Practice>,
    /// Locations.
    #[serde(default)]
    pub locations: Vec<Location>,
    /// Sets with their rosters.
    #[serde(default)]
    pub sets: Vec<PracticeSet>,
}

impl StoreSnapshot {
    /// Reads a snapshot from a JSON file.
    pub fn load(path: &Path) -> CoreResult<Self> {
        let bytes = fs::read(path)?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Writes the snapshot to a JSON file.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        let json = serde_json::to_vec_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
