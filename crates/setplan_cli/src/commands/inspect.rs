//! Inspect command implementation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use setplan_core::invariants;
use setplan_core::{
    Location, LocationId, PracticeId, PracticeSet, PracticeStatus, PracticeSummary, SequenceNumber,
    StoreSnapshot,
};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// State file inspection result.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InspectResult {
    /// State file path.
    pub path: String,
    /// Last committed sequence.
    pub sequence: SequenceNumber,
    /// Inspected practices.
    pub practices: Vec<PracticeReport>,
}

/// One practice.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PracticeReport {
    /// Practice ID.
    pub id: PracticeId,
    /// Scheduled start.
    pub scheduled_at: DateTime<Utc>,
    /// Planning status.
    pub status: PracticeStatus,
    /// Private flag.
    pub is_private: bool,
    /// Aggregate counts.
    pub summary: PracticeSummary,
    /// Rounds in order.
    pub rounds: Vec<RoundReport>,
    /// Structural violations, empty when consistent.
    pub violations: Vec<String>,
}

/// One round of a practice.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundReport {
    /// Round number.
    pub index: u32,
    /// Locations used in the round.
    pub locations: Vec<String>,
    /// Roster entries across the round's sets.
    pub dogs: usize,
}

/// Runs the inspect command.
pub fn run(
    path: &Path,
    practice: Option<PracticeId>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path, practice)?;
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }
    Ok(())
}

fn inspect(
    path: &Path,
    only: Option<PracticeId>,
) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let snapshot = StoreSnapshot::load(path)?;
    if let Some(id) = only {
        if !snapshot.practices.iter().any(|p| p.id == id) {
            return Err(format!("No practice {id} in {}", path.display()).into());
        }
    }

    let locations: HashMap<LocationId, Location> = snapshot
        .locations
        .iter()
        .map(|l| (l.id, l.clone()))
        .collect();

    let mut practices: Vec<_> = snapshot
        .practices
        .iter()
        .filter(|p| only.is_none_or(|id| id == p.id))
        .collect();
    practices.sort_by_key(|p| (p.scheduled_at, p.id));

    let reports = practices
        .into_iter()
        .map(|practice| {
            let mut sets: Vec<PracticeSet> = snapshot
                .sets
                .iter()
                .filter(|s| s.practice_id == practice.id)
                .cloned()
                .collect();
            sets.sort_by_key(|s| s.sort_key());

            PracticeReport {
                id: practice.id,
                scheduled_at: practice.scheduled_at,
                status: practice.status,
                is_private: practice.is_private,
                summary: PracticeSummary::from_sets(practice.id, &sets),
                rounds: rounds(&sets, &locations),
                violations: invariants::violations(practice.id, &sets, &locations)
                    .iter()
                    .map(|v| v.to_string())
                    .collect(),
            }
        })
        .collect();

    Ok(InspectResult {
        path: path.display().to_string(),
        sequence: snapshot.sequence,
        practices: reports,
    })
}

fn rounds(sets: &[PracticeSet], locations: &HashMap<LocationId, Location>) -> Vec<RoundReport> {
    let mut by_round: BTreeMap<u32, RoundReport> = BTreeMap::new();
    for set in sets {
        let round = by_round.entry(set.index).or_insert_with(|| RoundReport {
            index: set.index,
            locations: Vec::new(),
            dogs: 0,
        });
        round.locations.push(
            locations
                .get(&set.location_id)
                .map_or_else(|| set.location_id.to_string(), |l| l.name.clone()),
        );
        round.dogs += set.dogs.len();
    }
    by_round.into_values().collect()
}

fn print_text_output(result: &InspectResult) {
    println!("SetPlan State Inspection");
    println!("========================");
    println!();
    println!("Path:     {}", result.path);
    println!("Sequence: {}", result.sequence);

    for practice in &result.practices {
        println!();
        println!(
            "Practice {} ({:?}{})",
            practice.id,
            practice.status,
            if practice.is_private { ", private" } else { "" }
        );
        println!("  Scheduled: {}", practice.scheduled_at.to_rfc3339());
        println!(
            "  Sets: {}  Rounds: {}  Warmups: {}  Dogs: {}",
            practice.summary.set_count,
            practice.summary.round_count,
            practice.summary.warmup_count,
            practice.summary.dog_count
        );
        for round in &practice.rounds {
            println!(
                "  [{}] {} ({} dogs)",
                round.index,
                round.locations.join(", "),
                round.dogs
            );
        }
        if practice.violations.is_empty() {
            println!("  Structure: OK");
        } else {
            println!("  Structure: {} violations", practice.violations.len());
            for violation in &practice.violations {
                println!("    - {violation}");
            }
        }
    }
}
