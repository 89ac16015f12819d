//! Validate command implementation.

use chrono::{DateTime, Utc};
use serde::Serialize;
use setplan_core::ClubSettings;
use setplan_rules::{validate, Diagnostic, DiagnosticSummary, PracticeSnapshot, ValidationContext};
use std::fs;
use std::path::Path;

/// Validation report.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResult {
    /// Practice snapshot path.
    pub path: String,
    /// Evaluation instant.
    pub now: DateTime<Utc>,
    /// Counts by severity.
    pub summary: DiagnosticSummary,
    /// Diagnostics in display order.
    pub diagnostics: Vec<Diagnostic>,
}

/// Runs the validate command.
pub fn run(
    path: &Path,
    now: DateTime<Utc>,
    ideal_sets: Option<u32>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = evaluate(path, now, ideal_sets)?;
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

fn evaluate(
    path: &Path,
    now: DateTime<Utc>,
    ideal_sets: Option<u32>,
) -> Result<ValidateResult, Box<dyn std::error::Error>> {
    let snapshot = PracticeSnapshot::from_json(&fs::read_to_string(path)?)?;
    let mut context = ValidationContext::new(now);
    if let Some(ideal) = ideal_sets {
        context = context.with_settings(ClubSettings {
            club_id: snapshot.practice.club_id,
            ideal_sets_per_dog: ideal,
        });
    }

    let diagnostics = validate(&snapshot, &context);
    Ok(ValidateResult {
        path: path.display().to_string(),
        now,
        summary: DiagnosticSummary::from_diagnostics(&diagnostics),
        diagnostics,
    })
}

fn print_text_output(result: &ValidateResult) {
    println!("SetPlan Practice Validation");
    println!("===========================");
    println!();
    println!("Snapshot: {}", result.path);
    println!("As of:    {}", result.now.to_rfc3339());
    println!();
    if result.diagnostics.is_empty() {
        println!("No findings.");
    } else {
        for diagnostic in &result.diagnostics {
            println!("  {diagnostic}");
        }
    }
    println!();
    println!(
        "Summary: {} errors, {} warnings, {} infos",
        result.summary.errors, result.summary.warnings, result.summary.infos
    );
}
