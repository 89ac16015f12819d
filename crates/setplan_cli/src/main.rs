//! SetPlan CLI
//!
//! Command-line tools for practice plans stored as JSON files.
//!
//! # Commands
//!
//! - `validate` - Run the validation rules on a practice snapshot
//! - `apply` - Apply a batch of set changes to a state file
//! - `delete` - Delete sets from a state file, compacting rounds
//! - `inspect` - Display practices, rounds and structural checks

mod commands;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use setplan_core::{PracticeId, SetId, UserId};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SetPlan command-line tools.
#[derive(Parser)]
#[command(name = "setplan")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the validation rules on a practice snapshot
    Validate {
        /// Practice snapshot file (JSON)
        #[arg(short, long)]
        snapshot: PathBuf,

        /// Evaluation instant (RFC 3339), defaults to the current time
        #[arg(short, long)]
        now: Option<DateTime<Utc>>,

        /// Club's ideal number of sets per dog
        #[arg(long)]
        ideal_sets: Option<u32>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Apply a batch of set changes to a state file
    Apply {
        /// Store state file (JSON)
        #[arg(short, long)]
        state: PathBuf,

        /// Batch file: a JSON array of set deltas
        #[arg(short, long)]
        batch: PathBuf,

        /// Act as this user (defaults to the practice planner)
        #[arg(long = "as")]
        user: Option<UserId>,

        /// Validate the batch without writing the state back
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Delete sets from a state file, compacting rounds
    Delete {
        /// Store state file (JSON)
        #[arg(short, long)]
        state: PathBuf,

        /// Sets to delete
        #[arg(short, long, num_args = 1.., required = true)]
        ids: Vec<SetId>,

        /// Act as this user (defaults to the practice planner)
        #[arg(long = "as")]
        user: Option<UserId>,

        /// Validate the deletion without writing the state back
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Display practices, rounds and structural checks
    Inspect {
        /// Store state file (JSON)
        #[arg(short, long)]
        state: PathBuf,

        /// Only show this practice
        #[arg(short, long)]
        practice: Option<PracticeId>,

        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Validate {
            snapshot,
            now,
            ideal_sets,
            format,
        } => {
            commands::validate::run(&snapshot, now.unwrap_or_else(Utc::now), ideal_sets, &format)?;
        }
        Commands::Apply {
            state,
            batch,
            user,
            dry_run,
        } => {
            commands::apply::run(&state, &batch, user, dry_run)?;
        }
        Commands::Delete {
            state,
            ids,
            user,
            dry_run,
        } => {
            commands::delete::run(&state, &ids, user, dry_run)?;
        }
        Commands::Inspect {
            state,
            practice,
            format,
        } => {
            commands::inspect::run(&state, practice, &format)?;
        }
        Commands::Version => {
            println!("SetPlan CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("SetPlan Core v{}", setplan_core::VERSION);
        }
    }

    Ok(())
}
