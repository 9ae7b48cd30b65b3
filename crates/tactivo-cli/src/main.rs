//! Tactivo command-line tools.
//!
//! Provides the `tactivo` binary with two subcommands:
//!
//! - `normalize` runs the day/position reconciler over a program stored as
//!   JSON and prints the result, together with the placement updates a
//!   store would need.
//! - `list` prints the programs of a client from a SQLite database.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;

use tactivo_core::{ClientId, PlacementChange, Program, ProgramKey};
use tactivo_storage::{ProgramStore, SqliteStore, StoredRow};

/// Tactivo program tools.
#[derive(Parser)]
#[command(name = "tactivo", about = "Tactivo training program tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize days and positions of a program read from JSON.
    Normalize {
        /// Path to the program JSON file.
        #[arg(short, long)]
        input: PathBuf,

        /// Print compact JSON instead of pretty-printed.
        #[arg(long)]
        compact: bool,
    },
    /// List a client's stored programs.
    List {
        /// Path to the program database file.
        #[arg(short, long)]
        db: String,

        /// Client whose programs are listed.
        #[arg(short, long)]
        client: i64,
    },
}

#[derive(Serialize)]
struct NormalizeOutput {
    program: Program,
    changes: Vec<PlacementChange>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Normalize { input, compact } => run_normalize(&input, compact),
        Commands::List { db, client } => run_list(&db, ClientId(client)).await,
    };
    process::exit(exit_code);
}

/// Returns exit code: 0 = success, 1 = invalid program, 3 = I/O error.
fn run_normalize(input: &Path, compact: bool) -> i32 {
    let raw = match std::fs::read_to_string(input) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error: failed to read '{}': {}", input.display(), e);
            return 3;
        }
    };
    let mut program: Program = match serde_json::from_str(&raw) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: '{}' is not a valid program: {}", input.display(), e);
            return 1;
        }
    };

    let changes = program.normalize();
    if let Err(e) = program.check_invariants() {
        eprintln!("Error: {}", e);
        return 1;
    }

    print_json(&NormalizeOutput { program, changes }, compact);
    0
}

/// Returns exit code: 0 = success, 3 = storage error.
async fn run_list(db_path: &str, client: ClientId) -> i32 {
    let store = match SqliteStore::new(db_path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: failed to open database '{}': {}", db_path, e);
            return 3;
        }
    };

    let records = match store.list_programs(client).await {
        Ok(records) => records,
        Err(e) => {
            eprintln!("Error: failed to list programs of client {}: {}", client, e);
            return 3;
        }
    };
    let ids: Vec<_> = records.iter().map(|r| r.id).collect();
    let rows = match store.select_rows(&ids).await {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error: failed to read program rows: {}", e);
            return 3;
        }
    };

    let programs: Vec<Program> = records
        .into_iter()
        .map(|record| {
            let own: Vec<_> = rows
                .iter()
                .filter(|row| row.program == record.id)
                .cloned()
                .map(StoredRow::into_program_exercise)
                .collect();
            Program::hydrate(
                ProgramKey::Persisted(record.id),
                record.name,
                record.description,
                own,
            )
        })
        .collect();

    print_json(&programs, false);
    0
}

fn print_json<T: Serialize>(value: &T, compact: bool) {
    let rendered = if compact {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    match rendered {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Error: failed to serialize output: {}", e),
    }
}
