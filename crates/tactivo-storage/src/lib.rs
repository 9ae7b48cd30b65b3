//! Row store abstraction for tactivo programs.
//!
//! Provides the [`ProgramStore`] trait that stands in for the remote
//! program-exercise table, the program table and the read-only exercise
//! catalog, plus the [`InMemoryStore`] and [`SqliteStore`] backends.
//!
//! # Modules
//!
//! - [`error`]: StorageError enum with all failure modes
//! - [`types`]: stored record types and write payloads
//! - [`traits`]: ProgramStore trait definition
//! - [`memory`]: InMemoryStore implementation
//! - [`schema`]: migration setup for the SQLite backend
//! - [`sqlite`]: SqliteStore implementation

pub mod error;
pub mod memory;
pub mod schema;
pub mod sqlite;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic use.
pub use error::StorageError;
pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;
pub use traits::ProgramStore;
pub use types::{ExerciseRecord, NewExercise, NewProgram, NewRow, ProgramRecord, RowPatch, StoredRow};
