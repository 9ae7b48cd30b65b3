//! Storage error types for tactivo-storage.
//!
//! [`StorageError`] covers the failure modes of the row store: backend
//! errors, missing entities, rejected row writes and corrupt stored data.

use thiserror::Error;

/// Errors produced by storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The SQLite backend reported an error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Applying schema migrations failed.
    #[error("migration error: {0}")]
    Migration(String),

    /// A program with the given ID was not found.
    #[error("program not found: {0}")]
    ProgramNotFound(i64),

    /// A program-exercise row with the given ID was not found.
    #[error("row not found: {0}")]
    RowNotFound(i64),

    /// A catalog exercise with the given ID was not found.
    #[error("exercise not found: {0}")]
    ExerciseNotFound(i64),

    /// The backend refused a row write.
    #[error("row {row} rejected: {reason}")]
    Rejected { row: i64, reason: String },

    /// The backend refused to insert rows into a program.
    #[error("rows for program {program} rejected: {reason}")]
    InsertRejected { program: i64, reason: String },

    /// Stored data could not be mapped back onto the domain model.
    #[error("integrity error: {reason}")]
    IntegrityError { reason: String },
}
