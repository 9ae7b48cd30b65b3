//! The [`ProgramStore`] trait defining the remote row store contract.
//!
//! Every method writes or reads independently: there is no transaction
//! spanning several rows, and a batch of `update_placement` calls may
//! partially succeed. Callers run updates concurrently and settle each
//! result on its own.

use async_trait::async_trait;

use tactivo_core::{ClientId, CompanyId, ExerciseId, Placement, ProgramId, RowId};

use crate::error::StorageError;
use crate::types::{
    ExerciseRecord, NewExercise, NewProgram, NewRow, ProgramRecord, RowPatch, StoredRow,
};

/// The storage contract for programs and their exercise rows.
///
/// Implementations are shared across tasks as `Arc<dyn ProgramStore>`.
#[async_trait]
pub trait ProgramStore: Send + Sync {
    // -------------------------------------------------------------------
    // Exercise catalog (read-only for the domain)
    // -------------------------------------------------------------------

    /// Adds a catalog entry. Used for seeding.
    async fn insert_exercise(&self, exercise: NewExercise) -> Result<ExerciseRecord, StorageError>;

    /// Lists the catalog of a company, ordered by name.
    async fn list_exercises(&self, company: CompanyId) -> Result<Vec<ExerciseRecord>, StorageError>;

    /// Fetches a single catalog entry.
    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<ExerciseRecord>, StorageError>;

    // -------------------------------------------------------------------
    // Program table
    // -------------------------------------------------------------------

    async fn insert_program(&self, program: NewProgram) -> Result<ProgramRecord, StorageError>;

    /// Rewrites name and description of an existing program.
    async fn update_program(&self, program: &ProgramRecord) -> Result<(), StorageError>;

    /// Deletes programs and, with them, their rows. Unknown ids are ignored.
    async fn delete_programs(&self, ids: &[ProgramId]) -> Result<(), StorageError>;

    /// Programs of a client, oldest first.
    async fn list_programs(&self, client: ClientId) -> Result<Vec<ProgramRecord>, StorageError>;

    // -------------------------------------------------------------------
    // Program-exercise rows
    // -------------------------------------------------------------------

    /// Rows of the given programs ordered by program, day and position.
    async fn select_rows(&self, programs: &[ProgramId]) -> Result<Vec<StoredRow>, StorageError>;

    /// Inserts rows and returns them in input order with their new ids.
    async fn insert_rows(&self, rows: Vec<NewRow>) -> Result<Vec<StoredRow>, StorageError>;

    /// Writes only the day and position of a row.
    async fn update_placement(&self, row: RowId, placement: Placement) -> Result<(), StorageError>;

    /// Rewrites every mutable column of a row.
    async fn update_row(&self, row: RowId, patch: RowPatch) -> Result<(), StorageError>;

    /// Deletes rows. Unknown ids are ignored.
    async fn delete_rows(&self, ids: &[RowId]) -> Result<(), StorageError>;
}
