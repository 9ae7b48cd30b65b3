//! In-memory implementation of [`ProgramStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests and ephemeral
//! sessions. It keeps every table in ordered maps with the same semantics as
//! the SQLite backend, and can be told to reject writes to specific rows so
//! partial batch failures can be exercised.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use tactivo_core::{
    ClientId, CompanyId, ExerciseId, ExerciseRef, Placement, ProgramId, RowId, WorkoutParams,
};

use crate::error::StorageError;
use crate::traits::ProgramStore;
use crate::types::{
    ExerciseRecord, NewExercise, NewProgram, NewRow, ProgramRecord, RowPatch, StoredRow,
};

/// Data stored for a single program-exercise row.
#[derive(Debug, Clone)]
struct RawRow {
    program: ProgramId,
    exercise: ExerciseId,
    placement: Placement,
    params: WorkoutParams,
}

#[derive(Debug, Default)]
struct Tables {
    exercises: BTreeMap<ExerciseId, ExerciseRecord>,
    programs: BTreeMap<ProgramId, ProgramRecord>,
    rows: BTreeMap<RowId, RawRow>,
    next_exercise: i64,
    next_program: i64,
    next_row: i64,
    /// Rows whose writes fail, with the reason reported.
    rejected: HashMap<RowId, String>,
    /// When set, every row insert fails with this reason.
    rejected_inserts: Option<String>,
    /// Every accepted placement write, in arrival order.
    placement_writes: Vec<(RowId, Placement)>,
}

impl Tables {
    fn joined(&self, id: RowId, raw: &RawRow) -> StoredRow {
        let exercise = self
            .exercises
            .get(&raw.exercise)
            .map(ExerciseRecord::to_ref)
            .unwrap_or_else(|| ExerciseRef::bare(raw.exercise));
        StoredRow {
            id,
            program: raw.program,
            exercise,
            placement: raw.placement,
            params: raw.params.clone(),
        }
    }

    fn check_writable(&self, row: RowId) -> Result<(), StorageError> {
        if let Some(reason) = self.rejected.get(&row) {
            return Err(StorageError::Rejected {
                row: row.0,
                reason: reason.clone(),
            });
        }
        if !self.rows.contains_key(&row) {
            return Err(StorageError::RowNotFound(row.0));
        }
        Ok(())
    }
}

/// In-memory implementation of [`ProgramStore`].
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every subsequent write to `row` fail with `reason`.
    pub fn reject_row(&self, row: RowId, reason: impl Into<String>) {
        self.tables().rejected.insert(row, reason.into());
    }

    /// Lifts a rejection installed by [`reject_row`](Self::reject_row).
    pub fn accept_row(&self, row: RowId) {
        self.tables().rejected.remove(&row);
    }

    /// Makes every subsequent row insert fail with `reason`.
    pub fn reject_inserts(&self, reason: impl Into<String>) {
        self.tables().rejected_inserts = Some(reason.into());
    }

    pub fn accept_inserts(&self) {
        self.tables().rejected_inserts = None;
    }

    /// Accepted placement writes, oldest first.
    pub fn placement_writes(&self) -> Vec<(RowId, Placement)> {
        self.tables().placement_writes.clone()
    }

    /// Stored placement of a row, if it exists.
    pub fn placement_of(&self, row: RowId) -> Option<Placement> {
        self.tables().rows.get(&row).map(|raw| raw.placement)
    }
}

#[async_trait]
impl ProgramStore for InMemoryStore {
    async fn insert_exercise(&self, exercise: NewExercise) -> Result<ExerciseRecord, StorageError> {
        let mut tables = self.tables();
        tables.next_exercise += 1;
        let record = ExerciseRecord {
            id: ExerciseId(tables.next_exercise),
            company: exercise.company,
            name: exercise.name,
            description: exercise.description,
            file: exercise.file,
        };
        tables.exercises.insert(record.id, record.clone());
        Ok(record)
    }

    async fn list_exercises(&self, company: CompanyId) -> Result<Vec<ExerciseRecord>, StorageError> {
        let mut list: Vec<ExerciseRecord> = self
            .tables()
            .exercises
            .values()
            .filter(|e| e.company == company)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<ExerciseRecord>, StorageError> {
        Ok(self.tables().exercises.get(&id).cloned())
    }

    async fn insert_program(&self, program: NewProgram) -> Result<ProgramRecord, StorageError> {
        let mut tables = self.tables();
        tables.next_program += 1;
        let record = ProgramRecord {
            id: ProgramId(tables.next_program),
            client: program.client,
            name: program.name,
            description: program.description,
        };
        tables.programs.insert(record.id, record.clone());
        Ok(record)
    }

    async fn update_program(&self, program: &ProgramRecord) -> Result<(), StorageError> {
        let mut tables = self.tables();
        let stored = tables
            .programs
            .get_mut(&program.id)
            .ok_or(StorageError::ProgramNotFound(program.id.0))?;
        stored.name = program.name.clone();
        stored.description = program.description.clone();
        Ok(())
    }

    async fn delete_programs(&self, ids: &[ProgramId]) -> Result<(), StorageError> {
        let mut tables = self.tables();
        for id in ids {
            tables.programs.remove(id);
        }
        tables.rows.retain(|_, raw| !ids.contains(&raw.program));
        Ok(())
    }

    async fn list_programs(&self, client: ClientId) -> Result<Vec<ProgramRecord>, StorageError> {
        Ok(self
            .tables()
            .programs
            .values()
            .filter(|p| p.client == client)
            .cloned()
            .collect())
    }

    async fn select_rows(&self, programs: &[ProgramId]) -> Result<Vec<StoredRow>, StorageError> {
        let tables = self.tables();
        let mut rows: Vec<StoredRow> = tables
            .rows
            .iter()
            .filter(|(_, raw)| programs.contains(&raw.program))
            .map(|(id, raw)| tables.joined(*id, raw))
            .collect();
        rows.sort_by_key(|r| (r.program, r.placement, r.id));
        Ok(rows)
    }

    async fn insert_rows(&self, rows: Vec<NewRow>) -> Result<Vec<StoredRow>, StorageError> {
        let mut tables = self.tables();
        if let Some(missing) = rows.iter().find(|r| !tables.programs.contains_key(&r.program)) {
            return Err(StorageError::ProgramNotFound(missing.program.0));
        }
        if let (Some(reason), Some(first)) = (&tables.rejected_inserts, rows.first()) {
            return Err(StorageError::InsertRejected {
                program: first.program.0,
                reason: reason.clone(),
            });
        }
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            tables.next_row += 1;
            let id = RowId(tables.next_row);
            let raw = RawRow {
                program: row.program,
                exercise: row.exercise,
                placement: row.placement,
                params: row.params,
            };
            stored.push(tables.joined(id, &raw));
            tables.rows.insert(id, raw);
        }
        Ok(stored)
    }

    async fn update_placement(&self, row: RowId, placement: Placement) -> Result<(), StorageError> {
        let mut tables = self.tables();
        tables.check_writable(row)?;
        if let Some(raw) = tables.rows.get_mut(&row) {
            raw.placement = placement;
        }
        tables.placement_writes.push((row, placement));
        Ok(())
    }

    async fn update_row(&self, row: RowId, patch: RowPatch) -> Result<(), StorageError> {
        let mut tables = self.tables();
        tables.check_writable(row)?;
        if let Some(raw) = tables.rows.get_mut(&row) {
            raw.exercise = patch.exercise;
            raw.placement = patch.placement;
            raw.params = patch.params;
        }
        Ok(())
    }

    async fn delete_rows(&self, ids: &[RowId]) -> Result<(), StorageError> {
        let mut tables = self.tables();
        for id in ids {
            tables.rows.remove(id);
        }
        Ok(())
    }
}
