//! SQLite implementation of [`ProgramStore`].
//!
//! [`SqliteStore`] keeps one connection behind a mutex; each trait call locks
//! it, runs its statements and releases it before returning. Day labels are
//! stored as their letter, positions as integers.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use tactivo_core::{
    ClientId, CompanyId, Day, ExerciseId, ExerciseRef, Placement, ProgramId, RowId, WorkoutParams,
};

use crate::error::StorageError;
use crate::traits::ProgramStore;
use crate::types::{
    ExerciseRecord, NewExercise, NewProgram, NewRow, ProgramRecord, RowPatch, StoredRow,
};

const SELECT_ROWS: &str = "SELECT pe.id, pe.program_id, pe.exercise_id, pe.day, pe.position,
        pe.sets, pe.reps, pe.weight, pe.secs, pe.notes, e.name, e.description, e.file
     FROM program_exercises pe
     LEFT JOIN exercises e ON e.id = pe.exercise_id";

/// Columns of a joined row as read from SQLite, before domain validation.
struct SqlRow {
    id: i64,
    program: i64,
    exercise: i64,
    day: String,
    position: i64,
    sets: Option<i32>,
    reps: Option<i32>,
    weight: Option<f64>,
    secs: Option<i32>,
    notes: Option<String>,
    name: Option<String>,
    description: Option<String>,
    file: Option<String>,
}

impl SqlRow {
    fn read(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(SqlRow {
            id: row.get(0)?,
            program: row.get(1)?,
            exercise: row.get(2)?,
            day: row.get(3)?,
            position: row.get(4)?,
            sets: row.get(5)?,
            reps: row.get(6)?,
            weight: row.get(7)?,
            secs: row.get(8)?,
            notes: row.get(9)?,
            name: row.get(10)?,
            description: row.get(11)?,
            file: row.get(12)?,
        })
    }

    fn into_stored(self) -> Result<StoredRow, StorageError> {
        let day: Day = self.day.parse().map_err(|e| StorageError::IntegrityError {
            reason: format!("row {}: {}", self.id, e),
        })?;
        let position = u32::try_from(self.position).map_err(|_| StorageError::IntegrityError {
            reason: format!("row {}: negative position {}", self.id, self.position),
        })?;
        Ok(StoredRow {
            id: RowId(self.id),
            program: ProgramId(self.program),
            exercise: ExerciseRef {
                id: ExerciseId(self.exercise),
                name: self.name,
                description: self.description,
                file: self.file,
            },
            placement: Placement::new(day, position),
            params: WorkoutParams {
                sets: self.sets,
                reps: self.reps,
                weight: self.weight,
                secs: self.secs,
                notes: self.notes,
            },
        })
    }
}

fn read_exercise(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExerciseRecord> {
    Ok(ExerciseRecord {
        id: ExerciseId(row.get(0)?),
        company: CompanyId(row.get(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
        file: row.get(4)?,
    })
}

fn read_program(row: &rusqlite::Row<'_>) -> rusqlite::Result<ProgramRecord> {
    Ok(ProgramRecord {
        id: ProgramId(row.get(0)?),
        client: ClientId(row.get(1)?),
        name: row.get(2)?,
        description: row.get(3)?,
    })
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// SQLite-backed implementation of [`ProgramStore`].
///
/// Multi-row inserts run in a transaction; every other write touches one
/// statement. Foreign keys cascade program deletes onto their rows.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        tracing::info!(path, "opened program database");
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Verifies a program exists, returning an error if not.
    fn assert_program_exists(conn: &Connection, id: ProgramId) -> Result<(), StorageError> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM programs WHERE id = ?1)",
            params![id.0],
            |row| row.get(0),
        )?;
        if !exists {
            return Err(StorageError::ProgramNotFound(id.0));
        }
        Ok(())
    }

    fn select_row(conn: &Connection, id: i64) -> Result<StoredRow, StorageError> {
        let sql = format!("{} WHERE pe.id = ?1", SELECT_ROWS);
        let raw = conn
            .query_row(&sql, params![id], SqlRow::read)
            .optional()?
            .ok_or(StorageError::RowNotFound(id))?;
        raw.into_stored()
    }
}

#[async_trait]
impl ProgramStore for SqliteStore {
    async fn insert_exercise(&self, exercise: NewExercise) -> Result<ExerciseRecord, StorageError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO exercises (company_id, name, description, file) VALUES (?1, ?2, ?3, ?4)",
            params![
                exercise.company.0,
                exercise.name,
                exercise.description,
                exercise.file
            ],
        )?;
        Ok(ExerciseRecord {
            id: ExerciseId(conn.last_insert_rowid()),
            company: exercise.company,
            name: exercise.name,
            description: exercise.description,
            file: exercise.file,
        })
    }

    async fn list_exercises(&self, company: CompanyId) -> Result<Vec<ExerciseRecord>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, company_id, name, description, file FROM exercises
             WHERE company_id = ?1 ORDER BY name, id",
        )?;
        let list = stmt
            .query_map(params![company.0], read_exercise)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(list)
    }

    async fn get_exercise(&self, id: ExerciseId) -> Result<Option<ExerciseRecord>, StorageError> {
        let conn = self.conn();
        let record = conn
            .query_row(
                "SELECT id, company_id, name, description, file FROM exercises WHERE id = ?1",
                params![id.0],
                read_exercise,
            )
            .optional()?;
        Ok(record)
    }

    async fn insert_program(&self, program: NewProgram) -> Result<ProgramRecord, StorageError> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO programs (client_id, name, description) VALUES (?1, ?2, ?3)",
            params![program.client.0, program.name, program.description],
        )?;
        Ok(ProgramRecord {
            id: ProgramId(conn.last_insert_rowid()),
            client: program.client,
            name: program.name,
            description: program.description,
        })
    }

    async fn update_program(&self, program: &ProgramRecord) -> Result<(), StorageError> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE programs SET name = ?2, description = ?3 WHERE id = ?1",
            params![program.id.0, program.name, program.description],
        )?;
        if changed == 0 {
            return Err(StorageError::ProgramNotFound(program.id.0));
        }
        Ok(())
    }

    async fn delete_programs(&self, ids: &[ProgramId]) -> Result<(), StorageError> {
        if ids.is_empty() {
            return Ok(());
        }
        let conn = self.conn();
        let sql = format!("DELETE FROM programs WHERE id IN ({})", placeholders(ids.len()));
        conn.execute(&sql, params_from_iter(ids.iter().map(|id| id.0)))?;
        Ok(())
    }

    async fn list_programs(&self, client: ClientId) -> Result<Vec<ProgramRecord>, StorageError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, client_id, name, description FROM programs
             WHERE client_id = ?1 ORDER BY created_at, id",
        )?;
        let list = stmt
            .query_map(params![client.0], read_program)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(list)
    }

    async fn select_rows(&self, programs: &[ProgramId]) -> Result<Vec<StoredRow>, StorageError> {
        if programs.is_empty() {
            return Ok(Vec::new());
        }
        let conn = self.conn();
        let sql = format!(
            "{} WHERE pe.program_id IN ({}) ORDER BY pe.program_id, pe.day, pe.position, pe.id",
            SELECT_ROWS,
            placeholders(programs.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let raw = stmt
            .query_map(params_from_iter(programs.iter().map(|p| p.0)), SqlRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        raw.into_iter().map(SqlRow::into_stored).collect()
    }

    async fn insert_rows(&self, rows: Vec<NewRow>) -> Result<Vec<StoredRow>, StorageError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in &rows {
            Self::assert_program_exists(&tx, row.program)?;
            tx.execute(
                "INSERT INTO program_exercises
                    (program_id, exercise_id, day, position, sets, reps, weight, secs, notes)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    row.program.0,
                    row.exercise.0,
                    row.placement.day.to_string(),
                    row.placement.position,
                    row.params.sets,
                    row.params.reps,
                    row.params.weight,
                    row.params.secs,
                    row.params.notes,
                ],
            )?;
            ids.push(tx.last_insert_rowid());
        }
        let stored = ids
            .into_iter()
            .map(|id| Self::select_row(&tx, id))
            .collect::<Result<Vec<_>, _>>()?;
        tx.commit()?;
        Ok(stored)
    }

    async fn update_placement(&self, row: RowId, placement: Placement) -> Result<(), StorageError> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE program_exercises SET day = ?2, position = ?3 WHERE id = ?1",
            params![row.0, placement.day.to_string(), placement.position],
        )?;
        if changed == 0 {
            return Err(StorageError::RowNotFound(row.0));
        }
        Ok(())
    }

    async fn update_row(&self, row: RowId, patch: RowPatch) -> Result<(), StorageError> {
        let conn = self.conn();
        let changed = conn.execute(
            "UPDATE program_exercises
             SET exercise_id = ?2, day = ?3, position = ?4,
                 sets = ?5, reps = ?6, weight = ?7, secs = ?8, notes = ?9
             WHERE id = ?1",
            params![
                row.0,
                patch.exercise.0,
                patch.placement.day.to_string(),
                patch.placement.position,
                patch.params.sets,
                patch.params.reps,
                patch.params.weight,
                patch.params.secs,
                patch.params.notes,
            ],
        )?;
        if changed == 0 {
            return Err(StorageError::RowNotFound(row.0));
        }
        Ok(())
    }

    async fn delete_rows(&self, ids: &[RowId]) -> Result<(), StorageError> {
        if ids.is_empty() {
            return Ok(());
        }
        let conn = self.conn();
        let sql = format!(
            "DELETE FROM program_exercises WHERE id IN ({})",
            placeholders(ids.len())
        );
        conn.execute(&sql, params_from_iter(ids.iter().map(|id| id.0)))?;
        Ok(())
    }
}
