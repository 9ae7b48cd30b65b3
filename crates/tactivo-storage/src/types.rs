//! Stored record types and write payloads.
//!
//! Rows are flat: a program-exercise row carries its program, the catalog
//! exercise it points at, its placement and the workout parameters. Reads
//! join the catalog so callers get an [`ExerciseRef`] back.

use serde::{Deserialize, Serialize};

use tactivo_core::{
    ClientId, CompanyId, ExerciseId, ExerciseRef, Placement, ProgramExercise, ProgramId, RowId,
    WorkoutParams,
};

/// A catalog exercise owned by a company.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecord {
    pub id: ExerciseId,
    pub company: CompanyId,
    pub name: String,
    pub description: Option<String>,
    pub file: Option<String>,
}

impl ExerciseRecord {
    pub fn to_ref(&self) -> ExerciseRef {
        ExerciseRef {
            id: self.id,
            name: Some(self.name.clone()),
            description: self.description.clone(),
            file: self.file.clone(),
        }
    }
}

/// Payload for seeding the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewExercise {
    pub company: CompanyId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
}

/// A stored program header.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramRecord {
    pub id: ProgramId,
    pub client: ClientId,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProgram {
    pub client: ClientId,
    pub name: String,
    pub description: Option<String>,
}

/// A stored program-exercise row joined with its catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRow {
    pub id: RowId,
    pub program: ProgramId,
    pub exercise: ExerciseRef,
    pub placement: Placement,
    pub params: WorkoutParams,
}

impl StoredRow {
    /// The row as a confirmed in-memory assignment.
    pub fn into_program_exercise(self) -> ProgramExercise {
        ProgramExercise::from_stored(self.id, self.exercise, self.placement, self.params)
    }
}

/// Payload for inserting a program-exercise row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRow {
    pub program: ProgramId,
    pub exercise: ExerciseId,
    pub placement: Placement,
    pub params: WorkoutParams,
}

impl NewRow {
    pub fn from_program_exercise(program: ProgramId, pe: &ProgramExercise) -> Self {
        NewRow {
            program,
            exercise: pe.exercise.id,
            placement: pe.placement,
            params: pe.params.clone(),
        }
    }
}

/// Full rewrite of a row's mutable columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowPatch {
    pub exercise: ExerciseId,
    pub placement: Placement,
    pub params: WorkoutParams,
}
