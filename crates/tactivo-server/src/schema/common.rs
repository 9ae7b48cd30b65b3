//! Views shared by several endpoints.
//!
//! Programs are rendered with their rows sorted by day and position, and each
//! row carries its sync state so clients can show unsaved or failed rows.

use serde::Serialize;

use tactivo_core::{
    ClientId, CompanyId, Day, ExerciseRef, Program, ProgramExercise, ProgramKey, RowKey,
    SyncState, WorkoutParams,
};

use crate::persist::SettleReport;
use crate::service::ClientPrograms;

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseView {
    pub key: RowKey,
    pub exercise: ExerciseRef,
    pub day: Day,
    pub position: u32,
    pub params: WorkoutParams,
    pub sync_state: SyncState,
}

impl From<&ProgramExercise> for ExerciseView {
    fn from(pe: &ProgramExercise) -> Self {
        ExerciseView {
            key: pe.key,
            exercise: pe.exercise.clone(),
            day: pe.placement.day,
            position: pe.placement.position,
            params: pe.params.clone(),
            sync_state: pe.sync_state(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgramView {
    pub key: ProgramKey,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub days: Vec<Day>,
    pub exercises: Vec<ExerciseView>,
}

impl From<&Program> for ProgramView {
    fn from(program: &Program) -> Self {
        let mut exercises: Vec<&ProgramExercise> = program.exercises.iter().collect();
        exercises.sort_by_key(|pe| pe.placement);
        ProgramView {
            key: program.key,
            name: program.name.clone(),
            description: program.description.clone(),
            days: program.days.clone(),
            exercises: exercises.into_iter().map(ExerciseView::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientProgramsResponse {
    pub client: ClientId,
    pub company: CompanyId,
    pub programs: Vec<ProgramView>,
    pub has_pending_changes: bool,
}

impl ClientProgramsResponse {
    pub fn new(client: ClientId, state: &ClientPrograms) -> Self {
        ClientProgramsResponse {
            client,
            company: state.company,
            programs: state.programs.iter().map(ProgramView::from).collect(),
            has_pending_changes: state.has_pending_changes(),
        }
    }
}

/// A program after an edit, plus what happened to its placement batch.
#[derive(Debug, Clone, Serialize)]
pub struct MutationResponse {
    pub program: ProgramView,
    pub persistence: SettleReport,
}
