//! Program and exercise edit request/response types.

use serde::{Deserialize, Serialize};

use tactivo_core::{CompanyId, Day, ExerciseId, ProgramExercise, ProgramKey, RowKey};

use super::common::ProgramView;
use crate::persist::SettleReport;

/// Request to load a client's programs.
#[derive(Debug, Clone, Deserialize)]
pub struct LoadProgramsRequest {
    /// Company whose exercise catalog the programs draw from.
    pub company: CompanyId,
}

/// Partial update of a program header. Omitted fields are left unchanged;
/// an empty description clears it.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProgramRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AddExercisesRequest {
    pub exercise_ids: Vec<ExerciseId>,
    /// Target day, `A` when omitted.
    #[serde(default)]
    pub day: Day,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddExercisesResponse {
    pub added: Vec<RowKey>,
    pub program: ProgramView,
    pub persistence: SettleReport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    Up,
    Down,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MoveExerciseRequest {
    pub direction: MoveDirection,
}

/// Renormalize a program, optionally replacing its rows first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePositionsRequest {
    #[serde(default)]
    pub exercises: Option<Vec<ProgramExercise>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AddDayResponse {
    pub day: Day,
    pub program: ProgramView,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaveProgramResponse {
    /// The program key after saving; new programs get a persisted id.
    pub key: ProgramKey,
    pub program: ProgramView,
    pub has_pending_changes: bool,
}
