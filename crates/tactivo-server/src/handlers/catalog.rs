//! Exercise catalog handlers.

use axum::extract::{Path, State};
use axum::Json;

use tactivo_core::CompanyId;
use tactivo_storage::{ExerciseRecord, NewExercise};

use crate::error::ApiError;
use crate::schema::catalog::{CreateExerciseRequest, ExerciseListResponse};
use crate::state::AppState;

/// `GET /companies/{company}/exercises`
pub async fn list_exercises(
    State(state): State<AppState>,
    Path(company): Path<i64>,
) -> Result<Json<ExerciseListResponse>, ApiError> {
    let exercises = state.store.list_exercises(CompanyId(company)).await?;
    Ok(Json(ExerciseListResponse { exercises }))
}

/// `POST /companies/{company}/exercises`
pub async fn create_exercise(
    State(state): State<AppState>,
    Path(company): Path<i64>,
    Json(req): Json<CreateExerciseRequest>,
) -> Result<Json<ExerciseRecord>, ApiError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("exercise name must not be blank".into()));
    }
    let record = state
        .store
        .insert_exercise(NewExercise {
            company: CompanyId(company),
            name: name.to_string(),
            description: req.description,
            file: req.file,
        })
        .await?;
    Ok(Json(record))
}
