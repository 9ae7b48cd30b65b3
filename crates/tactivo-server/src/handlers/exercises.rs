//! Row and day handlers. Every edit that can shift placements returns the
//! settled result of its placement batch.

use axum::extract::{Path, State};
use axum::Json;

use tactivo_core::{ClientId, WorkoutParams};

use super::{finish_batch, parse_day, parse_program, parse_row, program_view};
use crate::error::ApiError;
use crate::persist;
use crate::schema::common::{ExerciseView, MutationResponse};
use crate::schema::programs::{
    AddDayResponse, AddExercisesRequest, AddExercisesResponse, MoveExerciseRequest,
    UpdatePositionsRequest,
};
use crate::state::AppState;

/// Appends catalog exercises to a day.
///
/// `POST /clients/{client}/programs/{program}/exercises`
pub async fn add_exercises(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
    Json(req): Json<AddExercisesRequest>,
) -> Result<Json<AddExercisesResponse>, ApiError> {
    let client = ClientId(client);
    let key = parse_program(&program)?;
    if req.exercise_ids.is_empty() {
        return Err(ApiError::BadRequest("exercise_ids must not be empty".into()));
    }
    let (added, batch) = state
        .service
        .lock()
        .await
        .add_exercises(client, key, &req.exercise_ids, req.day)
        .await?;
    let persistence = persist::run(&state, batch).await;
    Ok(Json(AddExercisesResponse {
        added,
        program: program_view(&state, client, key).await?,
        persistence,
    }))
}

/// `DELETE /clients/{client}/programs/{program}/exercises/{row}`
pub async fn remove_exercise(
    State(state): State<AppState>,
    Path((client, program, row)): Path<(i64, String, String)>,
) -> Result<Json<MutationResponse>, ApiError> {
    let key = parse_program(&program)?;
    let row = parse_row(&row)?;
    let batch = state
        .service
        .lock()
        .await
        .remove_exercise(ClientId(client), key, row)
        .await?;
    finish_batch(&state, batch).await
}

/// Replaces a row's sets/reps/weight/secs/notes. Saved with the program.
///
/// `PATCH /clients/{client}/programs/{program}/exercises/{row}`
pub async fn update_params(
    State(state): State<AppState>,
    Path((client, program, row)): Path<(i64, String, String)>,
    Json(params): Json<WorkoutParams>,
) -> Result<Json<ExerciseView>, ApiError> {
    let key = parse_program(&program)?;
    let row = parse_row(&row)?;
    let mut service = state.service.lock().await;
    let updated = service.update_params(ClientId(client), key, row, params)?;
    Ok(Json(ExerciseView::from(updated)))
}

/// Swaps a row with its neighbour within the same day.
///
/// `POST /clients/{client}/programs/{program}/exercises/{row}/move`
pub async fn move_exercise(
    State(state): State<AppState>,
    Path((client, program, row)): Path<(i64, String, String)>,
    Json(req): Json<MoveExerciseRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let key = parse_program(&program)?;
    let row = parse_row(&row)?;
    let batch = state
        .service
        .lock()
        .await
        .move_exercise(ClientId(client), key, row, req.direction)?;
    finish_batch(&state, batch).await
}

/// `POST /clients/{client}/programs/{program}/days`
pub async fn add_day(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
) -> Result<Json<AddDayResponse>, ApiError> {
    let client = ClientId(client);
    let key = parse_program(&program)?;
    let mut service = state.service.lock().await;
    let day = service.add_day(client, key)?;
    Ok(Json(AddDayResponse {
        day,
        program: service.program(client, key)?.into(),
    }))
}

/// `DELETE /clients/{client}/programs/{program}/days/{day}`
pub async fn delete_day(
    State(state): State<AppState>,
    Path((client, program, day)): Path<(i64, String, String)>,
) -> Result<Json<MutationResponse>, ApiError> {
    let key = parse_program(&program)?;
    let day = parse_day(&day)?;
    let batch = state
        .service
        .lock()
        .await
        .delete_day(ClientId(client), key, day)?;
    finish_batch(&state, batch).await
}

/// Renormalizes days and positions, optionally over a replacement row list.
///
/// `POST /clients/{client}/programs/{program}/positions`
pub async fn update_positions(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
    Json(req): Json<UpdatePositionsRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let key = parse_program(&program)?;
    let batch = state
        .service
        .lock()
        .await
        .update_positions(ClientId(client), key, req.exercises)?;
    finish_batch(&state, batch).await
}

/// Puts persisted rows back at their last confirmed placement.
///
/// `POST /clients/{client}/programs/{program}/revert`
pub async fn revert(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
) -> Result<Json<MutationResponse>, ApiError> {
    let key = parse_program(&program)?;
    let batch = state
        .service
        .lock()
        .await
        .revert_program(ClientId(client), key)?;
    finish_batch(&state, batch).await
}
