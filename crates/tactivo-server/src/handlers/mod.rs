//! HTTP handler modules for the tactivo API.
//!
//! Each sub-module implements thin handlers that parse path keys, acquire the
//! service lock, delegate to [`ProgramService`](crate::service::ProgramService)
//! and return JSON responses. Placement batches are run after the lock is
//! released, through [`finish_batch`].

pub mod catalog;
pub mod drag;
pub mod exercises;
pub mod notifications;
pub mod programs;

use axum::Json;

use tactivo_core::{ClientId, Day, ProgramKey, RowKey};

use crate::error::ApiError;
use crate::persist::{self, PersistBatch};
use crate::schema::common::{MutationResponse, ProgramView};
use crate::state::AppState;

pub(crate) fn parse_program(raw: &str) -> Result<ProgramKey, ApiError> {
    Ok(raw.parse::<ProgramKey>()?)
}

pub(crate) fn parse_row(raw: &str) -> Result<RowKey, ApiError> {
    Ok(raw.parse::<RowKey>()?)
}

pub(crate) fn parse_day(raw: &str) -> Result<Day, ApiError> {
    Ok(raw.parse::<Day>()?)
}

pub(crate) async fn program_view(
    state: &AppState,
    client: ClientId,
    key: ProgramKey,
) -> Result<ProgramView, ApiError> {
    let service = state.service.lock().await;
    Ok(ProgramView::from(service.program(client, key)?))
}

/// Runs a placement batch and renders the program afterwards.
pub(crate) async fn finish_batch(
    state: &AppState,
    batch: PersistBatch,
) -> Result<Json<MutationResponse>, ApiError> {
    let (client, key) = (batch.client, batch.program);
    let persistence = persist::run(state, batch).await;
    let program = program_view(state, client, key).await?;
    Ok(Json(MutationResponse {
        program,
        persistence,
    }))
}
