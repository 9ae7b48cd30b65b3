//! Drag session handlers.
//!
//! Start, hover and status only touch the drag sessions. Drop applies the
//! released intent through the service and runs its placement batch.

use axum::extract::{Path, State};
use axum::Json;

use tactivo_core::{ClientId, HoverTarget};

use super::{parse_program, program_view};
use crate::drag::DragStatus;
use crate::error::ApiError;
use crate::persist;
use crate::schema::drag::{DropResponse, StartDragRequest, StartDragResponse};
use crate::state::AppState;

/// `POST /clients/{client}/programs/{program}/drag/start`
pub async fn start(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
    Json(req): Json<StartDragRequest>,
) -> Result<Json<StartDragResponse>, ApiError> {
    let client = ClientId(client);
    let key = parse_program(&program)?;
    let layout = state.service.lock().await.board_layout(client, key)?;
    let start = match req {
        StartDragRequest::Exercise { key: row } => {
            state.drags.start_exercise(client, key, row, layout)?
        }
        StartDragRequest::DayColumn { day } => {
            state.drags.start_day_column(client, key, day, layout)?
        }
    };
    Ok(Json(StartDragResponse {
        start,
        status: state.drags.status(client, key),
    }))
}

/// Queues a hover; the frame pump resolves it on the next tick.
///
/// `POST /clients/{client}/programs/{program}/drag/hover`
pub async fn hover(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
    Json(target): Json<HoverTarget>,
) -> Result<Json<DragStatus>, ApiError> {
    let client = ClientId(client);
    let key = parse_program(&program)?;
    state.drags.hover(client, key, target)?;
    Ok(Json(state.drags.status(client, key)))
}

/// `GET /clients/{client}/programs/{program}/drag`
pub async fn status(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
) -> Result<Json<DragStatus>, ApiError> {
    let key = parse_program(&program)?;
    Ok(Json(state.drags.status(ClientId(client), key)))
}

/// Ends the drag and applies the resulting move, if any.
///
/// `POST /clients/{client}/programs/{program}/drag/drop`
pub async fn drop_dragged(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
) -> Result<Json<DropResponse>, ApiError> {
    let client = ClientId(client);
    let key = parse_program(&program)?;
    let Some(intent) = state.drags.finish(client, key) else {
        return Ok(Json(DropResponse {
            intent: None,
            program: program_view(&state, client, key).await?,
            persistence: None,
        }));
    };

    tracing::debug!(%client, program = %key, ?intent, "drop");
    let batch = state.service.lock().await.apply_move(client, key, &intent)?;
    let persistence = persist::run(&state, batch).await;
    Ok(Json(DropResponse {
        intent: Some(intent),
        program: program_view(&state, client, key).await?,
        persistence: Some(persistence),
    }))
}

/// `POST /clients/{client}/programs/{program}/drag/cancel`
pub async fn cancel(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
) -> Result<Json<DragStatus>, ApiError> {
    let client = ClientId(client);
    let key = parse_program(&program)?;
    state.drags.cancel(client, key);
    Ok(Json(state.drags.status(client, key)))
}
