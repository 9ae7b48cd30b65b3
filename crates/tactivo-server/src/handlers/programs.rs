//! Program handlers: load, list, add, update, delete, save and reset.

use axum::extract::{Path, State};
use axum::Json;

use tactivo_core::ClientId;

use super::{parse_program, program_view};
use crate::error::ApiError;
use crate::notify::{ToastKind, CHANGES_SAVED};
use crate::schema::common::{ClientProgramsResponse, ProgramView};
use crate::schema::programs::{LoadProgramsRequest, SaveProgramResponse, UpdateProgramRequest};
use crate::state::AppState;

/// Loads a client's programs from the store.
///
/// `POST /clients/{client}/programs/load`
pub async fn load_programs(
    State(state): State<AppState>,
    Path(client): Path<i64>,
    Json(req): Json<LoadProgramsRequest>,
) -> Result<Json<ClientProgramsResponse>, ApiError> {
    let client = ClientId(client);
    let mut service = state.service.lock().await;
    let programs = service.load_programs(client, req.company).await?;
    Ok(Json(ClientProgramsResponse::new(client, programs)))
}

/// `GET /clients/{client}/programs`
pub async fn list_programs(
    State(state): State<AppState>,
    Path(client): Path<i64>,
) -> Result<Json<ClientProgramsResponse>, ApiError> {
    let client = ClientId(client);
    let service = state.service.lock().await;
    Ok(Json(ClientProgramsResponse::new(client, service.client(client)?)))
}

/// Adds an unsaved program named after its position.
///
/// `POST /clients/{client}/programs`
pub async fn add_program(
    State(state): State<AppState>,
    Path(client): Path<i64>,
) -> Result<Json<ProgramView>, ApiError> {
    let mut service = state.service.lock().await;
    let program = service.add_program(ClientId(client))?;
    Ok(Json(ProgramView::from(program)))
}

/// Renames a program and/or changes its description.
///
/// `PATCH /clients/{client}/programs/{program}`
pub async fn update_program(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
    Json(req): Json<UpdateProgramRequest>,
) -> Result<Json<ProgramView>, ApiError> {
    let client = ClientId(client);
    let key = parse_program(&program)?;
    let mut service = state.service.lock().await;
    if let Some(name) = &req.name {
        service.rename_program(client, key, name)?;
    }
    if let Some(description) = req.description {
        service.set_description(client, key, Some(description))?;
    }
    Ok(Json(ProgramView::from(service.program(client, key)?)))
}

/// `DELETE /clients/{client}/programs/{program}`
pub async fn delete_program(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let key = parse_program(&program)?;
    let mut service = state.service.lock().await;
    service.delete_program(ClientId(client), key)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Saves one program.
///
/// `POST /clients/{client}/programs/{program}/save`
pub async fn save_program(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
) -> Result<Json<SaveProgramResponse>, ApiError> {
    let client = ClientId(client);
    let key = parse_program(&program)?;
    let saved = state.service.lock().await.persist_program(client, key).await;
    let key = match saved {
        Ok(key) => key,
        Err(err) => {
            state
                .notifier
                .push(ToastKind::Error, err.to_string(), client, Some(key));
            return Err(err);
        }
    };
    state
        .notifier
        .push(ToastKind::Saved, CHANGES_SAVED, client, Some(key));

    let service = state.service.lock().await;
    Ok(Json(SaveProgramResponse {
        key,
        program: ProgramView::from(service.program(client, key)?),
        has_pending_changes: service.has_pending_changes(client)?,
    }))
}

/// Saves every program of a client.
///
/// `POST /clients/{client}/save`
pub async fn save_all(
    State(state): State<AppState>,
    Path(client): Path<i64>,
) -> Result<Json<ClientProgramsResponse>, ApiError> {
    let client = ClientId(client);
    let mut service = state.service.lock().await;
    if let Err(err) = service.persist_all(client).await {
        state
            .notifier
            .push(ToastKind::Error, err.to_string(), client, None);
        return Err(err);
    }
    state
        .notifier
        .push(ToastKind::Saved, CHANGES_SAVED, client, None);
    Ok(Json(ClientProgramsResponse::new(client, service.client(client)?)))
}

/// Discards unsaved edits.
///
/// `POST /clients/{client}/reset`
pub async fn reset(
    State(state): State<AppState>,
    Path(client): Path<i64>,
) -> Result<Json<ClientProgramsResponse>, ApiError> {
    let client = ClientId(client);
    let mut service = state.service.lock().await;
    let programs = service.reset_to_initial(client)?;
    Ok(Json(ClientProgramsResponse::new(client, programs)))
}

/// Re-reads a single program after an edit.
///
/// `GET /clients/{client}/programs/{program}`
pub async fn get_program(
    State(state): State<AppState>,
    Path((client, program)): Path<(i64, String)>,
) -> Result<Json<ProgramView>, ApiError> {
    let key = parse_program(&program)?;
    Ok(Json(program_view(&state, ClientId(client), key).await?))
}
