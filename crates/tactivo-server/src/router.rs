//! Router assembly for the tactivo HTTP API.
//!
//! [`build_router`] wires all handler functions to their routes with
//! CORS and tracing middleware layers.

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Builds the complete axum router with all API routes.
///
/// Routes use axum 0.8 `/{param}` path syntax. Program and row keys in paths
/// are either a persisted id (`12`) or a temporary key (`t-<uuid>`, rows `tpe-<uuid>`).
pub fn build_router(state: AppState) -> Router {
    Router::new()
        // Client programs
        .route(
            "/clients/{client}/programs",
            get(handlers::programs::list_programs).post(handlers::programs::add_program),
        )
        .route(
            "/clients/{client}/programs/load",
            post(handlers::programs::load_programs),
        )
        .route(
            "/clients/{client}/programs/{program}",
            get(handlers::programs::get_program)
                .patch(handlers::programs::update_program)
                .delete(handlers::programs::delete_program),
        )
        .route(
            "/clients/{client}/programs/{program}/save",
            post(handlers::programs::save_program),
        )
        .route("/clients/{client}/save", post(handlers::programs::save_all))
        .route("/clients/{client}/reset", post(handlers::programs::reset))
        // Days
        .route(
            "/clients/{client}/programs/{program}/days",
            post(handlers::exercises::add_day),
        )
        .route(
            "/clients/{client}/programs/{program}/days/{day}",
            delete(handlers::exercises::delete_day),
        )
        // Rows
        .route(
            "/clients/{client}/programs/{program}/exercises",
            post(handlers::exercises::add_exercises),
        )
        .route(
            "/clients/{client}/programs/{program}/exercises/{row}",
            delete(handlers::exercises::remove_exercise).patch(handlers::exercises::update_params),
        )
        .route(
            "/clients/{client}/programs/{program}/exercises/{row}/move",
            post(handlers::exercises::move_exercise),
        )
        // Reconciliation
        .route(
            "/clients/{client}/programs/{program}/positions",
            post(handlers::exercises::update_positions),
        )
        .route(
            "/clients/{client}/programs/{program}/revert",
            post(handlers::exercises::revert),
        )
        // Drag and drop
        .route(
            "/clients/{client}/programs/{program}/drag",
            get(handlers::drag::status),
        )
        .route(
            "/clients/{client}/programs/{program}/drag/start",
            post(handlers::drag::start),
        )
        .route(
            "/clients/{client}/programs/{program}/drag/hover",
            post(handlers::drag::hover),
        )
        .route(
            "/clients/{client}/programs/{program}/drag/drop",
            post(handlers::drag::drop_dragged),
        )
        .route(
            "/clients/{client}/programs/{program}/drag/cancel",
            post(handlers::drag::cancel),
        )
        // Catalog
        .route(
            "/companies/{company}/exercises",
            get(handlers::catalog::list_exercises).post(handlers::catalog::create_exercise),
        )
        // Notifications
        .route("/notifications", get(handlers::notifications::list))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
