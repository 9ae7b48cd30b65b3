//! Notification handler.

use axum::extract::State;
use axum::Json;

use crate::schema::catalog::NotificationsResponse;
use crate::state::AppState;

/// `GET /notifications`
pub async fn list(State(state): State<AppState>) -> Json<NotificationsResponse> {
    Json(NotificationsResponse {
        toasts: state.notifier.active(),
    })
}
