//! Exercise catalog and notification types.

use serde::{Deserialize, Serialize};

use tactivo_storage::ExerciseRecord;

use crate::notify::ToastView;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExerciseRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseListResponse {
    pub exercises: Vec<ExerciseRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationsResponse {
    pub toasts: Vec<ToastView>,
}
