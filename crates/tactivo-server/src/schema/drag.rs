//! Drag request/response types.

use serde::{Deserialize, Serialize};

use tactivo_core::{Day, DragStart, MoveIntent, RowKey};

use super::common::ProgramView;
use crate::drag::DragStatus;
use crate::persist::SettleReport;

/// What is being grabbed.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StartDragRequest {
    Exercise { key: RowKey },
    DayColumn { day: Day },
}

#[derive(Debug, Clone, Serialize)]
pub struct StartDragResponse {
    pub start: DragStart,
    pub status: DragStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DropResponse {
    /// The applied move, `None` when the drop changed nothing.
    pub intent: Option<MoveIntent>,
    pub program: ProgramView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence: Option<SettleReport>,
}
