//! Domain model and pure reconciliation logic for training programs.
//!
//! A program groups exercise assignments into lettered days; within a day the
//! assignments carry a dense zero-based position. Everything in this crate is
//! synchronous and side-effect free: persistence lives in `tactivo-storage`,
//! batching and notifications in `tactivo-server`.

pub mod changes;
pub mod coalesce;
pub mod day;
pub mod drag;
pub mod error;
pub mod exercise;
pub mod id;
pub mod positions;
pub mod program;
pub mod reconcile;

// Re-export commonly used types
pub use changes::{compute_change_set, ChangeSet, RowUpdate};
pub use coalesce::LatestSlot;
pub use day::{Day, DAY_LETTERS, MAX_DAYS};
pub use drag::{
    BoardLayout, Column, DragController, DragStart, DragState, Half, HoverTarget, Indicator,
    MoveIntent, Rect,
};
pub use error::CoreError;
pub use exercise::{ExerciseRef, Placed, Placement, ProgramExercise, SyncState, WorkoutParams};
pub use id::{ClientId, CompanyId, ExerciseId, ProgramId, ProgramKey, RowId, RowKey, TempId};
pub use positions::{
    is_dense, pending_placements, renumber_positions, update_program_exercises_positions,
    PlacementChange,
};
pub use program::Program;
pub use reconcile::{normalize_program_exercises, Normalized};
