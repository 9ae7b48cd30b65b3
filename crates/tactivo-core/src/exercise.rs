//! Program-exercise assignments and their placement.

use serde::{Deserialize, Serialize};

use crate::day::Day;
use crate::error::CoreError;
use crate::id::{ExerciseId, RowId, RowKey};

/// Read-only reference to an exercise catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRef {
    pub id: ExerciseId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Media file name in the exercise bucket.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl ExerciseRef {
    /// A reference carrying only the id, used when the catalog has no entry.
    pub fn bare(id: ExerciseId) -> Self {
        ExerciseRef {
            id,
            name: None,
            description: None,
            file: None,
        }
    }
}

/// Workout parameters attached to an assignment. Not used by ordering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkoutParams {
    pub sets: Option<i32>,
    pub reps: Option<i32>,
    pub weight: Option<f64>,
    pub secs: Option<i32>,
    pub notes: Option<String>,
}

/// Where an assignment sits: its day and its rank within that day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Placement {
    pub day: Day,
    pub position: u32,
}

impl Placement {
    pub fn new(day: Day, position: u32) -> Self {
        Placement { day, position }
    }
}

/// Anything that carries a placement the reconciler may rewrite.
pub trait Placed {
    fn placement(&self) -> Placement;
    fn set_placement(&mut self, placement: Placement);
}

impl Placed for Placement {
    fn placement(&self) -> Placement {
        *self
    }

    fn set_placement(&mut self, placement: Placement) {
        *self = placement;
    }
}

/// Synchronisation status of an assignment against the row store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    /// Never persisted (temp key).
    Local,
    /// Stored placement equals the in-memory placement.
    Confirmed,
    /// In-memory placement not yet acknowledged by the store.
    Pending,
    /// The last update for this row was rejected.
    Failed,
}

/// A single exercise assignment within a program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramExercise {
    pub key: RowKey,
    pub exercise: ExerciseRef,
    #[serde(flatten)]
    pub placement: Placement,
    #[serde(default)]
    pub params: WorkoutParams,
    /// Placement last acknowledged by the row store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmed: Option<Placement>,
    #[serde(default)]
    pub failed: bool,
}

impl ProgramExercise {
    /// A client-side assignment; notes default to the exercise description.
    pub fn new_local(exercise: ExerciseRef, placement: Placement) -> Self {
        let params = WorkoutParams {
            notes: exercise.description.clone(),
            ..WorkoutParams::default()
        };
        ProgramExercise {
            key: RowKey::temp(),
            exercise,
            placement,
            params,
            confirmed: None,
            failed: false,
        }
    }

    /// An assignment loaded from the row store.
    pub fn from_stored(
        row: RowId,
        exercise: ExerciseRef,
        placement: Placement,
        params: WorkoutParams,
    ) -> Self {
        ProgramExercise {
            key: RowKey::Persisted(row),
            exercise,
            placement,
            params,
            confirmed: Some(placement),
            failed: false,
        }
    }

    pub fn sync_state(&self) -> SyncState {
        match self.key {
            RowKey::Temp(_) => SyncState::Local,
            RowKey::Persisted(_) if self.failed => SyncState::Failed,
            RowKey::Persisted(_) if self.confirmed == Some(self.placement) => SyncState::Confirmed,
            RowKey::Persisted(_) => SyncState::Pending,
        }
    }

    /// Persisted row whose placement differs from the stored one.
    pub fn is_pending(&self) -> bool {
        !self.key.is_temp() && self.confirmed != Some(self.placement)
    }

    /// Records that the store now holds `placement` for this row.
    pub fn confirm(&mut self, placement: Placement) {
        self.confirmed = Some(placement);
        self.failed = false;
    }

    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Transfers identity from the temp key to the server-assigned row id.
    pub fn promote(&mut self, row: RowId) -> Result<(), CoreError> {
        if !self.key.is_temp() {
            return Err(CoreError::AlreadyPersisted { key: self.key });
        }
        self.key = RowKey::Persisted(row);
        self.confirm(self.placement);
        Ok(())
    }
}

impl Placed for ProgramExercise {
    fn placement(&self) -> Placement {
        self.placement
    }

    fn set_placement(&mut self, placement: Placement) {
        self.placement = placement;
    }
}
