//! Save-time change detection.
//!
//! Compares a program against the snapshot taken when it was last loaded or
//! saved and sorts its rows into inserts, updates and deletions.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::exercise::{Placement, ProgramExercise, WorkoutParams};
use crate::id::{ExerciseId, RowId};
use crate::program::Program;

/// Full rewrite of one persisted row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowUpdate {
    pub row: RowId,
    pub exercise: ExerciseId,
    pub placement: Placement,
    pub params: WorkoutParams,
}

impl RowUpdate {
    fn from_row(row: RowId, pe: &ProgramExercise) -> Self {
        RowUpdate {
            row,
            exercise: pe.exercise.id,
            placement: pe.placement,
            params: pe.params.clone(),
        }
    }
}

/// The rows of a program that differ from its snapshot.
///
/// Tracks three categories: inserts (local rows never stored), updates
/// (stored rows whose exercise, placement or params changed) and deletions
/// (stored rows present in the snapshot but gone now).
#[derive(Debug, Clone, Default, Serialize)]
pub struct ChangeSet {
    pub inserts: Vec<ProgramExercise>,
    pub updates: Vec<RowUpdate>,
    pub deletions: Vec<RowId>,
}

impl ChangeSet {
    /// Returns true if nothing changed.
    pub fn is_clean(&self) -> bool {
        self.inserts.is_empty() && self.updates.is_empty() && self.deletions.is_empty()
    }

    /// Total count of changed rows.
    pub fn total(&self) -> usize {
        self.inserts.len() + self.updates.len() + self.deletions.len()
    }
}

fn differs(before: &ProgramExercise, now: &ProgramExercise) -> bool {
    before.exercise.id != now.exercise.id
        || before.placement != now.placement
        || before.params != now.params
}

/// Computes the change set of `current` against `snapshot`.
///
/// A program with no snapshot (never saved) has every row as an insert.
/// Persisted rows unknown to the snapshot are treated as updates.
pub fn compute_change_set(snapshot: Option<&Program>, current: &Program) -> ChangeSet {
    let before: HashMap<RowId, &ProgramExercise> = snapshot
        .map(|p| {
            p.exercises
                .iter()
                .filter_map(|pe| pe.key.row_id().map(|id| (id, pe)))
                .collect()
        })
        .unwrap_or_default();

    let mut changes = ChangeSet::default();
    let mut seen = HashSet::new();

    for pe in &current.exercises {
        match pe.key.row_id() {
            None => changes.inserts.push(pe.clone()),
            Some(row) => {
                seen.insert(row);
                match before.get(&row) {
                    Some(old) if !differs(old, pe) => {}
                    _ => changes.updates.push(RowUpdate::from_row(row, pe)),
                }
            }
        }
    }

    let mut deletions: Vec<RowId> = before
        .keys()
        .filter(|row| !seen.contains(row))
        .copied()
        .collect();
    deletions.sort();
    changes.deletions = deletions;
    changes
}
