//! Training programs: lettered day columns of ordered exercise assignments.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::day::{Day, MAX_DAYS};
use crate::drag::BoardLayout;
use crate::error::CoreError;
use crate::exercise::{ExerciseRef, Placement, ProgramExercise, WorkoutParams};
use crate::id::{ProgramKey, RowKey};
use crate::positions::{is_dense, update_program_exercises_positions, PlacementChange};

fn default_days() -> Vec<Day> {
    vec![Day::A]
}

/// A client's training program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub key: ProgramKey,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Declared day columns, possibly including empty ones.
    #[serde(default = "default_days")]
    pub days: Vec<Day>,
    #[serde(default)]
    pub exercises: Vec<ProgramExercise>,
}

impl Program {
    /// An empty program with a single day `A`.
    pub fn new(key: ProgramKey, name: impl Into<String>) -> Self {
        Program {
            key,
            name: name.into(),
            description: None,
            days: default_days(),
            exercises: Vec::new(),
        }
    }

    /// Builds a program from stored rows. Days are the distinct row days in
    /// first-seen order after sorting rows by placement, or `[A]`.
    pub fn hydrate(
        key: ProgramKey,
        name: impl Into<String>,
        description: Option<String>,
        mut rows: Vec<ProgramExercise>,
    ) -> Self {
        rows.sort_by_key(|pe| pe.placement);
        let mut days: Vec<Day> = Vec::new();
        for pe in &rows {
            if !days.contains(&pe.placement.day) {
                days.push(pe.placement.day);
            }
        }
        if days.is_empty() {
            days = default_days();
        }
        Program {
            key,
            name: name.into(),
            description,
            days,
            exercises: rows,
        }
    }

    pub fn find(&self, key: &RowKey) -> Option<&ProgramExercise> {
        self.exercises.iter().find(|pe| pe.key == *key)
    }

    pub fn find_mut(&mut self, key: &RowKey) -> Option<&mut ProgramExercise> {
        self.exercises.iter_mut().find(|pe| pe.key == *key)
    }

    fn require(&self, key: &RowKey) -> Result<&ProgramExercise, CoreError> {
        self.find(key)
            .ok_or(CoreError::ExerciseNotFound { key: *key })
    }

    /// Items of `day` in position order.
    pub fn day_items(&self, day: Day) -> Vec<&ProgramExercise> {
        let mut items: Vec<&ProgramExercise> = self
            .exercises
            .iter()
            .filter(|pe| pe.placement.day == day)
            .collect();
        items.sort_by_key(|pe| pe.placement.position);
        items
    }

    fn declare_day(&mut self, day: Day) -> Result<(), CoreError> {
        if self.days.contains(&day) {
            return Ok(());
        }
        if self.days.len() >= MAX_DAYS {
            return Err(CoreError::DayLimitReached { max: MAX_DAYS });
        }
        let at = self.days.partition_point(|d| *d < day);
        self.days.insert(at, day);
        Ok(())
    }

    /// Appends new local rows after the current items of `day`.
    pub fn add_exercises(
        &mut self,
        exercises: Vec<ExerciseRef>,
        day: Day,
    ) -> Result<Vec<RowKey>, CoreError> {
        self.declare_day(day)?;
        let mut next = self
            .exercises
            .iter()
            .filter(|pe| pe.placement.day == day)
            .map(|pe| pe.placement.position + 1)
            .max()
            .unwrap_or(0);

        let mut keys = Vec::with_capacity(exercises.len());
        for exercise in exercises {
            let pe = ProgramExercise::new_local(exercise, Placement::new(day, next));
            keys.push(pe.key);
            self.exercises.push(pe);
            next += 1;
        }
        Ok(keys)
    }

    /// Removes a row from the list and returns it.
    pub fn remove_exercise(&mut self, key: &RowKey) -> Result<ProgramExercise, CoreError> {
        let index = self
            .exercises
            .iter()
            .position(|pe| pe.key == *key)
            .ok_or(CoreError::ExerciseNotFound { key: *key })?;
        Ok(self.exercises.remove(index))
    }

    /// Swaps a row with its predecessor in the day. Returns `false` at the top.
    pub fn move_up(&mut self, key: &RowKey) -> Result<bool, CoreError> {
        self.swap_with_neighbour(key, -1)
    }

    /// Swaps a row with its successor in the day. Returns `false` at the bottom.
    pub fn move_down(&mut self, key: &RowKey) -> Result<bool, CoreError> {
        self.swap_with_neighbour(key, 1)
    }

    fn swap_with_neighbour(&mut self, key: &RowKey, step: isize) -> Result<bool, CoreError> {
        let day = self.require(key)?.placement.day;
        let order: Vec<RowKey> = self.day_items(day).iter().map(|pe| pe.key).collect();
        let Some(index) = order.iter().position(|k| k == key) else {
            return Ok(false);
        };
        let neighbour = index as isize + step;
        if neighbour < 0 || neighbour as usize >= order.len() {
            return Ok(false);
        }
        let other = order[neighbour as usize];

        let mine = self.require(key)?.placement;
        let theirs = self.require(&other)?.placement;
        if let Some(pe) = self.find_mut(key) {
            pe.placement = theirs;
        }
        if let Some(pe) = self.find_mut(&other) {
            pe.placement = mine;
        }
        Ok(true)
    }

    pub fn update_params(&mut self, key: &RowKey, params: WorkoutParams) -> Result<(), CoreError> {
        let pe = self
            .find_mut(key)
            .ok_or(CoreError::ExerciseNotFound { key: *key })?;
        pe.params = params;
        Ok(())
    }

    /// Declares the letter after the last declared day.
    pub fn add_day(&mut self) -> Result<Day, CoreError> {
        if self.days.len() >= MAX_DAYS {
            return Err(CoreError::DayLimitReached { max: MAX_DAYS });
        }
        let next = match self.days.iter().max() {
            Some(last) => last.next().ok_or(CoreError::DayOutOfRange {
                index: last.index() + 1,
            })?,
            None => Day::A,
        };
        self.days.push(next);
        Ok(next)
    }

    /// Drops a day column and every assignment in it.
    pub fn delete_day(&mut self, day: Day) -> Result<Vec<ProgramExercise>, CoreError> {
        let used = self.exercises.iter().any(|pe| pe.placement.day == day);
        if !used && !self.days.contains(&day) {
            return Err(CoreError::DayNotFound { day });
        }
        self.days.retain(|d| *d != day);
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.exercises)
            .into_iter()
            .partition(|pe| pe.placement.day == day);
        self.exercises = kept;
        Ok(removed)
    }

    /// Runs the reconciler in place and returns the pending placement updates.
    pub fn normalize(&mut self) -> Vec<PlacementChange> {
        update_program_exercises_positions(self, None)
    }

    /// Writes a board arrangement back onto the assignments.
    pub fn arrange(&mut self, layout: &BoardLayout) {
        let targets: HashMap<RowKey, Placement> = layout
            .columns
            .iter()
            .flat_map(|col| {
                col.keys
                    .iter()
                    .enumerate()
                    .map(move |(i, key)| (*key, Placement::new(col.day, i as u32)))
            })
            .collect();
        for pe in &mut self.exercises {
            if let Some(placement) = targets.get(&pe.key) {
                pe.placement = *placement;
            }
        }
        self.days = layout.columns.iter().map(|col| col.day).collect();
    }

    /// Restores every persisted row to its confirmed placement and
    /// renormalizes. Local rows keep their relative order.
    pub fn revert_to_confirmed(&mut self) -> Vec<PlacementChange> {
        for pe in &mut self.exercises {
            if let Some(confirmed) = pe.confirmed {
                pe.placement = confirmed;
                pe.failed = false;
            }
        }
        let mut days = self.days.clone();
        for pe in &self.exercises {
            if !days.contains(&pe.placement.day) {
                days.push(pe.placement.day);
            }
        }
        days.sort();
        self.days = days;
        self.normalize()
    }

    /// Checks that exercise days are declared and every day is dense.
    pub fn check_invariants(&self) -> Result<(), CoreError> {
        if self.days.is_empty() {
            return Err(CoreError::InvariantViolation {
                reason: "program has no days".into(),
            });
        }
        if self.days.windows(2).any(|w| w[0] >= w[1]) {
            return Err(CoreError::InvariantViolation {
                reason: "days are not strictly ordered".into(),
            });
        }
        if let Some(pe) = self
            .exercises
            .iter()
            .find(|pe| !self.days.contains(&pe.placement.day))
        {
            return Err(CoreError::InvariantViolation {
                reason: format!("row {} uses undeclared day {}", pe.key, pe.placement.day),
            });
        }
        if let Some(day) = self.days.iter().find(|d| !is_dense(&self.exercises, **d)) {
            return Err(CoreError::InvariantViolation {
                reason: format!("positions of day {} are not dense", day),
            });
        }
        Ok(())
    }
}
